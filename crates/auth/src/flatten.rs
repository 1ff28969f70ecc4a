//! Grant flattening: every role a principal holds, merged into one working set.

use std::collections::HashSet;

use keystone_core::{PermissionId, RoleId};

use crate::{Grant, Role};

/// The flattened grants of one principal, built once per request.
///
/// Grants are kept per (role, permission): two roles granting the same name
/// with different scopes or windows both stay available to the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingSet {
    grants: Vec<Grant>,
    super_admin: bool,
}

impl WorkingSet {
    pub fn grants(&self) -> &[Grant] {
        &self.grants
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// True when at least one contributing role is a super-admin role.
    pub fn is_super_admin(&self) -> bool {
        self.super_admin
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grant> {
        self.grants.iter()
    }
}

impl FromIterator<Grant> for WorkingSet {
    /// Wraps already-flattened grants; no role is known, so no bypass.
    fn from_iter<I: IntoIterator<Item = Grant>>(iter: I) -> Self {
        Self {
            grants: iter.into_iter().collect(),
            super_admin: false,
        }
    }
}

/// Merge the grants of `roles` in role order, then grant order.
///
/// A role listed twice contributes once, and a permission repeated inside one
/// role is kept once (first occurrence wins). Grant metadata is copied as is.
pub fn flatten<'a, I>(roles: I) -> WorkingSet
where
    I: IntoIterator<Item = &'a Role>,
{
    let mut seen_roles: HashSet<RoleId> = HashSet::new();
    let mut seen_pairs: HashSet<(RoleId, PermissionId)> = HashSet::new();
    let mut grants = Vec::new();
    let mut super_admin = false;

    for role in roles {
        if !seen_roles.insert(role.id) {
            continue;
        }
        super_admin |= role.is_super_admin;
        for grant in &role.grants {
            if seen_pairs.insert((role.id, grant.permission.id)) {
                grants.push(grant.clone());
            }
        }
    }

    tracing::debug!(grants = grants.len(), super_admin, "flattened working set");

    WorkingSet {
        grants,
        super_admin,
    }
}
