use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystone_core::{CompanyId, DomainError, DomainResult, RoleId, UserId};

use crate::{ConstraintPredicate, Permission};

/// Role→permission join metadata.
///
/// The validity window is half-open: a grant is effective from
/// `effective_from` (inclusive) until `effective_until` (exclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role_id: RoleId,
    pub effective_from: Option<DateTime<Utc>>,
    pub effective_until: Option<DateTime<Utc>>,
    pub constraint: Option<ConstraintPredicate>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validity {
    Effective,
    NotYetEffective,
    Expired,
}

impl RoleGrant {
    pub fn unbounded(role_id: RoleId) -> Self {
        Self {
            role_id,
            effective_from: None,
            effective_until: None,
            constraint: None,
        }
    }

    /// The end bound is exclusive: a grant expiring at `T` no longer applies at `T`.
    pub fn validity_at(&self, now: DateTime<Utc>) -> Validity {
        if self.effective_from.is_some_and(|from| now < from) {
            return Validity::NotYetEffective;
        }
        if self.effective_until.is_some_and(|until| now >= until) {
            return Validity::Expired;
        }
        Validity::Effective
    }

    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.validity_at(now) == Validity::Effective
    }
}

/// A permission bound to a role: the unit the evaluator matches against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub permission: Permission,
    pub role_grant: RoleGrant,
}

/// Role with its hydrated grants, in administrator-defined order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub is_super_admin: bool,
    /// System roles ship with the product and cannot be edited or deleted.
    pub is_system: bool,
    pub grants: Vec<Grant>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            is_super_admin: false,
            is_system: false,
            grants: Vec::new(),
        }
    }

    pub fn super_admin(name: impl Into<String>) -> Self {
        Self {
            is_super_admin: true,
            is_system: true,
            ..Self::new(name)
        }
    }

    /// Attach `permission` with an unbounded, unconstrained grant.
    pub fn grant(self, permission: Permission) -> Self {
        let role_grant = RoleGrant::unbounded(self.id);
        self.grant_with(permission, role_grant)
    }

    pub fn grant_with(mut self, permission: Permission, role_grant: RoleGrant) -> Self {
        self.grants.push(Grant {
            permission,
            role_grant,
        });
        self
    }

    pub fn ensure_editable(&self) -> DomainResult<()> {
        if self.is_system {
            return Err(DomainError::invariant(format!(
                "system role '{}' cannot be modified",
                self.name
            )));
        }
        Ok(())
    }

    pub fn ensure_deletable(&self) -> DomainResult<()> {
        if self.is_system {
            return Err(DomainError::invariant(format!(
                "system role '{}' cannot be deleted",
                self.name
            )));
        }
        Ok(())
    }
}

/// Ties a user to a role inside one company (or globally, for super admins).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub company_id: Option<CompanyId>,
}

impl RoleAssignment {
    /// Only super-admin roles may be held outside a company.
    pub fn new(user_id: UserId, role: &Role, company_id: Option<CompanyId>) -> DomainResult<Self> {
        if company_id.is_none() && !role.is_super_admin {
            return Err(DomainError::validation(format!(
                "role '{}' must be assigned within a company",
                role.name
            )));
        }
        Ok(Self {
            user_id,
            role_id: role.id,
            company_id,
        })
    }
}

/// Roles `user_id` holds in `company_id`, in assignment order, each at most once.
///
/// Assignments that reference unknown roles are ignored.
pub fn roles_for_company<'a>(
    user_id: UserId,
    company_id: Option<CompanyId>,
    assignments: &[RoleAssignment],
    roles: &'a [Role],
) -> Vec<&'a Role> {
    let mut seen: HashSet<RoleId> = HashSet::new();
    assignments
        .iter()
        .filter(|a| a.user_id == user_id && a.company_id == company_id)
        .filter(|a| seen.insert(a.role_id))
        .filter_map(|a| roles.iter().find(|r| r.id == a.role_id))
        .collect()
}
