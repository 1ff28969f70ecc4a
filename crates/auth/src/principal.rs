use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystone_core::{CompanyId, UserId};

use crate::{
    AccessGate, AuthzConfig, AuthzError, GlobalCatalog, NavigationTree, Role, RoleAssignment,
    TenantCatalog, WorkingSet, flatten, project, roles_for_company,
};

/// An authenticated user together with the roles it holds in its active company.
///
/// Construction of this object is decoupled from storage and transport: the
/// persistence layer hydrates it (see [`crate::snapshot`]) or assembles it from
/// assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    /// `None` for principals acting outside any tenant (global super admins).
    pub company_id: Option<CompanyId>,
    pub roles: Vec<Role>,
}

/// Which catalog a principal sees.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalClass {
    GlobalSuperAdmin,
    TenantSuperAdmin,
    Regular,
}

impl Principal {
    pub fn new(id: UserId, company_id: Option<CompanyId>, roles: Vec<Role>) -> Self {
        Self {
            id,
            company_id,
            roles,
        }
    }

    /// Build a principal from the roles assigned to `id` inside `company_id`.
    pub fn from_assignments(
        id: UserId,
        company_id: Option<CompanyId>,
        assignments: &[RoleAssignment],
        roles: &[Role],
    ) -> Self {
        let held = roles_for_company(id, company_id, assignments, roles)
            .into_iter()
            .cloned()
            .collect();
        Self::new(id, company_id, held)
    }

    pub fn is_super_admin(&self) -> bool {
        self.roles.iter().any(|r| r.is_super_admin)
    }

    pub fn class(&self) -> PrincipalClass {
        match (self.is_super_admin(), self.company_id) {
            (true, None) => PrincipalClass::GlobalSuperAdmin,
            (true, Some(_)) => PrincipalClass::TenantSuperAdmin,
            (false, _) => PrincipalClass::Regular,
        }
    }
}

/// Immutable per-request authorization context.
///
/// Holds the principal and the working set flattened from it exactly once; it
/// is passed explicitly to the gate and the navigation projector.
#[derive(Debug, Clone)]
pub struct RequestContext {
    principal: Principal,
    working_set: WorkingSet,
    now: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(principal: Principal, now: DateTime<Utc>) -> Self {
        let working_set = flatten(&principal.roles);
        Self {
            principal,
            working_set,
            now,
        }
    }

    /// Like [`RequestContext::new`], for callers whose authentication may have
    /// produced no principal.
    pub fn require(principal: Option<Principal>, now: DateTime<Utc>) -> Result<Self, AuthzError> {
        principal
            .map(|p| Self::new(p, now))
            .ok_or(AuthzError::MissingPrincipal)
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Gate for point checks within this request.
    pub fn gate(&self, config: AuthzConfig) -> AccessGate<'_> {
        AccessGate::new(self, config)
    }

    /// Navigation tree for this request's principal.
    pub fn navigation(&self, tenant: &TenantCatalog, global: &GlobalCatalog) -> NavigationTree {
        project(&self.principal, &self.working_set, tenant, global, self.now)
    }
}
