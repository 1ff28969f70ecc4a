//! Loosely typed records handed over by the persistence layer, and their
//! one-time conversion into the typed grant model.
//!
//! Hydration never fails as a whole: a grant that cannot be parsed is dropped
//! (and logged) so one bad record cannot lock a principal out of everything
//! else, and can never widen access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use keystone_core::{CompanyId, DirectoryId, DomainError, DomainResult, ModuleId, PermissionId, RoleId, UserId};

use crate::{
    Action, ComparisonOperator, ConstraintPredicate, Grant, Permission, PermissionKind, Principal,
    Role, RoleGrant,
};

/// Why a stored grant could not be turned into a typed [`Grant`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrantError {
    #[error("malformed permission name '{0}' (expected '<domain>.<action>')")]
    MalformedName(String),

    #[error("unknown constraint type '{0}'")]
    UnknownConstraintType(String),

    #[error("unknown constraint action '{0}'")]
    UnknownConstraintAction(String),

    #[error("unknown constraint operator '{0}'")]
    UnknownOperator(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRecord {
    pub id: UserId,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub roles: Vec<RoleRecord>,
}

impl PrincipalRecord {
    pub fn from_json(raw: &str) -> DomainResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::validation(format!("principal snapshot: {e}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub is_super_admin: bool,
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub grants: Vec<RoleGrantRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrantRecord {
    pub permission: PermissionRecord,
    #[serde(default)]
    pub effective_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub effective_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub constraint: Option<ConstraintRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub id: PermissionId,
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub module_id: Option<ModuleId>,
    #[serde(default)]
    pub directory_id: Option<DirectoryId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    pub operator: String,
    pub threshold_days: i64,
}

impl TryFrom<PermissionRecord> for Permission {
    type Error = GrantError;

    fn try_from(record: PermissionRecord) -> Result<Self, Self::Error> {
        Ok(Permission {
            id: record.id,
            name: record.name.parse()?,
            kind: PermissionKind::from(record.kind),
            module_scope: record.module_id,
            directory_scope: record.directory_id,
        })
    }
}

impl TryFrom<ConstraintRecord> for ConstraintPredicate {
    type Error = GrantError;

    fn try_from(record: ConstraintRecord) -> Result<Self, Self::Error> {
        match record.kind.as_str() {
            "time_relative_to_creation" => {
                let action = Action::from_either_vocabulary(&record.action)
                    .ok_or_else(|| GrantError::UnknownConstraintAction(record.action.clone()))?;
                let operator = ComparisonOperator::parse(&record.operator)
                    .ok_or_else(|| GrantError::UnknownOperator(record.operator.clone()))?;
                Ok(ConstraintPredicate::TimeRelativeToCreation {
                    action,
                    operator,
                    threshold_days: record.threshold_days,
                })
            }
            other => Err(GrantError::UnknownConstraintType(other.to_string())),
        }
    }
}

impl RoleGrantRecord {
    fn into_grant(self, role_id: RoleId) -> Result<Grant, GrantError> {
        let permission = Permission::try_from(self.permission)?;
        let constraint = self
            .constraint
            .map(ConstraintPredicate::try_from)
            .transpose()?;
        Ok(Grant {
            permission,
            role_grant: RoleGrant {
                role_id,
                effective_from: self.effective_from,
                effective_until: self.effective_until,
                constraint,
            },
        })
    }
}

impl From<RoleRecord> for Role {
    fn from(record: RoleRecord) -> Self {
        let role_id = record.id;
        let mut grants = Vec::with_capacity(record.grants.len());
        for grant in record.grants {
            let permission_id = grant.permission.id;
            match grant.into_grant(role_id) {
                Ok(grant) => grants.push(grant),
                Err(error) => {
                    tracing::warn!(
                        role_id = %role_id,
                        permission_id = %permission_id,
                        %error,
                        "skipping malformed grant"
                    );
                }
            }
        }
        Role {
            id: role_id,
            name: record.name,
            is_super_admin: record.is_super_admin,
            is_system: record.is_system,
            grants,
        }
    }
}

impl From<PrincipalRecord> for Principal {
    fn from(record: PrincipalRecord) -> Self {
        Principal::new(
            record.id,
            record.company_id,
            record.roles.into_iter().map(Role::from).collect(),
        )
    }
}
