//! Permission evaluation: one (action, scope, entity) query against a working set.
//!
//! - No IO
//! - No panics
//! - Every ambiguity resolves to deny

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystone_core::{DirectoryId, ModuleId, PermissionId, RoleId};

use crate::constraint::ConstraintOutcome;
use crate::roles::Validity;
use crate::{Action, EntityContext, Grant, WorkingSet};

/// The module/directory a query targets. `None` means "not specific to one".
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub module: Option<ModuleId>,
    pub directory: Option<DirectoryId>,
}

impl Scope {
    pub fn global() -> Self {
        Self::default()
    }

    pub fn module(module_id: ModuleId) -> Self {
        Self {
            module: Some(module_id),
            directory: None,
        }
    }

    pub fn directory(directory_id: DirectoryId) -> Self {
        Self {
            module: None,
            directory: Some(directory_id),
        }
    }

    pub fn with_directory(mut self, directory_id: DirectoryId) -> Self {
        self.directory = Some(directory_id);
        self
    }
}

/// Why a single grant did not match a query.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotModuleKind,
    ActionMismatch,
    ModuleScopeMismatch,
    DirectoryScopeMismatch,
    NotYetEffective,
    Expired,
    ConstraintActionMismatch,
    MissingEntityContext,
    ConstraintFailed,
}

/// Overall outcome of a query.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    SuperAdminBypass,
    Matched,
    UnknownAction,
    NoGrants,
    NoMatchingGrant,
}

impl Verdict {
    pub fn is_granted(self) -> bool {
        matches!(self, Verdict::SuperAdminBypass | Verdict::Matched)
    }
}

fn check_grant(
    grant: &Grant,
    action: Action,
    scope: Scope,
    entity: Option<&EntityContext>,
    now: DateTime<Utc>,
) -> Result<(), SkipReason> {
    let permission = &grant.permission;
    if !permission.kind.is_module() {
        return Err(SkipReason::NotModuleKind);
    }
    if permission.name.action() != action.canonical_token() {
        return Err(SkipReason::ActionMismatch);
    }
    if permission.module_scope.is_some_and(|m| Some(m) != scope.module) {
        return Err(SkipReason::ModuleScopeMismatch);
    }
    if permission
        .directory_scope
        .is_some_and(|d| Some(d) != scope.directory)
    {
        return Err(SkipReason::DirectoryScopeMismatch);
    }
    match grant.role_grant.validity_at(now) {
        Validity::Effective => {}
        Validity::NotYetEffective => return Err(SkipReason::NotYetEffective),
        Validity::Expired => return Err(SkipReason::Expired),
    }
    if let Some(constraint) = &grant.role_grant.constraint {
        match constraint.check(action, entity, now) {
            ConstraintOutcome::Satisfied => {}
            ConstraintOutcome::ActionMismatch => return Err(SkipReason::ConstraintActionMismatch),
            ConstraintOutcome::MissingEntityContext => return Err(SkipReason::MissingEntityContext),
            ConstraintOutcome::Failed => return Err(SkipReason::ConstraintFailed),
        }
    }
    Ok(())
}

/// Decide a query, short-circuiting on the first matching grant.
pub fn verdict(
    grants: &WorkingSet,
    required_action: &str,
    scope: Scope,
    entity: Option<&EntityContext>,
    now: DateTime<Utc>,
) -> Verdict {
    let Ok(action) = required_action.parse::<Action>() else {
        return Verdict::UnknownAction;
    };
    if grants.is_super_admin() {
        return Verdict::SuperAdminBypass;
    }
    if grants.is_empty() {
        return Verdict::NoGrants;
    }
    if grants
        .iter()
        .any(|g| check_grant(g, action, scope, entity, now).is_ok())
    {
        Verdict::Matched
    } else {
        Verdict::NoMatchingGrant
    }
}

/// May the holder of `grants` perform `required_action` on `scope` at `now`?
///
/// `required_action` is one of `create|read|edit|delete`; anything else denies.
pub fn evaluate(
    grants: &WorkingSet,
    required_action: &str,
    scope: Scope,
    entity: Option<&EntityContext>,
    now: DateTime<Utc>,
) -> bool {
    verdict(grants, required_action, scope, entity, now).is_granted()
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum GrantOutcome {
    Matched,
    Skipped(SkipReason),
}

/// How one grant fared against the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantVerdict {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
    pub permission: String,
    pub outcome: GrantOutcome,
}

/// Detailed, serializable account of an evaluation.
///
/// Grants are listed in working-set order up to and including the first match,
/// mirroring the short-circuit of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationExplanation {
    pub required_action: String,
    pub scope: Scope,
    pub granted: bool,
    pub verdict: Verdict,
    pub grants: Vec<GrantVerdict>,
}

pub fn explain(
    grants: &WorkingSet,
    required_action: &str,
    scope: Scope,
    entity: Option<&EntityContext>,
    now: DateTime<Utc>,
) -> AuthorizationExplanation {
    let verdict = verdict(grants, required_action, scope, entity, now);
    let mut inspected = Vec::new();

    if let (Ok(action), Verdict::Matched | Verdict::NoMatchingGrant) =
        (required_action.parse::<Action>(), verdict)
    {
        for grant in grants.iter() {
            let outcome = match check_grant(grant, action, scope, entity, now) {
                Ok(()) => GrantOutcome::Matched,
                Err(reason) => GrantOutcome::Skipped(reason),
            };
            let matched = outcome == GrantOutcome::Matched;
            inspected.push(GrantVerdict {
                role_id: grant.role_grant.role_id,
                permission_id: grant.permission.id,
                permission: grant.permission.name.to_string(),
                outcome,
            });
            if matched {
                break;
            }
        }
    }

    AuthorizationExplanation {
        required_action: required_action.to_string(),
        scope,
        granted: verdict.is_granted(),
        verdict,
        grants: inspected,
    }
}
