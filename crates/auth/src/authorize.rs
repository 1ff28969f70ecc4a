//! Access gate: the per-operation entry point used by route guards.
//!
//! The gate resolves scope and entity through caller-supplied resolvers, asks
//! the evaluator, and turns the answer into a [`Decision`]. It holds no policy
//! of its own.

use thiserror::Error;

use crate::config::{AuthzConfig, DecisionLog};
use crate::evaluate::{self, AuthorizationExplanation, Scope, Verdict};
use crate::{EntityContext, RequestContext};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("no authenticated principal")]
    MissingPrincipal,

    #[error("forbidden: may not {action} ({reason})")]
    Forbidden { action: String, reason: String },
}

impl AuthzError {
    /// HTTP status the transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthzError::MissingPrincipal => 401,
            AuthzError::Forbidden { .. } => 403,
        }
    }
}

/// Supplies the scope of a protected operation: a fixed value or a lookup.
pub trait ScopeResolver {
    fn resolve_scope(&self) -> Scope;
}

impl ScopeResolver for Scope {
    fn resolve_scope(&self) -> Scope {
        *self
    }
}

impl<F> ScopeResolver for F
where
    F: Fn() -> Scope,
{
    fn resolve_scope(&self) -> Scope {
        self()
    }
}

/// Supplies the entity a constrained grant is checked against.
pub trait EntityResolver {
    fn resolve_entity(&self) -> Option<EntityContext>;
}

impl EntityResolver for Option<EntityContext> {
    fn resolve_entity(&self) -> Option<EntityContext> {
        *self
    }
}

impl EntityResolver for EntityContext {
    fn resolve_entity(&self) -> Option<EntityContext> {
        Some(*self)
    }
}

impl<F> EntityResolver for F
where
    F: Fn() -> Option<EntityContext>,
{
    fn resolve_entity(&self) -> Option<EntityContext> {
        self()
    }
}

/// Authorization contract for operations that carry their own requirements.
///
/// Implement this on request/command types; the transport layer calls
/// [`AccessGate::authorize_operation`] before dispatching.
pub trait ProtectedOperation {
    fn required_action(&self) -> &str;

    fn scope(&self) -> Scope;

    fn entity(&self) -> Option<EntityContext> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenialReason {
    pub verdict: Verdict,
    /// Present when [`AuthzConfig::explain_denials`] is on.
    pub explanation: Option<AuthorizationExplanation>,
}

impl core::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.verdict {
            Verdict::UnknownAction => f.write_str("unknown action"),
            Verdict::NoGrants => f.write_str("principal holds no grants"),
            Verdict::NoMatchingGrant => f.write_str("no grant matches"),
            Verdict::SuperAdminBypass | Verdict::Matched => f.write_str("granted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied(DenialReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn into_result(self, action: &str) -> Result<(), AuthzError> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Denied(reason) => Err(AuthzError::Forbidden {
                action: action.to_string(),
                reason: reason.to_string(),
            }),
        }
    }
}

/// Gate bound to one request's context.
#[derive(Debug, Clone, Copy)]
pub struct AccessGate<'a> {
    context: &'a RequestContext,
    config: AuthzConfig,
}

impl<'a> AccessGate<'a> {
    pub fn new(context: &'a RequestContext, config: AuthzConfig) -> Self {
        Self { context, config }
    }

    #[tracing::instrument(
        skip_all,
        fields(principal_id = %self.context.principal().id, action = required_action)
    )]
    pub fn authorize<S, E>(&self, required_action: &str, scope: S, entity: E) -> Decision
    where
        S: ScopeResolver,
        E: EntityResolver,
    {
        let scope = scope.resolve_scope();
        let entity = entity.resolve_entity();
        let verdict = evaluate::verdict(
            self.context.working_set(),
            required_action,
            scope,
            entity.as_ref(),
            self.context.now(),
        );

        if verdict.is_granted() {
            if self.config.decision_log == DecisionLog::All {
                tracing::info!(?scope, ?verdict, "access allowed");
            }
            return Decision::Allowed;
        }

        if self.config.decision_log != DecisionLog::Off {
            tracing::info!(?scope, ?verdict, "access denied");
        }
        let explanation = self
            .config
            .explain_denials
            .then(|| self.explain(required_action, scope, entity));
        Decision::Denied(DenialReason {
            verdict,
            explanation,
        })
    }

    pub fn authorize_operation<O>(&self, operation: &O) -> Result<(), AuthzError>
    where
        O: ProtectedOperation + ?Sized,
    {
        self.authorize(operation.required_action(), operation.scope(), operation.entity())
            .into_result(operation.required_action())
    }

    pub fn explain(
        &self,
        required_action: &str,
        scope: Scope,
        entity: Option<EntityContext>,
    ) -> AuthorizationExplanation {
        evaluate::explain(
            self.context.working_set(),
            required_action,
            scope,
            entity.as_ref(),
            self.context.now(),
        )
    }
}
