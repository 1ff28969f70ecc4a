//! `keystone-auth` — authorization core (zero-trust, fail-closed).
//!
//! Decides whether a principal may perform a scoped action and projects its
//! grants into a navigation tree. Pure and synchronous: it operates on an
//! immutable per-request snapshot and is decoupled from HTTP and storage.

pub mod action;
pub mod authorize;
pub mod config;
pub mod constraint;
pub mod evaluate;
pub mod flatten;
pub mod navigation;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod snapshot;

pub use action::{Action, UnknownAction};
pub use authorize::{
    AccessGate, AuthzError, Decision, DenialReason, EntityResolver, ProtectedOperation,
    ScopeResolver,
};
pub use config::{AuthzConfig, DecisionLog};
pub use constraint::{ComparisonOperator, ConstraintPredicate, EntityContext};
pub use evaluate::{AuthorizationExplanation, Scope, SkipReason, Verdict, evaluate, explain};
pub use flatten::{WorkingSet, flatten};
pub use navigation::{
    CompanyDirectory, CompanyModule, Directory, DirectoryType, GlobalCatalog, Module,
    NavigationDirectory, NavigationModule, NavigationTree, TenantCatalog, project,
};
pub use permissions::{Permission, PermissionKind, PermissionName};
pub use principal::{Principal, PrincipalClass, RequestContext};
pub use roles::{Grant, Role, RoleAssignment, RoleGrant, roles_for_company};
pub use snapshot::{GrantError, PrincipalRecord};
