//! `keystone-core` — identifiers and error types shared by the authorization core.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{
    CompanyDirectoryId, CompanyId, CompanyModuleId, DirectoryId, ModuleId, PermissionId, RoleId,
    UserId,
};
