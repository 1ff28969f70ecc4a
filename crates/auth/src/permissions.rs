use core::str::FromStr;

use serde::{Deserialize, Serialize};

use keystone_core::{DirectoryId, ModuleId, PermissionId};

use crate::snapshot::GrantError;

/// Parsed permission name.
///
/// Permission names follow the flat `"<domain>.<action>"` convention (e.g.
/// `"inventory.view"`). They are parsed once when a snapshot is hydrated so
/// evaluation never re-splits strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName {
    domain: String,
    action: String,
}

impl PermissionName {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    /// `view` and `manage` both make a resource visible in navigation.
    pub fn grants_visibility(&self) -> bool {
        matches!(self.action.as_str(), "view" | "manage")
    }
}

impl FromStr for PermissionName {
    type Err = GrantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (domain, action) = s
            .split_once('.')
            .ok_or_else(|| GrantError::MalformedName(s.to_string()))?;
        if domain.is_empty() || action.is_empty() || action.contains('.') {
            return Err(GrantError::MalformedName(s.to_string()));
        }
        Ok(Self {
            domain: domain.to_string(),
            action: action.to_string(),
        })
    }
}

impl TryFrom<String> for PermissionName {
    type Error = GrantError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PermissionName> for String {
    fn from(value: PermissionName) -> Self {
        value.to_string()
    }
}

impl core::fmt::Display for PermissionName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.domain, self.action)
    }
}

/// Permission kind.
///
/// Only `module` permissions take part in scoped evaluation; every other kind
/// is kept verbatim so callers can still inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PermissionKind {
    Module,
    Other(String),
}

impl PermissionKind {
    pub fn is_module(&self) -> bool {
        matches!(self, PermissionKind::Module)
    }
}

impl From<String> for PermissionKind {
    fn from(value: String) -> Self {
        if value == "module" {
            PermissionKind::Module
        } else {
            PermissionKind::Other(value)
        }
    }
}

impl From<&str> for PermissionKind {
    fn from(value: &str) -> Self {
        PermissionKind::from(value.to_string())
    }
}

impl From<PermissionKind> for String {
    fn from(value: PermissionKind) -> Self {
        match value {
            PermissionKind::Module => "module".to_string(),
            PermissionKind::Other(kind) => kind,
        }
    }
}

/// A named capability, optionally narrowed to one module and/or directory.
///
/// `None` on a scope dimension means the permission applies to every instance
/// of that dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: PermissionName,
    pub kind: PermissionKind,
    pub module_scope: Option<ModuleId>,
    pub directory_scope: Option<DirectoryId>,
}

impl Permission {
    /// Unscoped `module` permission; narrow it with [`Permission::in_module`]
    /// and [`Permission::in_directory`].
    pub fn module(name: PermissionName) -> Self {
        Self {
            id: PermissionId::new(),
            name,
            kind: PermissionKind::Module,
            module_scope: None,
            directory_scope: None,
        }
    }

    pub fn in_module(mut self, module_id: ModuleId) -> Self {
        self.module_scope = Some(module_id);
        self
    }

    pub fn in_directory(mut self, directory_id: DirectoryId) -> Self {
        self.directory_scope = Some(directory_id);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<PermissionKind>) -> Self {
        self.kind = kind.into();
        self
    }
}
