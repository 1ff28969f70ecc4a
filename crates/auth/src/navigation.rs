//! Navigation projection: the tree of modules and directories a principal may see.
//!
//! Visibility is independent of mutation rights: a `view` or `manage` grant is
//! enough to show a node.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keystone_core::{CompanyDirectoryId, CompanyId, CompanyModuleId, DirectoryId, ModuleId};

use crate::{Principal, PrincipalClass, WorkingSet};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryType {
    /// Belongs to a module; shown under it.
    Module,
    /// Company-wide resource collection.
    Company,
    /// Platform-level resource collection.
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directory {
    pub id: DirectoryId,
    pub name: String,
    pub directory_type: DirectoryType,
    #[serde(default)]
    pub icon: Option<String>,
    /// Owning module in the global catalog (Module-type directories only).
    #[serde(default)]
    pub module_id: Option<ModuleId>,
}

/// Per-tenant enablement of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyModule {
    pub id: CompanyModuleId,
    pub company_id: CompanyId,
    pub module: Module,
    pub enabled: bool,
}

/// Binds a directory to a tenant and, for Module-type directories, to one of
/// the tenant's company modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyDirectory {
    pub id: CompanyDirectoryId,
    pub company_id: CompanyId,
    pub directory: Directory,
    #[serde(default)]
    pub company_module_id: Option<CompanyModuleId>,
}

/// One tenant's catalog, in the order the tenant configured it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantCatalog {
    pub company_modules: Vec<CompanyModule>,
    pub company_directories: Vec<CompanyDirectory>,
}

/// Every module and directory known to the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCatalog {
    pub modules: Vec<Module>,
    pub directories: Vec<Directory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDirectory {
    pub directory_id: DirectoryId,
    pub name: String,
    pub icon: Option<String>,
    #[serde(rename = "type")]
    pub directory_type: DirectoryType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationModule {
    pub module_id: ModuleId,
    pub name: String,
    pub icon: Option<String>,
    pub sub_items: Vec<NavigationDirectory>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationTree {
    pub primary: Vec<NavigationModule>,
    pub secondary: Vec<NavigationDirectory>,
}

impl NavigationTree {
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

impl From<&Directory> for NavigationDirectory {
    fn from(directory: &Directory) -> Self {
        Self {
            directory_id: directory.id,
            name: directory.name.clone(),
            icon: directory.icon.clone(),
            directory_type: directory.directory_type,
        }
    }
}

/// Lower-case, underscore-separated form used to match permission domains
/// against catalog names ("Stock Items" ~ "stock_items").
fn slug(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Visibility facts derived from a working set.
#[derive(Debug, Default)]
struct VisibilityGrants {
    modules: HashSet<ModuleId>,
    directories: HashSet<DirectoryId>,
    /// Domains of unscoped `view`/`manage` grants.
    domains: HashSet<String>,
}

impl VisibilityGrants {
    /// Only effective, unconstrained `view`/`manage` grants count: navigation
    /// has no entity to check a constraint against.
    fn collect(grants: &WorkingSet, now: DateTime<Utc>) -> Self {
        let mut visible = Self::default();
        for grant in grants.iter() {
            let permission = &grant.permission;
            if !permission.name.grants_visibility()
                || !grant.role_grant.is_effective_at(now)
                || grant.role_grant.constraint.is_some()
            {
                continue;
            }
            match (permission.module_scope, permission.directory_scope) {
                (_, Some(directory)) => {
                    visible.directories.insert(directory);
                }
                (Some(module), None) => {
                    visible.modules.insert(module);
                }
                (None, None) => {
                    visible.domains.insert(slug(permission.name.domain()));
                }
            }
        }
        visible
    }

    fn module(&self, module: &Module) -> bool {
        self.modules.contains(&module.id) || self.domains.contains(&slug(&module.name))
    }

    fn directory(&self, directory: &Directory) -> bool {
        self.directories.contains(&directory.id)
    }

    fn standalone_directory(&self, directory: &Directory) -> bool {
        self.directory(directory) || self.domains.contains(&slug(&directory.name))
    }
}

/// Group accessible directories under accessible modules.
///
/// Module-type directories attach to their owning module, others go to the
/// secondary list. Modules without a visible sub-item are dropped. Order
/// follows the inputs; duplicates keep their first position.
fn assemble<'a>(
    modules: impl IntoIterator<Item = &'a Module>,
    directories: impl IntoIterator<Item = (&'a Directory, Option<ModuleId>)>,
) -> NavigationTree {
    let mut seen: HashSet<DirectoryId> = HashSet::new();
    let mut by_module: HashMap<ModuleId, Vec<NavigationDirectory>> = HashMap::new();
    let mut secondary: Vec<NavigationDirectory> = Vec::new();

    for (directory, parent) in directories {
        match directory.directory_type {
            DirectoryType::Module => {
                let Some(parent) = parent else {
                    tracing::debug!(directory_id = %directory.id, "module directory without owning module");
                    continue;
                };
                if seen.insert(directory.id) {
                    by_module.entry(parent).or_default().push(directory.into());
                }
            }
            DirectoryType::Company | DirectoryType::System => {
                if seen.insert(directory.id) {
                    secondary.push(directory.into());
                }
            }
        }
    }

    let mut placed: HashSet<ModuleId> = HashSet::new();
    let primary = modules
        .into_iter()
        .filter(|module| placed.insert(module.id))
        .filter_map(|module| {
            let sub_items = by_module.remove(&module.id)?;
            Some(NavigationModule {
                module_id: module.id,
                name: module.name.clone(),
                icon: module.icon.clone(),
                sub_items,
            })
        })
        .collect();

    NavigationTree { primary, secondary }
}

/// Build the navigation tree for `principal`.
///
/// - global super admins see the whole `global` catalog;
/// - tenant super admins see every enabled module and bound directory of `tenant`;
/// - everyone else sees what their `view`/`manage` grants reveal.
///
/// An unscoped grant reveals a module or a Company/System directory only when
/// its domain equals the slug of the catalog name: `inventory.view` reveals
/// "Inventory" but not "Inventory Management". Scoped grants match by id.
///
/// Tenant catalog entries belonging to another company are ignored.
#[tracing::instrument(skip_all, fields(principal_id = %principal.id))]
pub fn project(
    principal: &Principal,
    grants: &WorkingSet,
    tenant: &TenantCatalog,
    global: &GlobalCatalog,
    now: DateTime<Utc>,
) -> NavigationTree {
    let class = principal.class();

    let tree = match class {
        PrincipalClass::GlobalSuperAdmin => assemble(
            &global.modules,
            global.directories.iter().map(|d| (d, d.module_id)),
        ),
        PrincipalClass::TenantSuperAdmin | PrincipalClass::Regular => {
            let own_modules: Vec<&CompanyModule> = tenant
                .company_modules
                .iter()
                .filter(|cm| Some(cm.company_id) == principal.company_id)
                .collect();
            let own_directories = tenant
                .company_directories
                .iter()
                .filter(|cd| Some(cd.company_id) == principal.company_id);

            let owner: HashMap<CompanyModuleId, &Module> = own_modules
                .iter()
                .copied()
                .map(|cm| (cm.id, &cm.module))
                .collect();
            let parent_of =
                |id: Option<CompanyModuleId>| id.and_then(|id| owner.get(&id).copied());

            let enabled = own_modules
                .iter()
                .copied()
                .filter(|cm| cm.enabled)
                .map(|cm| &cm.module);

            if class == PrincipalClass::TenantSuperAdmin {
                assemble(
                    enabled,
                    own_directories
                        .map(|cd| (&cd.directory, parent_of(cd.company_module_id).map(|m| m.id))),
                )
            } else {
                let visible = VisibilityGrants::collect(grants, now);
                let modules = enabled.filter(|module| visible.module(module));
                let directories = own_directories.filter_map(|cd| {
                    let directory = &cd.directory;
                    let parent = parent_of(cd.company_module_id);
                    let accessible = match directory.directory_type {
                        DirectoryType::Module => {
                            visible.directory(directory)
                                || parent.is_some_and(|m| visible.module(m))
                        }
                        DirectoryType::Company | DirectoryType::System => {
                            visible.standalone_directory(directory)
                        }
                    };
                    accessible.then(|| (directory, parent.map(|m| m.id)))
                });
                assemble(modules, directories)
            }
        }
    };

    tracing::debug!(
        ?class,
        primary = tree.primary.len(),
        secondary = tree.secondary.len(),
        "projected navigation"
    );
    tree
}
