//! Navigation projection across principal classes and tenant catalogs.

use chrono::{DateTime, Duration, TimeZone, Utc};

use keystone_auth::{
    CompanyDirectory, CompanyModule, Directory, DirectoryType, GlobalCatalog, Module, Permission,
    Principal, RequestContext, Role, RoleGrant, TenantCatalog,
};
use keystone_core::{CompanyDirectoryId, CompanyId, CompanyModuleId, DirectoryId, ModuleId, UserId};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 4, 10, 0, 0).unwrap()
}

fn perm(name: &str) -> Permission {
    Permission::module(name.parse().unwrap())
}

fn module(name: &str) -> Module {
    Module {
        id: ModuleId::new(),
        name: name.to_string(),
        icon: Some(format!("icon-{}", name.to_lowercase())),
    }
}

fn directory(name: &str, directory_type: DirectoryType, module_id: Option<ModuleId>) -> Directory {
    Directory {
        id: DirectoryId::new(),
        name: name.to_string(),
        directory_type,
        icon: None,
        module_id,
    }
}

/// A tenant with Inventory (enabled), Payroll (disabled), a company directory
/// and a system directory.
struct Fixture {
    company: CompanyId,
    inventory: Module,
    payroll: Module,
    stock_items: Directory,
    warehouses: Directory,
    payslips: Directory,
    branches: Directory,
    audit_log: Directory,
    tenant: TenantCatalog,
    global: GlobalCatalog,
}

impl Fixture {
    fn new() -> Self {
        let company = CompanyId::new();
        let inventory = module("Inventory");
        let payroll = module("Payroll");
        let stock_items = directory("Stock Items", DirectoryType::Module, Some(inventory.id));
        let warehouses = directory("Warehouses", DirectoryType::Module, Some(inventory.id));
        let payslips = directory("Payslips", DirectoryType::Module, Some(payroll.id));
        let branches = directory("Branches", DirectoryType::Company, None);
        let audit_log = directory("Audit Log", DirectoryType::System, None);

        let inventory_cm = CompanyModule {
            id: CompanyModuleId::new(),
            company_id: company,
            module: inventory.clone(),
            enabled: true,
        };
        let payroll_cm = CompanyModule {
            id: CompanyModuleId::new(),
            company_id: company,
            module: payroll.clone(),
            enabled: false,
        };
        let bind = |d: &Directory, cm: Option<&CompanyModule>| CompanyDirectory {
            id: CompanyDirectoryId::new(),
            company_id: company,
            directory: d.clone(),
            company_module_id: cm.map(|cm| cm.id),
        };
        let tenant = TenantCatalog {
            company_directories: vec![
                bind(&stock_items, Some(&inventory_cm)),
                bind(&warehouses, Some(&inventory_cm)),
                bind(&payslips, Some(&payroll_cm)),
                bind(&branches, None),
                bind(&audit_log, None),
            ],
            company_modules: vec![inventory_cm, payroll_cm],
        };
        let global = GlobalCatalog {
            modules: vec![inventory.clone(), payroll.clone()],
            directories: vec![
                stock_items.clone(),
                warehouses.clone(),
                payslips.clone(),
                branches.clone(),
                audit_log.clone(),
            ],
        };

        Self {
            company,
            inventory,
            payroll,
            stock_items,
            warehouses,
            payslips,
            branches,
            audit_log,
            tenant,
            global,
        }
    }

    fn tree_for(&self, company: Option<CompanyId>, roles: Vec<Role>) -> keystone_auth::NavigationTree {
        let ctx = RequestContext::new(Principal::new(UserId::new(), company, roles), now());
        ctx.navigation(&self.tenant, &self.global)
    }

    fn regular(&self, role: Role) -> keystone_auth::NavigationTree {
        self.tree_for(Some(self.company), vec![role])
    }
}

#[test]
fn module_view_grant_shows_module_with_its_directories() {
    let fx = Fixture::new();
    let tree = fx.regular(Role::new("Storekeeper").grant(perm("inventory.view")));

    assert_eq!(tree.primary.len(), 1);
    let inventory = &tree.primary[0];
    assert_eq!(inventory.module_id, fx.inventory.id);
    assert_eq!(inventory.name, "Inventory");
    assert_eq!(inventory.icon.as_deref(), Some("icon-inventory"));
    let names: Vec<_> = inventory.sub_items.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["Stock Items", "Warehouses"]);
    assert!(tree.secondary.is_empty());
}

#[test]
fn unrelated_domain_shows_nothing() {
    let fx = Fixture::new();
    let tree = fx.regular(Role::new("Analyst").grant(perm("reports.view")));

    assert!(tree.primary.is_empty());
    assert!(tree.is_empty());
}

#[test]
fn module_scoped_manage_grant_counts() {
    let fx = Fixture::new();
    let tree = fx.regular(Role::new("Lead").grant(perm("anything.manage").in_module(fx.inventory.id)));
    assert_eq!(tree.primary.len(), 1);
    assert_eq!(tree.primary[0].sub_items.len(), 2);
}

#[test]
fn directory_grant_alone_does_not_reveal_its_module() {
    let fx = Fixture::new();
    let tree = fx.regular(
        Role::new("Counter").grant(perm("stock_items.view").in_directory(fx.stock_items.id)),
    );
    assert!(tree.primary.is_empty());
}

#[test]
fn disabled_module_stays_hidden_even_with_grant() {
    let fx = Fixture::new();
    let tree = fx.regular(Role::new("Payroll clerk").grant(perm("payroll.view")));
    assert!(tree.primary.is_empty());
    assert!(tree.primary.iter().all(|m| m.module_id != fx.payroll.id));
}

#[test]
fn non_view_actions_do_not_reveal() {
    let fx = Fixture::new();
    let tree = fx.regular(Role::new("Writer").grant(perm("inventory.create")));
    assert!(tree.is_empty());
}

#[test]
fn expired_view_grant_is_absent() {
    let fx = Fixture::new();
    let role = Role::new("Former");
    let meta = RoleGrant {
        effective_until: Some(now() - Duration::minutes(1)),
        ..RoleGrant::unbounded(role.id)
    };
    let tree = fx.regular(role.grant_with(perm("inventory.view"), meta));
    assert!(tree.is_empty());
}

#[test]
fn secondary_directories_follow_their_own_grants() {
    let fx = Fixture::new();
    let tree = fx.regular(
        Role::new("Office")
            .grant(perm("branches.view"))
            .grant(perm("logs.view").in_directory(fx.audit_log.id)),
    );

    assert!(tree.primary.is_empty());
    let ids: Vec<_> = tree.secondary.iter().map(|d| d.directory_id).collect();
    assert_eq!(ids, [fx.branches.id, fx.audit_log.id]);
    assert_eq!(tree.secondary[0].directory_type, DirectoryType::Company);
    assert_eq!(tree.secondary[1].directory_type, DirectoryType::System);
}

#[test]
fn tenant_super_admin_sees_every_enabled_resource() {
    let fx = Fixture::new();
    let tree = fx.tree_for(Some(fx.company), vec![Role::super_admin("Company Admin")]);

    assert_eq!(tree.primary.len(), 1);
    assert_eq!(tree.primary[0].module_id, fx.inventory.id);
    assert_eq!(tree.primary[0].sub_items.len(), 2);
    assert_eq!(tree.secondary.len(), 2);
    assert!(
        tree.primary
            .iter()
            .flat_map(|m| &m.sub_items)
            .all(|d| d.directory_id != fx.payslips.id)
    );
}

#[test]
fn global_super_admin_sees_the_whole_catalog() {
    let fx = Fixture::new();
    let tree = fx.tree_for(None, vec![Role::super_admin("Root")]);

    let modules: Vec<_> = tree.primary.iter().map(|m| m.module_id).collect();
    assert_eq!(modules, [fx.inventory.id, fx.payroll.id]);
    assert_eq!(tree.primary[1].sub_items[0].directory_id, fx.payslips.id);
    assert_eq!(tree.secondary.len(), 2);
    assert_eq!(tree.primary[0].sub_items[1].directory_id, fx.warehouses.id);
}

#[test]
fn other_tenants_catalog_entries_are_ignored() {
    let fx = Fixture::new();
    let tree = fx.tree_for(
        Some(CompanyId::new()),
        vec![Role::new("Storekeeper").grant(perm("inventory.view"))],
    );
    assert!(tree.is_empty());
}

#[test]
fn unscoped_grant_needs_slug_matching_module_name() {
    let company = CompanyId::new();
    let module = module("Inventory Management");
    let stock = directory("Stock Items", DirectoryType::Module, Some(module.id));
    let cm = CompanyModule {
        id: CompanyModuleId::new(),
        company_id: company,
        module: module.clone(),
        enabled: true,
    };
    let tenant = TenantCatalog {
        company_directories: vec![CompanyDirectory {
            id: CompanyDirectoryId::new(),
            company_id: company,
            directory: stock,
            company_module_id: Some(cm.id),
        }],
        company_modules: vec![cm],
    };
    let tree_with = |role: Role| {
        RequestContext::new(Principal::new(UserId::new(), Some(company), vec![role]), now())
            .navigation(&tenant, &GlobalCatalog::default())
    };

    assert!(tree_with(Role::new("Short").grant(perm("inventory.view"))).is_empty());

    let slugged = tree_with(Role::new("Slug").grant(perm("inventory_management.view")));
    assert_eq!(slugged.primary.len(), 1);

    let scoped = tree_with(Role::new("Scoped").grant(perm("inventory.view").in_module(module.id)));
    assert_eq!(scoped.primary[0].module_id, module.id);
}

#[test]
fn projection_is_deterministic() {
    let fx = Fixture::new();
    let role = Role::new("Everything")
        .grant(perm("inventory.view"))
        .grant(perm("branches.manage"))
        .grant(perm("audit_log.view"));

    let first = fx.regular(role.clone());
    for _ in 0..10 {
        assert_eq!(fx.regular(role.clone()), first);
    }
    assert_eq!(first.secondary.len(), 2);
}
