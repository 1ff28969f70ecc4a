//! Evaluation and projection throughput for realistically sized principals.

use chrono::{DateTime, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use keystone_auth::{
    CompanyDirectory, CompanyModule, Directory, DirectoryType, GlobalCatalog, Module, Permission,
    Principal, RequestContext, Role, Scope, TenantCatalog, evaluate, flatten,
};
use keystone_core::{CompanyDirectoryId, CompanyId, CompanyModuleId, DirectoryId, ModuleId, UserId};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// `modules` scoped roles, each granting view/create/update on its own module.
fn roles(modules: &[ModuleId]) -> Vec<Role> {
    modules
        .iter()
        .enumerate()
        .map(|(i, module)| {
            ["view", "create", "update"]
                .iter()
                .fold(Role::new(format!("role-{i}")), |role, action| {
                    let name = format!("domain{i}.{action}").parse().unwrap();
                    role.grant(Permission::module(name).in_module(*module))
                })
        })
        .collect()
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    for size in [1usize, 10, 100] {
        let modules: Vec<ModuleId> = (0..size).map(|_| ModuleId::new()).collect();
        let roles = roles(&modules);
        let set = flatten(&roles);
        let last = Scope::module(modules[size - 1]);

        group.bench_with_input(BenchmarkId::new("last_match", size), &set, |b, set| {
            b.iter(|| evaluate(black_box(set), "edit", last, None, now()))
        });
        group.bench_with_input(BenchmarkId::new("deny", size), &set, |b, set| {
            b.iter(|| evaluate(black_box(set), "delete", last, None, now()))
        });
    }
    group.finish();
}

fn bench_project(c: &mut Criterion) {
    let company = CompanyId::new();
    let modules: Vec<ModuleId> = (0..50).map(|_| ModuleId::new()).collect();

    let company_modules: Vec<CompanyModule> = modules
        .iter()
        .enumerate()
        .map(|(i, id)| CompanyModule {
            id: CompanyModuleId::new(),
            company_id: company,
            module: Module {
                id: *id,
                name: format!("domain{i}"),
                icon: None,
            },
            enabled: true,
        })
        .collect();
    let company_directories = company_modules
        .iter()
        .flat_map(|cm| {
            (0..5).map(move |j| CompanyDirectory {
                id: CompanyDirectoryId::new(),
                company_id: company,
                directory: Directory {
                    id: DirectoryId::new(),
                    name: format!("{}-dir{j}", cm.module.name),
                    directory_type: DirectoryType::Module,
                    icon: None,
                    module_id: Some(cm.module.id),
                },
                company_module_id: Some(cm.id),
            })
        })
        .collect();
    let tenant = TenantCatalog {
        company_modules,
        company_directories,
    };
    let global = GlobalCatalog::default();

    let principal = Principal::new(UserId::new(), Some(company), roles(&modules[..25]));
    let ctx = RequestContext::new(principal, now());

    c.bench_function("project/regular_50_modules", |b| {
        b.iter(|| ctx.navigation(black_box(&tenant), &global))
    });
}

criterion_group!(benches, bench_evaluate, bench_project);
criterion_main!(benches);
