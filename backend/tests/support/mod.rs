//! Helpers shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use bin_tally::config::{BootstrapAdmin, PlatformPolicy};
use bin_tally::db::repositories::LocalRepository;
use bin_tally::db::repository::{CatalogRepository, DirectoryRepository};
use bin_tally::db::services::{auth, users};
use bin_tally::models::{Actor, BinType, BinTypeInput, Company, CompanyInput, Role};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

// ==================== Seeded data ====================

pub const ROOT_EMAIL: &str = "root@nuloop.example";
pub const ROOT_PASSWORD: &str = "root-password";
pub const SITE_PASSWORD: &str = "site-password";

/// A repository with the platform company, a super admin, one client
/// company with its site admin, and two bin types.
pub struct World {
    pub repo: LocalRepository,
    pub policy: PlatformPolicy,
    pub root: Actor,
    pub acme: Company,
    pub acme_admin: Actor,
    pub general: BinType,
    pub recycling: BinType,
}

pub async fn world() -> World {
    let repo = LocalRepository::new();
    let policy = PlatformPolicy::default();

    let root_user = auth::bootstrap_admin(
        &repo,
        &policy,
        &BootstrapAdmin {
            email: ROOT_EMAIL.to_string(),
            password: ROOT_PASSWORD.to_string(),
        },
    )
    .await
    .unwrap();
    let root = Actor::from(&root_user);

    let acme = repo
        .create_company(&CompanyInput {
            name: "Acme Facilities".to_string(),
            address: Some("1 Main St".to_string()),
            abn: None,
        })
        .await
        .unwrap();

    let acme_user = users::create_user(
        &repo,
        &root,
        &policy,
        &users::CreateUser {
            email: "site@acme.example".to_string(),
            password: SITE_PASSWORD.to_string(),
            name: Some("Site Admin".to_string()),
            role: Role::SiteAdmin,
            company_id: Some(acme.id),
        },
    )
    .await
    .unwrap();

    let general = repo
        .create_bin_type(&BinTypeInput {
            name: "General Waste".to_string(),
            bin_size: Some("240".to_string()),
            bin_uom: Some("L".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let recycling = repo
        .create_bin_type(&BinTypeInput {
            name: "Recycling".to_string(),
            bin_size: Some("660".to_string()),
            bin_uom: Some("L".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    World {
        repo,
        policy,
        root,
        acme,
        acme_admin: Actor::from(&acme_user),
        general,
        recycling,
    }
}
