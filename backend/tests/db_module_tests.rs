//! Tests for database module exports and service layer functions.

use bin_tally::db;

#[test]
fn test_db_module_has_service_functions() {
    // Compile-time checks: if this compiles, the exports work.
    let _: fn() = || {
        let _ = db::health_check::<db::repositories::LocalRepository>;
        let _ = db::services::forms::list_forms::<db::repositories::LocalRepository>;
        let _ = db::services::submissions::submit::<db::repositories::LocalRepository>;
        let _ = db::services::resolve_access::<db::repositories::LocalRepository>;
    };
}

#[test]
fn test_repository_config_is_exported() {
    use bin_tally::db::RepositoryConfig;

    let config: RepositoryConfig = "[repository]\ntype = \"local\"".parse().unwrap();
    assert_eq!(config.repository.repo_type, "local");
}

#[cfg(feature = "postgres-repo")]
#[test]
fn test_postgres_config_type_is_exported() {
    use bin_tally::db::PostgresConfig;

    let _: Option<PostgresConfig> = None;
}

#[tokio::test]
async fn test_local_repository_is_healthy() {
    let repo = db::LocalRepository::new();
    assert!(db::health_check(&repo).await.unwrap());
}
