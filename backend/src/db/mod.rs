//! Storage of companies, users, catalogues, forms and submissions.
//!
//! This module provides abstractions for database operations via the Repository pattern,
//! allowing different storage backends to be swapped easily.
//!
//! # Repository Pattern
//! The module includes:
//! - `services`: business rules on top of any repository (use these in your application!)
//! - `repository`: trait definitions for database operations
//! - `repositories::postgres`: Postgres implementation with Diesel ORM
//! - `repositories::local`: In-memory implementation for tests and local development
//! - `factory`: Factory for creating repository instances
//! - `repo_config`: `repository.toml` loading
//!
//! # Recommended Usage
//!
//! ```ignore
//! use bin_tally::db::{factory, services, PostgresConfig, RepositoryType};
//!
//! async fn example(actor: &bin_tally::models::Actor) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PostgresConfig::from_env()?;
//!     let repo = factory::RepositoryFactory::create(RepositoryType::Postgres, Some(&config)).await?;
//!
//!     let forms = services::forms::list_forms(repo.as_ref(), actor, None, None).await?;
//!     Ok(())
//! }
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;
pub mod services;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use services::{health_check, ServiceError, ServiceResult};

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::RepositoryConfig;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    CatalogRepository, DirectoryRepository, ErrorContext, FullRepository, FormRepository,
    RepositoryError, RepositoryResult, SubmissionRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Picks the backend from `repository.toml` when one exists, otherwise from
/// the environment.
async fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    match RepositoryConfig::from_default_location() {
        Ok(config) => {
            log::info!("Using repository.toml ({})", config.repository.repo_type);
            RepositoryBuilder::new()
                .from_default_config()?
                .build()
                .await
        }
        Err(_) => RepositoryFactory::from_env().await,
    }
}

/// Initialize the global repository singleton for the selected backend.
pub async fn init_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo);
    }

    let repo = create_selected_repository()
        .await
        .context("Failed to initialize repository")?;
    Ok(REPOSITORY.get_or_init(|| repo))
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    REPOSITORY
        .get()
        .context("Database not initialized. Call init_repository() first.")
}
