//! Repository-backed business rules.
//!
//! Every function here takes any [`FullRepository`] plus the acting
//! administrator, enforces visibility and the platform company rules, and
//! leaves storage concerns to the repository implementation.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP layer (http/) - routing, extractors, DTOs         │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (db/services/) - Business Rules          │
//! │  - Actor scoping and platform company rules             │
//! │  - Input normalization and validation                   │
//! │  - Code generation, access resolution, submissions      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (db/repository/) - Abstract Interface │
//! │  - DirectoryRepository (companies, users)               │
//! │  - CatalogRepository (bin and contamination types)      │
//! │  - FormRepository (forms, bins, invitations)            │
//! │  - SubmissionRepository (stored tallies)                │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴────────────────┐
//!     │                                 │
//! ┌───▼───────────────────┐  ┌─────────▼───────────────┐
//! │ Postgres Repository   │  │ Local Repository        │
//! │ (Diesel)              │  │ (in-memory)             │
//! └───────────────────────┘  └─────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use bin_tally::config::PlatformPolicy;
//! use bin_tally::db::{repositories::LocalRepository, services};
//! use bin_tally::models::{Actor, Role, UserId};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = LocalRepository::new();
//!     let actor = Actor {
//!         user_id: UserId::random(),
//!         email: "root@example.com".into(),
//!         role: Role::SuperAdmin,
//!         company_id: None,
//!     };
//!
//!     let companies =
//!         services::companies::list_companies(&repo, &actor, &PlatformPolicy::default()).await?;
//!     println!("{} companies", companies.len());
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod auth;
pub mod catalog;
pub mod companies;
mod error;
pub mod forms;
pub mod invitations;
pub mod submissions;
pub mod users;

pub use access::{open_site, resolve_access, AccessGrant};
pub use error::{ServiceError, ServiceResult};
pub use submissions::{SubmissionDetail, SubmissionListing, SubmissionSummary};

use crate::db::repository::{FullRepository, RepositoryResult};

/// Check if the storage backend is reachable.
pub async fn health_check<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<bool> {
    repo.health_check().await
}
