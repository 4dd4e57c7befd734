//! Repository trait definitions for database operations.
//!
//! Responsibilities are split across focused traits so that implementations
//! and tests can target one concern at a time.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`directory`]: Companies and administrator accounts
//! - [`catalog`]: Bin types and contamination types
//! - [`forms`]: Forms, form bins, invitations, and the health check
//! - [`submissions`]: Stored tally submissions
//!
//! # Convenience Trait Bound
//!
//! For functions that need all repository capabilities, use the [`FullRepository`] trait bound:
//!
//! ```ignore
//! async fn my_service<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let details = repo.form_details(form_id).await?;
//!     repo.store_submission(&submission).await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod directory;
pub mod error;
pub mod forms;
pub mod submissions;

// Re-export error types
pub use error::{ErrorContext, RepositoryError, RepositoryResult};

// Re-export all traits
pub use catalog::CatalogRepository;
pub use directory::DirectoryRepository;
pub use forms::FormRepository;
pub use submissions::SubmissionRepository;

/// Composite trait bound for a complete repository implementation.
///
/// This trait is automatically implemented for any type that implements
/// all four repository traits.
pub trait FullRepository:
    DirectoryRepository + CatalogRepository + FormRepository + SubmissionRepository
{
}

// Blanket implementation: any type implementing all four traits automatically implements FullRepository
impl<T> FullRepository for T where
    T: DirectoryRepository + CatalogRepository + FormRepository + SubmissionRepository
{
}
