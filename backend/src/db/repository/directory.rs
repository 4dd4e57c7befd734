//! Repository trait for companies and administrator accounts.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    Company, CompanyId, CompanyInput, NewUser, User, UserId, UserUpdate, UserWithCompany,
};

/// Storage of companies and users.
///
/// Inputs are expected to be normalized by the service layer; implementations
/// only enforce storage constraints (unique emails, existing references).
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    // ==================== Companies ====================

    /// List all companies ordered by name.
    async fn list_companies(&self) -> RepositoryResult<Vec<Company>>;

    /// Retrieve a company by ID.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the company doesn't exist
    async fn get_company(&self, id: CompanyId) -> RepositoryResult<Company>;

    /// Find a company by exact (case-insensitive) name.
    async fn find_company_by_name(&self, name: &str) -> RepositoryResult<Option<Company>>;

    async fn create_company(&self, input: &CompanyInput) -> RepositoryResult<Company>;

    async fn update_company(&self, id: CompanyId, input: &CompanyInput)
        -> RepositoryResult<Company>;

    /// Delete a company. Users of the company are detached from it.
    async fn delete_company(&self, id: CompanyId) -> RepositoryResult<()>;

    // ==================== Users ====================

    /// List users ordered by email, with the name of their company.
    async fn list_users(
        &self,
        company: Option<CompanyId>,
    ) -> RepositoryResult<Vec<UserWithCompany>>;

    async fn get_user(&self, id: UserId) -> RepositoryResult<User>;

    /// Find a user by lowercase email.
    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// Create a user.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ConflictError)` - If the email is already taken
    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User>;

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> RepositoryResult<User>;

    async fn delete_user(&self, id: UserId) -> RepositoryResult<()>;

    /// Stamp the user's `last_login` with the current time.
    async fn record_login(&self, id: UserId) -> RepositoryResult<()>;
}
