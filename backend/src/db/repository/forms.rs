//! Repository trait for forms, form bins and invitations.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    BinTallyForm, BinTypeId, CompanyId, FormBinSpec, FormDetails, FormId, FormSummary, FormUpdate,
    Invitation, InvitationId, NewForm, NewInvitation,
};

/// Storage of bin tally forms and their invitations.
#[async_trait]
pub trait FormRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the database connection is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Forms ====================

    /// List forms, most recently updated first, optionally for one company.
    async fn list_forms(&self, company: Option<CompanyId>) -> RepositoryResult<Vec<FormSummary>>;

    async fn get_form(&self, id: FormId) -> RepositoryResult<BinTallyForm>;

    /// Find a form by its (uppercase) unique code.
    async fn find_form_by_code(&self, code: &str) -> RepositoryResult<Option<BinTallyForm>>;

    /// Load a form with its company and bin rows joined to bin types.
    async fn form_details(&self, id: FormId) -> RepositoryResult<FormDetails>;

    /// Number of forms owned by a company.
    async fn count_forms(&self, company: CompanyId) -> RepositoryResult<usize>;

    /// Whether any form uses the given bin type.
    async fn bin_type_in_use(&self, bin_type: BinTypeId) -> RepositoryResult<bool>;

    /// Create a form with its bin rows in one transaction.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ConflictError)` - If the unique code is taken
    /// * `Err(RepositoryError::ValidationError)` - If a bin type is listed twice
    async fn create_form(
        &self,
        form: &NewForm,
        bins: &[FormBinSpec],
    ) -> RepositoryResult<FormDetails>;

    /// Update a form and synchronize its bin rows in one transaction.
    ///
    /// Rows with an id are updated, rows without one are inserted, and stored
    /// rows absent from `bins` are deleted.
    async fn update_form(
        &self,
        id: FormId,
        update: &FormUpdate,
        bins: &[FormBinSpec],
    ) -> RepositoryResult<FormDetails>;

    /// Delete a form with its bins and invitations. Submissions are kept.
    async fn delete_form(&self, id: FormId) -> RepositoryResult<()>;

    // ==================== Invitations ====================

    /// List invitations of a form, newest first.
    async fn list_invitations(&self, form: FormId) -> RepositoryResult<Vec<Invitation>>;

    async fn get_invitation(&self, id: InvitationId) -> RepositoryResult<Invitation>;

    /// Find an invitation by its access code regardless of status.
    async fn find_invitation_by_code(&self, code: &str) -> RepositoryResult<Option<Invitation>>;

    async fn create_invitation(&self, invitation: &NewInvitation) -> RepositoryResult<Invitation>;

    async fn delete_invitation(&self, id: InvitationId) -> RepositoryResult<()>;
}
