//! Repository trait for tally submissions.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{CompanyId, FormSubmission, NewSubmission, SubmissionId, SubmissionRecord};

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Store a submission.
    ///
    /// # Returns
    /// * `Err(RepositoryError::NotFound)` - If the form doesn't exist
    async fn store_submission(&self, submission: &NewSubmission)
        -> RepositoryResult<FormSubmission>;

    /// List submissions joined with their form and company, newest first.
    ///
    /// With a company, only submissions to that company's forms are returned.
    async fn list_submissions(
        &self,
        company: Option<CompanyId>,
    ) -> RepositoryResult<Vec<SubmissionRecord>>;

    async fn get_submission(&self, id: SubmissionId) -> RepositoryResult<SubmissionRecord>;
}
