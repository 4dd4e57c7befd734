//! Repository trait for bin types and contamination types.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{
    BinType, BinTypeId, BinTypeInput, CompanyId, ContaminationType, ContaminationTypeId,
    ContaminationTypeInput,
};

/// Storage of the bin and contamination catalogues.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // ==================== Bin Types ====================

    /// List all bin types ordered by name.
    async fn list_bin_types(&self) -> RepositoryResult<Vec<BinType>>;

    async fn get_bin_type(&self, id: BinTypeId) -> RepositoryResult<BinType>;

    /// Bin types sharing the `(name, bin_size, bin_uom)` identity of `input`.
    async fn find_bin_types_by_identity(
        &self,
        input: &BinTypeInput,
    ) -> RepositoryResult<Vec<BinType>>;

    async fn create_bin_type(&self, input: &BinTypeInput) -> RepositoryResult<BinType>;

    async fn update_bin_type(
        &self,
        id: BinTypeId,
        input: &BinTypeInput,
    ) -> RepositoryResult<BinType>;

    /// Delete a bin type and its contamination links.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ConflictError)` - If a form still lists it
    async fn delete_bin_type(&self, id: BinTypeId) -> RepositoryResult<()>;

    // ==================== Contamination Types ====================

    /// List contamination types ordered by name.
    ///
    /// With a company, returns global types plus that company's own.
    async fn list_contamination_types(
        &self,
        company: Option<CompanyId>,
    ) -> RepositoryResult<Vec<ContaminationType>>;

    async fn get_contamination_type(
        &self,
        id: ContaminationTypeId,
    ) -> RepositoryResult<ContaminationType>;

    /// Create a contamination type together with its bin type links.
    async fn create_contamination_type(
        &self,
        input: &ContaminationTypeInput,
    ) -> RepositoryResult<ContaminationType>;

    /// Update a contamination type, replacing all of its bin type links.
    async fn update_contamination_type(
        &self,
        id: ContaminationTypeId,
        input: &ContaminationTypeInput,
    ) -> RepositoryResult<ContaminationType>;

    /// Delete a contamination type after removing its links.
    async fn delete_contamination_type(&self, id: ContaminationTypeId) -> RepositoryResult<()>;
}
