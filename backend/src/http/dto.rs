//! Data Transfer Objects for the HTTP API.
//!
//! Domain records that already derive Serialize/Deserialize are sent as-is;
//! the types here cover request bodies, query strings and composite replies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::services::{SubmissionListing, SubmissionSummary};
use crate::models::{Actor, CompanyId, FormBinInput, FormInput, Role, SubmissionId};
use crate::services::drafts::{Draft, DraftId};
use crate::services::tally::{
    BinInspection, BinKey, InspectionInput, MissingBinReport, Site, TallyStep, WorkerInfo,
    WorkerType,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

// =============================================================================
// Worker tally
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Form id, form code or invitation code.
    pub code: String,
}

/// A draft as the worker's client renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftView {
    pub id: DraftId,
    pub access_code: Option<String>,
    pub site: Site,
    #[serde(flatten)]
    pub step: TallyStep,
    pub worker: Option<WorkerInfo>,
    pub inspections: Vec<BinInspection>,
    pub missing_reports: Vec<MissingBinReport>,
    pub progress: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Draft> for DraftView {
    fn from(draft: &Draft) -> Self {
        let session = &draft.session;
        Self {
            id: draft.id,
            access_code: draft.access_code.clone(),
            site: session.site().clone(),
            step: session.step().clone(),
            worker: session.worker().cloned(),
            inspections: session.inspections().to_vec(),
            missing_reports: session.missing_reports().to_vec(),
            progress: session.progress_label(),
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerRequest {
    pub name: String,
    pub user_type: WorkerType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectBinRequest {
    pub bin: BinKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionRequest {
    pub bin: BinKey,
    #[serde(flatten)]
    pub input: InspectionInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissingRequest {
    pub bins: Vec<BinKey>,
    pub comment: String,
}

/// Reply to a back navigation; `leave` means the worker left the tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackResponse {
    pub leave: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<DraftView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub submission_id: SubmissionId,
    pub submitted_at: DateTime<Utc>,
    pub draft: DraftView,
}

// =============================================================================
// Admin
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: Actor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyAssignment {
    pub company_id: Option<CompanyId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormRequest {
    #[serde(flatten)]
    pub form: FormInput,
    #[serde(default)]
    pub bins: Vec<FormBinInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormListQuery {
    pub company_id: Option<CompanyId>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionListResponse {
    pub submissions: Vec<SubmissionListing>,
    pub summary: SubmissionSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeRequest {
    pub length: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeResponse {
    pub code: String,
}
