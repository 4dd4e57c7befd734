//! Stored tally submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::{CompanyId, FormId, SubmissionId};

/// A submitted tally. `data` holds the submission payload as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSubmission {
    pub id: SubmissionId,
    pub form_id: FormId,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub form_id: FormId,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub data: Value,
}

/// A submission joined with the form and company it belongs to.
///
/// The joined fields are absent when the form has since been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub submission: FormSubmission,
    pub form_title: Option<String>,
    pub unique_code: Option<String>,
    pub company_id: Option<CompanyId>,
    pub company_name: Option<String>,
}
