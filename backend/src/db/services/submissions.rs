//! Submitting finished tallies and reviewing stored ones.

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::error::{ServiceError, ServiceResult};
use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{Actor, FormSubmission, NewSubmission, Scope, SubmissionId, SubmissionRecord};
use crate::services::drafts::{DraftId, DraftStore};
use crate::services::tally::{
    build_submission, tables_from_payload, BinCounts, BinTables, SubmissionPayload, TallyError,
};

const UNKNOWN: &str = "Unknown";

/// Builds the payload of a draft, stores it and marks the draft submitted.
///
/// The draft is marked submitted before the payload is stored, so a second
/// request for the same draft is refused even while the first is in flight.
/// It is reopened when storing fails. The draft is kept so the worker can
/// still see the confirmation.
pub async fn submit<R: FullRepository + ?Sized>(
    repo: &R,
    drafts: &DraftStore,
    draft_id: DraftId,
) -> ServiceResult<FormSubmission> {
    let now = Utc::now();
    let (payload, reopened) = drafts
        .update(draft_id, |draft| {
            let payload = build_submission(&draft.session, draft.access_code.as_deref(), now)?;
            let reopened = draft.session.clone();
            draft.session.mark_submitted(now)?;
            Ok::<_, TallyError>((payload, reopened))
        })
        .ok_or_else(|| ServiceError::not_found("Draft"))??;

    let stored = match store_payload(repo, &payload).await {
        Ok(stored) => stored,
        Err(err) => {
            warn!("Submission of draft {} failed, reopening it: {}", draft_id, err);
            drafts.update(draft_id, |draft| draft.session = reopened);
            return Err(err);
        }
    };

    let counts = payload.counts();
    info!(
        "Submission {} for form {} by {}: {} inspected, {} missing, {} uninspected",
        stored.id,
        payload.site_id,
        payload.user_id,
        counts.inspected,
        counts.missing,
        counts.uninspected
    );
    Ok(stored)
}

async fn store_payload<R: FullRepository + ?Sized>(
    repo: &R,
    payload: &SubmissionPayload,
) -> ServiceResult<FormSubmission> {
    let data = serde_json::to_value(payload).map_err(|e| {
        RepositoryError::internal(format!("Failed to encode submission: {}", e))
    })?;
    let stored = repo
        .store_submission(&NewSubmission {
            form_id: payload.site_id,
            submitted_by: payload.user_id.clone(),
            submitted_at: payload.submitted_at,
            data,
        })
        .await?;
    Ok(stored)
}

/// Submission listing row with its bin counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionListing {
    #[serde(flatten)]
    pub record: SubmissionRecord,
    pub counts: BinCounts,
}

impl SubmissionListing {
    fn new(record: SubmissionRecord) -> Self {
        let counts = BinCounts::from_payload(&record.submission.data);
        Self {
            record: with_fallbacks(record),
            counts,
        }
    }

    /// Case-insensitive match over form title, company, submitter and code.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [
            self.record.form_title.as_deref(),
            self.record.company_name.as_deref(),
            Some(self.record.submission.submitted_by.as_str()),
            self.record.unique_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Names a deleted form or missing company as "Unknown".
fn with_fallbacks(mut record: SubmissionRecord) -> SubmissionRecord {
    for field in [
        &mut record.form_title,
        &mut record.unique_code,
        &mut record.company_name,
    ] {
        field.get_or_insert_with(|| UNKNOWN.to_string());
    }
    record
}

/// Submissions visible to the actor, newest first.
pub async fn list_submissions<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    search: Option<&str>,
) -> ServiceResult<Vec<SubmissionListing>> {
    let records = match actor.scope() {
        Scope::All => repo.list_submissions(None).await?,
        Scope::Company(company) => repo.list_submissions(Some(company)).await?,
        Scope::Nothing => Vec::new(),
    };
    let mut listings: Vec<SubmissionListing> =
        records.into_iter().map(SubmissionListing::new).collect();
    if let Some(needle) = search {
        listings.retain(|listing| listing.matches(needle));
    }
    Ok(listings)
}

/// Totals shown above the submission list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionSummary {
    pub total_submissions: usize,
    pub total_inspected: usize,
    pub total_missing: usize,
}

pub fn summarize(listings: &[SubmissionListing]) -> SubmissionSummary {
    listings
        .iter()
        .fold(SubmissionSummary::default(), |mut summary, listing| {
            summary.total_submissions += 1;
            summary.total_inspected += listing.counts.inspected;
            summary.total_missing += listing.counts.missing;
            summary
        })
}

/// One submission with its reconstructed bin tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionDetail {
    #[serde(flatten)]
    pub record: SubmissionRecord,
    pub counts: BinCounts,
    pub tables: BinTables,
}

pub async fn get_submission<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: SubmissionId,
) -> ServiceResult<SubmissionDetail> {
    let record = repo.get_submission(id).await?;
    if !actor.can_see(record.company_id) {
        return Err(ServiceError::not_found("Submission"));
    }
    let counts = BinCounts::from_payload(&record.submission.data);
    let tables = tables_from_payload(&record.submission.data);
    Ok(SubmissionDetail {
        record: with_fallbacks(record),
        counts,
        tables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FormId;
    use serde_json::json;

    fn listing(title: Option<&str>, by: &str, data: serde_json::Value) -> SubmissionListing {
        SubmissionListing::new(SubmissionRecord {
            submission: FormSubmission {
                id: SubmissionId::random(),
                form_id: FormId::random(),
                submitted_by: by.to_string(),
                submitted_at: Utc::now(),
                data,
            },
            form_title: title.map(str::to_string),
            unique_code: Some("ABCDEF".to_string()),
            company_id: None,
            company_name: None,
        })
    }

    #[test]
    fn test_summary_sums_counts() {
        let listings = vec![
            listing(
                Some("Depot"),
                "Sam",
                json!({"inspections": [{"binName": "A"}, {"binName": "B", "isMissing": true}]}),
            ),
            listing(
                None,
                "Ana",
                json!({"inspections": [{"binName": "C"}, {"binName": "D", "isUninspected": true}]}),
            ),
        ];
        let summary = summarize(&listings);
        assert_eq!(summary.total_submissions, 2);
        assert_eq!(summary.total_inspected, 2);
        assert_eq!(summary.total_missing, 1);
    }

    #[test]
    fn test_listing_falls_back_to_unknown() {
        let row = listing(None, "Sam", json!({}));
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["form_title"], "Unknown");
        assert_eq!(value["company_name"], "Unknown");
        assert_eq!(value["unique_code"], "ABCDEF");
        assert_eq!(value["company_id"], serde_json::Value::Null);
    }

    #[test]
    fn test_listing_search() {
        let row = listing(Some("North Depot"), "Sam Lee", json!({}));
        assert!(row.matches("depot"));
        assert!(row.matches("sam"));
        assert!(row.matches("abcd"));
        assert!(!row.matches("south"));
    }
}
