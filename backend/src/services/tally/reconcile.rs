//! Turning a tally session into its confirmation view and submission payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::bin_key::{display_name, extract_bin_name, BinKey};
use super::inspection::{fullness_label, BinInspection, MissingBinReport, WorkerInfo, WorkerType};
use super::session::TallySession;
use super::TallyError;
use crate::models::FormId;

/// Status shown for bins nobody inspected.
pub const UNINSPECTED_STATUS: &str = "Reported as Empty (0%)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectedRow {
    pub key: Option<BinKey>,
    pub bin: String,
    pub fullness: String,
    pub contaminated: bool,
    pub contamination_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingRow {
    pub key: Option<BinKey>,
    pub bin: String,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UninspectedRow {
    pub key: Option<BinKey>,
    pub bin: String,
    pub status: String,
}

/// The three tables of a tally: inspected, missing and uninspected bins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinTables {
    pub inspected: Vec<InspectedRow>,
    pub missing: Vec<MissingRow>,
    pub uninspected: Vec<UninspectedRow>,
}

/// What the worker reviews before submitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationView {
    pub site_name: String,
    pub area: String,
    pub address: String,
    pub worker: Option<WorkerInfo>,
    pub progress: String,
    #[serde(flatten)]
    pub tables: BinTables,
}

pub fn confirmation(session: &TallySession) -> ConfirmationView {
    let site = session.site();
    let mut tables = BinTables::default();

    for bin in &site.bins {
        if let Some(inspection) = session.inspection(&bin.key) {
            tables.inspected.push(InspectedRow {
                key: Some(bin.key.clone()),
                bin: bin.display_name(),
                fullness: inspection
                    .fullness
                    .map(|f| f.label())
                    .unwrap_or_else(|| fullness_label(0)),
                contaminated: inspection.contaminated.unwrap_or(false),
                contamination_details: inspection.contamination_details.clone(),
            });
        } else if let Some(report) = session.missing_report(&bin.key) {
            tables.missing.push(MissingRow {
                key: Some(bin.key.clone()),
                bin: bin.display_name(),
                comment: report.comment.clone(),
            });
        } else {
            tables.uninspected.push(UninspectedRow {
                key: Some(bin.key.clone()),
                bin: bin.display_name(),
                status: UNINSPECTED_STATUS.to_string(),
            });
        }
    }

    ConfirmationView {
        site_name: site.name.clone(),
        area: site.area.clone(),
        address: site.address.clone(),
        worker: session.worker().cloned(),
        progress: session.progress_label(),
        tables,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingBin {
    pub id: BinKey,
    pub name: String,
}

/// The JSON document stored with every submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub site_id: FormId,
    /// The worker's name.
    pub user_id: String,
    pub user_type: WorkerType,
    pub inspections: Vec<BinInspection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_bin_ids: Vec<MissingBin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_bin_reports: Vec<MissingBinReport>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
}

impl SubmissionPayload {
    pub fn counts(&self) -> BinCounts {
        let mut counts = BinCounts::default();
        for inspection in &self.inspections {
            counts.add(inspection.is_missing(), inspection.is_uninspected());
        }
        counts
    }
}

/// Builds the payload: observed bins, then missing bins, then one empty
/// fill-in per bin left unaccounted for.
pub fn build_submission(
    session: &TallySession,
    access_code: Option<&str>,
    submitted_at: DateTime<Utc>,
) -> Result<SubmissionPayload, TallyError> {
    if session.is_submitted() {
        return Err(TallyError::AlreadySubmitted);
    }
    let worker = session.worker().ok_or(TallyError::WorkerNotIdentified)?;
    let site = session.site();

    let mut inspections: Vec<BinInspection> = session.inspections().to_vec();
    for report in session.missing_reports() {
        if let Some(bin) = site.bin(&report.bin_id) {
            inspections.push(BinInspection::missing(bin, report));
        }
    }
    inspections.extend(
        session
            .unaccounted_bins()
            .map(|bin| BinInspection::uninspected(bin, submitted_at)),
    );

    let missing_bin_ids = session
        .missing_reports()
        .iter()
        .map(|r| MissingBin {
            id: r.bin_id.clone(),
            name: r.bin_name.clone(),
        })
        .collect();

    Ok(SubmissionPayload {
        site_id: site.form_id,
        user_id: worker.name.clone(),
        user_type: worker.user_type,
        inspections,
        missing_bin_ids,
        missing_bin_reports: session.missing_reports().to_vec(),
        submitted_at,
        access_code: access_code.map(str::to_string),
    })
}

/// Per-state bin counts of one submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinCounts {
    pub inspected: usize,
    pub uninspected: usize,
    pub missing: usize,
}

impl BinCounts {
    fn add(&mut self, missing: bool, uninspected: bool) {
        if missing {
            self.missing += 1;
        } else if uninspected {
            self.uninspected += 1;
        } else {
            self.inspected += 1;
        }
    }

    /// Counts from a stored payload, including ones written before missing
    /// bins were listed among the inspections.
    pub fn from_payload(data: &Value) -> Self {
        let mut counts = BinCounts::default();
        for entry in entries(data, "inspections") {
            counts.add(flag(entry, "isMissing"), flag(entry, "isUninspected"));
        }
        counts.missing = counts.missing.max(entries(data, "missingBinIds").count());
        counts
    }
}

fn entries<'a>(data: &'a Value, field: &str) -> impl Iterator<Item = &'a Value> + 'a {
    data.get(field)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn flag(entry: &Value, field: &str) -> bool {
    entry.get(field).and_then(Value::as_bool).unwrap_or(false)
}

fn text<'a>(entry: &'a Value, field: &str) -> Option<&'a str> {
    entry.get(field).and_then(Value::as_str)
}

/// Rebuilds the three tables from a stored payload.
pub fn tables_from_payload(data: &Value) -> BinTables {
    let mut tables = BinTables::default();

    for entry in entries(data, "inspections") {
        let bin = display_name(
            text(entry, "binName").unwrap_or("Unknown"),
            text(entry, "binSize"),
            text(entry, "binUom"),
        );
        if flag(entry, "isMissing") {
            continue;
        }
        if flag(entry, "isUninspected") {
            tables.uninspected.push(UninspectedRow {
                key: None,
                bin,
                status: UNINSPECTED_STATUS.to_string(),
            });
            continue;
        }
        tables.inspected.push(InspectedRow {
            key: None,
            bin,
            fullness: fullness_label(entry.get("fullness").and_then(Value::as_i64).unwrap_or(0)),
            contaminated: flag(entry, "contaminated"),
            contamination_details: text(entry, "contaminationDetails").map(str::to_string),
        });
    }

    let reports: Vec<&Value> = entries(data, "missingBinReports").collect();
    if !reports.is_empty() {
        for report in reports {
            let id = text(report, "binId").unwrap_or_default();
            tables.missing.push(MissingRow {
                key: Some(BinKey::from(id)),
                bin: text(report, "binName")
                    .map(str::to_string)
                    .unwrap_or_else(|| extract_bin_name(id)),
                comment: text(report, "comment").unwrap_or_default().to_string(),
            });
        }
    } else {
        for missing in entries(data, "missingBinIds") {
            let (id, name) = match missing {
                Value::String(id) => (id.as_str(), None),
                other => (text(other, "id").unwrap_or_default(), text(other, "name")),
            };
            tables.missing.push(MissingRow {
                key: Some(BinKey::from(id)),
                bin: name.map(str::to_string).unwrap_or_else(|| extract_bin_name(id)),
                comment: String::new(),
            });
        }
    }

    tables
}
