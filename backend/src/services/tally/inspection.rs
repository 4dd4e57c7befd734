//! Observations recorded against individual bins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::bin_key::{display_name, BinKey};
use super::site::BinInstance;
use super::TallyError;
use crate::models::BinTypeId;

/// Fill level in 25% steps; 125 means overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Fullness(u8);

impl Fullness {
    pub const EMPTY: Fullness = Fullness(0);
    pub const OVERFLOW: Fullness = Fullness(125);

    pub fn new(percent: i64) -> Result<Self, TallyError> {
        match percent {
            0 | 25 | 50 | 75 | 100 | 125 => Ok(Fullness(percent as u8)),
            other => Err(TallyError::InvalidFullness(other)),
        }
    }

    pub fn percent(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> String {
        fullness_label(i64::from(self.0))
    }
}

impl TryFrom<i64> for Fullness {
    type Error = TallyError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Fullness::new(value)
    }
}

impl From<Fullness> for i64 {
    fn from(f: Fullness) -> Self {
        i64::from(f.0)
    }
}

/// Label for a stored fullness value; unknown values render as `"{n}%"`.
pub fn fullness_label(percent: i64) -> String {
    match percent {
        0 => "Empty (0%)".to_string(),
        25 => "Quarter Full (25%)".to_string(),
        50 => "Half Full (50%)".to_string(),
        75 => "Nearly Full (75%)".to_string(),
        100 => "Completely Full (100%)".to_string(),
        125 => "Overflow".to_string(),
        other => format!("{}%", other),
    }
}

/// Who is running the tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerType {
    Cleaner,
    #[serde(rename = "Waste Contractor")]
    WasteContractor,
    Security,
    #[serde(rename = "Site Management")]
    SiteManagement,
    Other,
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkerType::Cleaner => "Cleaner",
            WorkerType::WasteContractor => "Waste Contractor",
            WorkerType::Security => "Security",
            WorkerType::SiteManagement => "Site Management",
            WorkerType::Other => "Other",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerInfo {
    pub name: String,
    pub user_type: WorkerType,
}

impl WorkerInfo {
    pub fn new(name: &str, user_type: WorkerType) -> Result<Self, TallyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::MissingWorkerName);
        }
        Ok(Self {
            name: name.to_string(),
            user_type,
        })
    }
}

/// What the worker entered for one bin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionInput {
    pub fullness: Fullness,
    #[serde(default)]
    pub contaminated: bool,
    /// Names of the contamination types observed.
    #[serde(default)]
    pub contamination: Vec<String>,
}

/// One entry of a submission's `inspections` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinInspection {
    pub bin_type_id: BinTypeId,
    pub bin_name: String,
    pub bin_size: String,
    pub bin_uom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullness: Option<Fullness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contaminated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contamination_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_uninspected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_missing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_comment: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl BinInspection {
    fn base(bin: &BinInstance, timestamp: DateTime<Utc>) -> Self {
        Self {
            bin_type_id: bin.bin_type_id,
            bin_name: bin.name.clone(),
            bin_size: bin.bin_size.clone(),
            bin_uom: bin.bin_uom.clone(),
            fullness: None,
            contaminated: None,
            contamination_details: None,
            is_uninspected: None,
            is_missing: None,
            missing_comment: None,
            timestamp,
        }
    }

    /// A worker's observation of `bin`.
    pub fn observed(bin: &BinInstance, input: &InspectionInput, timestamp: DateTime<Utc>) -> Self {
        let details = if input.contaminated && !input.contamination.is_empty() {
            Some(input.contamination.join(", "))
        } else {
            None
        };
        Self {
            fullness: Some(input.fullness),
            contaminated: Some(input.contaminated),
            contamination_details: details,
            ..Self::base(bin, timestamp)
        }
    }

    /// Fill-in for a bin nobody looked at, recorded as empty.
    pub fn uninspected(bin: &BinInstance, timestamp: DateTime<Utc>) -> Self {
        Self {
            fullness: Some(Fullness::EMPTY),
            contaminated: Some(false),
            is_uninspected: Some(true),
            ..Self::base(bin, timestamp)
        }
    }

    /// Entry for a bin reported missing.
    pub fn missing(bin: &BinInstance, report: &MissingBinReport) -> Self {
        Self {
            is_missing: Some(true),
            missing_comment: Some(report.comment.clone()),
            ..Self::base(bin, report.timestamp)
        }
    }

    pub fn key(&self) -> BinKey {
        BinKey::of_inspection(self)
    }

    pub fn display_name(&self) -> String {
        display_name(&self.bin_name, Some(&self.bin_size), Some(&self.bin_uom))
    }

    pub fn is_missing(&self) -> bool {
        self.is_missing.unwrap_or(false)
    }

    pub fn is_uninspected(&self) -> bool {
        self.is_uninspected.unwrap_or(false)
    }
}

/// A worker's statement that a bin could not be found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingBinReport {
    pub bin_id: BinKey,
    pub bin_name: String,
    pub bin_size: String,
    pub bin_uom: String,
    pub comment: String,
    pub timestamp: DateTime<Utc>,
}

impl MissingBinReport {
    pub fn new(bin: &BinInstance, comment: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            bin_id: bin.key.clone(),
            bin_name: bin.display_name(),
            bin_size: bin.bin_size.clone(),
            bin_uom: bin.bin_uom.clone(),
            comment: comment.to_string(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullness_accepts_only_quarter_steps() {
        for ok in [0, 25, 50, 75, 100, 125] {
            assert!(Fullness::new(ok).is_ok());
        }
        assert_eq!(Fullness::new(30), Err(TallyError::InvalidFullness(30)));
        assert!(Fullness::new(-25).is_err());
    }

    #[test]
    fn test_fullness_labels() {
        assert_eq!(Fullness::OVERFLOW.label(), "Overflow");
        assert_eq!(Fullness::new(75).unwrap().label(), "Nearly Full (75%)");
        assert_eq!(fullness_label(40), "40%");
    }

    #[test]
    fn test_worker_type_uses_display_spelling_on_the_wire() {
        let json = serde_json::to_string(&WorkerType::WasteContractor).unwrap();
        assert_eq!(json, "\"Waste Contractor\"");
        let parsed: WorkerType = serde_json::from_str("\"Site Management\"").unwrap();
        assert_eq!(parsed, WorkerType::SiteManagement);
    }

    #[test]
    fn test_worker_name_is_required() {
        assert_eq!(
            WorkerInfo::new("   ", WorkerType::Cleaner),
            Err(TallyError::MissingWorkerName)
        );
        assert_eq!(WorkerInfo::new(" Sam ", WorkerType::Cleaner).unwrap().name, "Sam");
    }

    #[test]
    fn test_fullness_rejects_invalid_json() {
        assert!(serde_json::from_str::<Fullness>("60").is_err());
        assert_eq!(serde_json::from_str::<Fullness>("125").unwrap(), Fullness::OVERFLOW);
    }
}
