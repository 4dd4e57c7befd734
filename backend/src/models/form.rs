//! Bin tally forms and the bins they list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::BinType;
use super::company::{non_blank, Company};
use super::ids::{BinTypeId, CompanyId, FormBinId, FormId, UserId};

/// Smallest and largest quantity a form may list for one bin type.
pub const MIN_BIN_QUANTITY: i32 = 1;
pub const MAX_BIN_QUANTITY: i32 = 10;

/// A site checklist accessed through its short code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinTallyForm {
    pub id: FormId,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub area: Option<String>,
    pub unique_code: String,
    pub company_id: Option<CompanyId>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Descriptive fields of a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub location: String,
    #[serde(default)]
    pub area: Option<String>,
    /// Only honoured for super admins; site admins always use their own company.
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

impl FormInput {
    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: non_blank(self.description.as_deref()),
            location: self.location.trim().to_string(),
            area: non_blank(self.area.as_deref()),
            company_id: self.company_id,
        }
    }
}

/// One bin type listed on a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormBin {
    pub id: FormBinId,
    pub form_id: FormId,
    pub bin_type_id: BinTypeId,
    pub quantity: i32,
}

/// A requested form bin row. Rows with an `id` update an existing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormBinInput {
    #[serde(default)]
    pub id: Option<FormBinId>,
    pub bin_type_id: Option<BinTypeId>,
    pub quantity: i32,
}

/// Validated row ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct FormBinSpec {
    pub id: Option<FormBinId>,
    pub bin_type_id: BinTypeId,
    pub quantity: i32,
}

/// First bin type listed on more than one row, if any.
pub fn repeated_bin_type(bins: &[FormBinSpec]) -> Option<BinTypeId> {
    let mut seen = std::collections::HashSet::new();
    bins.iter()
        .map(|b| b.bin_type_id)
        .find(|id| !seen.insert(*id))
}

/// Values for a new form after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewForm {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub area: Option<String>,
    pub unique_code: String,
    pub company_id: Option<CompanyId>,
    pub created_by: Option<UserId>,
}

/// Changes applied to an existing form after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FormUpdate {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub area: Option<String>,
    pub company_id: Option<CompanyId>,
}

/// A form bin joined with its bin type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormBinDetail {
    #[serde(flatten)]
    pub form_bin: FormBin,
    pub bin_type: BinType,
}

/// A form with its company and bin rows, as needed to run a tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormDetails {
    pub form: BinTallyForm,
    pub company: Option<Company>,
    pub bins: Vec<FormBinDetail>,
}

/// Form listing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSummary {
    #[serde(flatten)]
    pub form: BinTallyForm,
    pub company_name: Option<String>,
    pub bin_count: usize,
}

impl FormSummary {
    /// Case-insensitive match over the searchable text fields.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let form = &self.form;
        [
            Some(form.title.as_str()),
            Some(form.location.as_str()),
            form.area.as_deref(),
            form.description.as_deref(),
            Some(form.unique_code.as_str()),
            self.company_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}
