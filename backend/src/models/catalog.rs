//! Bin types and contamination types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::company::non_blank;
use super::ids::{BinTypeId, CompanyId, ContaminationTypeId};

/// A category of waste bin, e.g. "General Waste" at 240 L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinType {
    pub id: BinTypeId,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub bin_size: Option<String>,
    pub bin_uom: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BinType {
    /// Whether this bin type has the same `(name, size, uom)` identity.
    pub fn same_identity(&self, other: &BinTypeInput) -> bool {
        self.name == other.name && self.bin_size == other.bin_size && self.bin_uom == other.bin_uom
    }
}

/// Fields accepted when creating or editing a bin type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinTypeInput {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub bin_size: Option<String>,
    #[serde(default)]
    pub bin_uom: Option<String>,
}

impl BinTypeInput {
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            color: non_blank(self.color.as_deref()),
            icon: non_blank(self.icon.as_deref()),
            bin_size: non_blank(self.bin_size.as_deref()),
            bin_uom: non_blank(self.bin_uom.as_deref()),
        }
    }
}

/// A kind of contamination an inspector can flag for some bin types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContaminationType {
    pub id: ContaminationTypeId,
    pub name: String,
    pub description: Option<String>,
    /// `None` for types shared by every company.
    pub company_id: Option<CompanyId>,
    pub bin_type_ids: Vec<BinTypeId>,
    pub created_at: DateTime<Utc>,
}

impl ContaminationType {
    pub fn applies_to(&self, bin_type_id: BinTypeId) -> bool {
        self.bin_type_ids.contains(&bin_type_id)
    }
}

/// Fields accepted when creating or editing a contamination type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContaminationTypeInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub company_id: Option<CompanyId>,
    #[serde(default)]
    pub bin_type_ids: Vec<BinTypeId>,
}

impl ContaminationTypeInput {
    /// Trims text and removes duplicate bin type links, keeping first-seen order.
    pub fn normalized(&self) -> Self {
        let mut bin_type_ids = Vec::with_capacity(self.bin_type_ids.len());
        for id in &self.bin_type_ids {
            if !bin_type_ids.contains(id) {
                bin_type_ids.push(*id);
            }
        }
        Self {
            name: self.name.trim().to_string(),
            description: non_blank(self.description.as_deref()),
            company_id: self.company_id,
            bin_type_ids,
        }
    }
}
