//! Expansion of a form into the individual bins a worker must account for.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::bin_key::{display_name, BinKey};
use crate::models::{BinType, BinTypeId, FormDetails, FormId};

const DEFAULT_ICON: &str = "trash-2";
const DEFAULT_BIN_SIZE: &str = "Unknown";
const FALLBACK_AREA: &str = "N/A";
const FALLBACK_ADDRESS: &str = "Address not available";

/// One physical bin on a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinInstance {
    pub key: BinKey,
    pub bin_type_id: BinTypeId,
    pub name: String,
    pub color: Option<String>,
    pub icon: String,
    pub bin_size: String,
    pub bin_uom: String,
}

impl BinInstance {
    fn new(
        bin_type_id: BinTypeId,
        name: String,
        color: Option<String>,
        icon: String,
        bin_size: String,
        bin_uom: String,
    ) -> Self {
        let key = BinKey::new(bin_type_id, &name, Some(&bin_size), Some(&bin_uom));
        Self {
            key,
            bin_type_id,
            name,
            color,
            icon,
            bin_size,
            bin_uom,
        }
    }

    pub fn display_name(&self) -> String {
        display_name(&self.name, Some(&self.bin_size), Some(&self.bin_uom))
    }
}

/// A form as seen by the worker running a tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub form_id: FormId,
    pub name: String,
    pub code: String,
    pub area: String,
    pub address: String,
    pub bins: Vec<BinInstance>,
}

impl Site {
    /// Expands every form bin into `quantity` instances (at least one).
    ///
    /// Instances sharing a bin type, size and unit are numbered `"Name #1"`,
    /// `"Name #2"`, ... across all rows, so every key on the site is unique.
    pub fn from_details(details: &FormDetails) -> Self {
        let base_key = |bin_type: &BinType| {
            BinKey::new(
                bin_type.id,
                &bin_type.name,
                bin_type.bin_size.as_deref(),
                bin_type.bin_uom.as_deref(),
            )
        };
        let mut totals: HashMap<BinKey, i32> = HashMap::new();
        for row in &details.bins {
            *totals.entry(base_key(&row.bin_type)).or_default() += row.form_bin.quantity.max(1);
        }

        let mut numbered: HashMap<BinKey, i32> = HashMap::new();
        let mut bins = Vec::new();
        for row in &details.bins {
            let bin_type = &row.bin_type;
            let base = base_key(bin_type);
            let total = totals.get(&base).copied().unwrap_or(1);
            for _ in 0..row.form_bin.quantity.max(1) {
                let index = numbered.entry(base.clone()).or_default();
                *index += 1;
                let name = if total > 1 {
                    format!("{} #{}", bin_type.name, index)
                } else {
                    bin_type.name.clone()
                };
                bins.push(BinInstance::new(
                    bin_type.id,
                    name,
                    bin_type.color.clone(),
                    bin_type
                        .icon
                        .clone()
                        .unwrap_or_else(|| DEFAULT_ICON.to_string()),
                    bin_type
                        .bin_size
                        .clone()
                        .unwrap_or_else(|| DEFAULT_BIN_SIZE.to_string()),
                    bin_type.bin_uom.clone().unwrap_or_default(),
                ));
            }
        }

        let form = &details.form;
        let area = form
            .area
            .clone()
            .filter(|a| !a.trim().is_empty())
            .or_else(|| Some(form.location.clone()).filter(|l| !l.trim().is_empty()))
            .unwrap_or_else(|| FALLBACK_AREA.to_string());
        let address = details
            .company
            .as_ref()
            .and_then(|c| c.address.clone())
            .unwrap_or_else(|| FALLBACK_ADDRESS.to_string());

        Self {
            form_id: form.id,
            name: form.title.clone(),
            code: form.unique_code.clone(),
            area,
            address,
            bins,
        }
    }

    pub fn total_bins(&self) -> usize {
        self.bins.len()
    }

    pub fn bin(&self, key: &BinKey) -> Option<&BinInstance> {
        self.bins.iter().find(|b| &b.key == key)
    }

    pub fn contains(&self, key: &BinKey) -> bool {
        self.bin(key).is_some()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;

    use crate::models::*;

    pub fn bin_type(name: &str, size: Option<&str>, uom: Option<&str>) -> BinType {
        BinType {
            id: BinTypeId::random(),
            name: name.to_string(),
            color: Some("#16a34a".to_string()),
            icon: None,
            bin_size: size.map(str::to_string),
            bin_uom: uom.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// Form details listing each `(bin_type, quantity)` pair.
    pub fn details(rows: Vec<(BinType, i32)>) -> FormDetails {
        let form_id = FormId::random();
        let now = Utc::now();
        FormDetails {
            form: BinTallyForm {
                id: form_id,
                title: "Harbour Plaza".to_string(),
                description: None,
                location: "Level 2 dock".to_string(),
                area: None,
                unique_code: "QWERTY".to_string(),
                company_id: None,
                created_by: None,
                created_at: now,
                updated_at: now,
            },
            company: None,
            bins: rows
                .into_iter()
                .map(|(bin_type, quantity)| FormBinDetail {
                    form_bin: FormBin {
                        id: FormBinId::random(),
                        form_id,
                        bin_type_id: bin_type.id,
                        quantity,
                    },
                    bin_type,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_quantity_expands_with_numbered_names() {
        let organic = bin_type("Organic", Some("240"), Some("L"));
        let glass = bin_type("Glass", None, None);
        let site = Site::from_details(&details(vec![(organic, 3), (glass, 1)]));

        let names: Vec<_> = site.bins.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Organic #1", "Organic #2", "Organic #3", "Glass"]);
        assert_eq!(site.total_bins(), 4);
    }

    #[test]
    fn test_defaults_fill_missing_bin_fields() {
        let site = Site::from_details(&details(vec![(bin_type("Glass", None, None), 1)]));
        let bin = &site.bins[0];
        assert_eq!(bin.icon, "trash-2");
        assert_eq!(bin.bin_size, "Unknown");
        assert_eq!(bin.bin_uom, "");
        assert_eq!(site.address, "Address not available");
        assert_eq!(site.area, "Level 2 dock");
    }

    #[test]
    fn test_zero_quantity_still_yields_one_bin() {
        let site = Site::from_details(&details(vec![(bin_type("Glass", None, None), 0)]));
        assert_eq!(site.total_bins(), 1);
        assert_eq!(site.bins[0].name, "Glass");
    }

    #[test]
    fn test_repeated_bin_type_rows_number_across_rows() {
        let general = bin_type("General Waste", Some("240"), Some("L"));
        let site = Site::from_details(&details(vec![
            (general.clone(), 1),
            (bin_type("Glass", None, None), 1),
            (general, 2),
        ]));

        let names: Vec<_> = site.bins.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["General Waste #1", "Glass", "General Waste #2", "General Waste #3"]
        );
        let keys: std::collections::HashSet<_> = site.bins.iter().map(|b| &b.key).collect();
        assert_eq!(keys.len(), site.total_bins());
    }

    #[test]
    fn test_same_name_different_size_get_distinct_keys() {
        let small = bin_type("Recycling", Some("240"), Some("L"));
        let mut large = bin_type("Recycling", Some("660"), Some("L"));
        large.id = small.id;
        let site = Site::from_details(&details(vec![(small, 1), (large, 1)]));
        assert_ne!(site.bins[0].key, site.bins[1].key);
    }
}
