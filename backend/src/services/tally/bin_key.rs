//! Composite keys identifying one bin instance within a site.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::inspection::BinInspection;
use super::site::BinInstance;
use crate::models::BinTypeId;

/// Identity of a bin instance: `{bin_type_id}-{name}-{size}-{uom}`.
///
/// The name already carries the `#n` suffix for repeated bins, and size and
/// unit keep two same-named bin types of different capacity apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BinKey(String);

impl BinKey {
    pub fn new(
        bin_type_id: BinTypeId,
        name: &str,
        size: Option<&str>,
        uom: Option<&str>,
    ) -> Self {
        BinKey(format!(
            "{}-{}-{}-{}",
            bin_type_id,
            name,
            size.unwrap_or(""),
            uom.unwrap_or("")
        ))
    }

    pub fn of_instance(bin: &BinInstance) -> Self {
        Self::new(
            bin.bin_type_id,
            &bin.name,
            Some(&bin.bin_size),
            Some(&bin.bin_uom),
        )
    }

    /// Key of the bin an inspection entry was recorded against.
    pub fn of_inspection(inspection: &BinInspection) -> Self {
        Self::new(
            inspection.bin_type_id,
            &inspection.bin_name,
            Some(&inspection.bin_size),
            Some(&inspection.bin_uom),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BinKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BinKey {
    fn from(s: String) -> Self {
        BinKey(s)
    }
}

impl From<&str> for BinKey {
    fn from(s: &str) -> Self {
        BinKey(s.to_string())
    }
}

/// Human label: `"name (240L)"`, `"name (240)"` or `"name"`.
pub fn display_name(name: &str, size: Option<&str>, uom: Option<&str>) -> String {
    let size = size.filter(|s| !s.is_empty());
    let uom = uom.filter(|u| !u.is_empty());
    match (size, uom) {
        (Some(size), Some(uom)) => format!("{} ({}{})", name, size, uom),
        (Some(size), None) => format!("{} ({})", name, size),
        _ => name.to_string(),
    }
}

const UUID_TEXT_LEN: usize = 36;

/// Leading hyphenated UUID of a stored bin identifier, if it has one.
pub fn extract_bin_id(raw: &str) -> Option<Uuid> {
    let head = raw.get(..UUID_TEXT_LEN)?;
    if head.chars().filter(|c| *c == '-').count() != 4 {
        return None;
    }
    Uuid::parse_str(head).ok()
}

/// Bin name embedded in older stored identifiers.
///
/// Understands `"label (id-Name)"`, `"<uuid>-Name"` and `"id-Name"`; anything
/// else is returned unchanged.
pub fn extract_bin_name(raw: &str) -> String {
    if let Some(name) = name_in_trailing_parens(raw) {
        return name.to_string();
    }
    if extract_bin_id(raw).is_some() {
        if let Some(rest) = raw.get(UUID_TEXT_LEN + 1..) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }
    match raw.split_once('-') {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => raw.to_string(),
    }
}

fn name_in_trailing_parens(raw: &str) -> Option<&str> {
    let inner = raw.strip_suffix(')')?;
    let open = inner.find('(')?;
    let body = &inner[open + 1..];
    let dash = body.rfind('-')?;
    let name = &body[dash + 1..];
    if name.is_empty() || name.contains(')') {
        None
    } else {
        Some(name)
    }
}
