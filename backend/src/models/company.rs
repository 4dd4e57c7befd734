//! Company records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::CompanyId;

/// A customer organisation owning forms and site admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub address: Option<String>,
    pub abn: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields accepted when creating or editing a company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyInput {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub abn: Option<String>,
}

impl CompanyInput {
    /// Trims every field; blank optional fields become `None`.
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address: non_blank(self.address.as_deref()),
            abn: non_blank(self.abn.as_deref()),
        }
    }
}

/// Company listing row with the number of forms it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyWithStats {
    #[serde(flatten)]
    pub company: Company,
    pub form_count: usize,
}

/// Trimmed copy of `value`, or `None` when it is absent or blank.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_drops_blank_optionals() {
        let input = CompanyInput {
            name: "  Acme Cleaning ".into(),
            address: Some("   ".into()),
            abn: Some(" 12 345 678 901 ".into()),
        };
        let normalized = input.normalized();
        assert_eq!(normalized.name, "Acme Cleaning");
        assert_eq!(normalized.address, None);
        assert_eq!(normalized.abn.as_deref(), Some("12 345 678 901"));
    }
}
