//! Per-recipient invitations to complete a form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{FormId, InvitationId};

/// Days an invitation stays usable.
pub const INVITATION_VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Active,
    Used,
    Revoked,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Active => "active",
            InvitationStatus::Used => "used",
            InvitationStatus::Revoked => "revoked",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "used" => Ok(Self::Used),
            "revoked" => Ok(Self::Revoked),
            _ => Err(format!("Unknown invitation status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub form_id: FormId,
    pub email: String,
    pub access_code: String,
    pub status: InvitationStatus,
    pub is_used: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

impl Invitation {
    /// Active, unused and not past its expiry at `now`.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Active
            && !self.is_used
            && self.expires_at.map_or(true, |expiry| expiry > now)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewInvitation {
    pub form_id: FormId,
    pub email: String,
    pub access_code: String,
    pub expires_at: DateTime<Utc>,
}
