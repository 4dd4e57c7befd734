use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use super::schema::{
    bin_tally_forms, bin_types, companies, contamination_type_bin_types, contamination_types,
    form_bins, form_invitations, form_submissions, users,
};
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};
use crate::models::{
    BinTallyForm, BinType, BinTypeId, Company, ContaminationType, FormBin, FormSubmission,
    Invitation, InvitationStatus, Role, User,
};

// ==================== Companies ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = companies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CompanyRow {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub abn: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = companies)]
pub struct NewCompanyRow {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub abn: Option<String>,
}

impl From<CompanyRow> for Company {
    fn from(row: CompanyRow) -> Self {
        Company {
            id: row.id.into(),
            name: row.name,
            address: row.address,
            abn: row.abn,
            created_at: row.created_at,
        }
    }
}

// ==================== Users ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: String,
    pub company_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: String,
    pub company_id: Option<Uuid>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> RepositoryResult<Self> {
        let role: Role = row.role.parse().map_err(|_| {
            RepositoryError::internal_with_context(
                format!("Unknown role '{}'", row.role),
                ErrorContext::new("decode_user")
                    .with_entity("user")
                    .with_entity_id(row.id),
            )
        })?;
        Ok(User {
            id: row.id.into(),
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            role,
            company_id: row.company_id.map(Into::into),
            created_at: row.created_at,
            last_login: row.last_login,
        })
    }
}

// ==================== Bin Types ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bin_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BinTypeRow {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub bin_size: Option<String>,
    pub bin_uom: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bin_types)]
pub struct NewBinTypeRow {
    pub id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub bin_size: Option<String>,
    pub bin_uom: Option<String>,
}

impl From<BinTypeRow> for BinType {
    fn from(row: BinTypeRow) -> Self {
        BinType {
            id: row.id.into(),
            name: row.name,
            color: row.color,
            icon: row.icon,
            bin_size: row.bin_size,
            bin_uom: row.bin_uom,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// ==================== Contamination Types ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = contamination_types)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ContaminationTypeRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub company_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = contamination_types)]
pub struct NewContaminationTypeRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = contamination_type_bin_types)]
pub struct ContaminationLinkRow {
    pub contamination_type_id: Uuid,
    pub bin_type_id: Uuid,
}

impl ContaminationTypeRow {
    pub fn into_model(self, bin_type_ids: Vec<BinTypeId>) -> ContaminationType {
        ContaminationType {
            id: self.id.into(),
            name: self.name,
            description: self.description,
            company_id: self.company_id.map(Into::into),
            bin_type_ids,
            created_at: self.created_at,
        }
    }
}

// ==================== Forms ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bin_tally_forms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FormRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub area: Option<String>,
    pub unique_code: String,
    pub company_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bin_tally_forms)]
pub struct NewFormRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub area: Option<String>,
    pub unique_code: String,
    pub company_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

impl From<FormRow> for BinTallyForm {
    fn from(row: FormRow) -> Self {
        BinTallyForm {
            id: row.id.into(),
            title: row.title,
            description: row.description,
            location: row.location,
            area: row.area,
            unique_code: row.unique_code,
            company_id: row.company_id.map(Into::into),
            created_by: row.created_by.map(Into::into),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = form_bins)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)] // position only drives ordering
pub struct FormBinRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub bin_type_id: Uuid,
    pub quantity: i32,
    pub position: i32,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = form_bins)]
pub struct NewFormBinRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub bin_type_id: Uuid,
    pub quantity: i32,
    pub position: i32,
}

impl From<FormBinRow> for FormBin {
    fn from(row: FormBinRow) -> Self {
        FormBin {
            id: row.id.into(),
            form_id: row.form_id.into(),
            bin_type_id: row.bin_type_id.into(),
            quantity: row.quantity,
        }
    }
}

// ==================== Invitations ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = form_invitations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InvitationRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub email: String,
    pub access_code: String,
    pub status: String,
    pub is_used: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = form_invitations)]
pub struct NewInvitationRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub email: String,
    pub access_code: String,
    pub status: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = RepositoryError;

    fn try_from(row: InvitationRow) -> RepositoryResult<Self> {
        let status: InvitationStatus = row.status.parse().map_err(|_| {
            RepositoryError::internal_with_context(
                format!("Unknown invitation status '{}'", row.status),
                ErrorContext::new("decode_invitation")
                    .with_entity("invitation")
                    .with_entity_id(row.id),
            )
        })?;
        Ok(Invitation {
            id: row.id.into(),
            form_id: row.form_id.into(),
            email: row.email,
            access_code: row.access_code,
            status,
            is_used: row.is_used,
            expires_at: row.expires_at,
            created_at: row.created_at,
            last_updated_at: row.last_updated_at,
        })
    }
}

// ==================== Submissions ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = form_submissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubmissionRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub data: Value,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = form_submissions)]
pub struct NewSubmissionRow {
    pub id: Uuid,
    pub form_id: Uuid,
    pub submitted_by: String,
    pub submitted_at: DateTime<Utc>,
    pub data: Value,
}

impl From<SubmissionRow> for FormSubmission {
    fn from(row: SubmissionRow) -> Self {
        FormSubmission {
            id: row.id.into(),
            form_id: row.form_id.into(),
            submitted_by: row.submitted_by,
            submitted_at: row.submitted_at,
            data: row.data,
        }
    }
}
