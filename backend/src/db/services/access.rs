//! Resolution of what a worker typed into a form to open.

use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use crate::db::repository::FullRepository;
use crate::models::FormId;
use crate::services::codes::normalize_code;
use crate::services::tally::Site;

/// The form a worker may tally, and the invitation code that opened it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub form_id: FormId,
    pub access_code: Option<String>,
}

/// Resolves a form id, form code or invitation code.
///
/// Tried in that order: a UUID names the form directly, then form codes,
/// then active unexpired invitations. Anything else is
/// [`ServiceError::InvalidCode`].
pub async fn resolve_access<R: FullRepository + ?Sized>(
    repo: &R,
    input: &str,
) -> ServiceResult<AccessGrant> {
    let trimmed = input.trim();
    if let Ok(id) = Uuid::parse_str(trimmed) {
        let form = repo.get_form(id.into()).await.map_err(|e| {
            if e.is_not_found() {
                ServiceError::InvalidCode
            } else {
                e.into()
            }
        })?;
        return Ok(AccessGrant {
            form_id: form.id,
            access_code: None,
        });
    }

    let code = normalize_code(trimmed);
    if code.is_empty() {
        return Err(ServiceError::InvalidCode);
    }

    if let Some(form) = repo.find_form_by_code(&code).await? {
        debug!("Code {} matched form {}", code, form.id);
        return Ok(AccessGrant {
            form_id: form.id,
            access_code: None,
        });
    }

    match repo.find_invitation_by_code(&code).await? {
        Some(invitation) if invitation.is_redeemable(Utc::now()) => {
            debug!("Code {} matched invitation {}", code, invitation.id);
            Ok(AccessGrant {
                form_id: invitation.form_id,
                access_code: Some(invitation.access_code),
            })
        }
        _ => Err(ServiceError::InvalidCode),
    }
}

/// Resolves `input` and loads the site the worker will tally.
pub async fn open_site<R: FullRepository + ?Sized>(
    repo: &R,
    input: &str,
) -> ServiceResult<(AccessGrant, Site)> {
    let grant = resolve_access(repo, input).await?;
    let details = repo.form_details(grant.form_id).await?;
    Ok((grant, Site::from_details(&details)))
}
