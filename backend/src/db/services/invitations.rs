//! Per-recipient invitations to complete a form.

use chrono::{Duration, Utc};
use log::info;

use super::error::{require, ServiceError, ServiceResult};
use super::forms::visible_form;
use crate::db::repository::FullRepository;
use crate::models::{
    Actor, BinTallyForm, FormId, Invitation, InvitationId, NewInvitation,
    INVITATION_VALIDITY_DAYS,
};
use crate::services::codes::{generate_alpha_code, INVITATION_CODE_LEN};
use crate::services::mailer::{invitation_email, DeliveryReceipt, Mailer};

const MAX_CODE_ATTEMPTS: usize = 10;

/// Invitations of a form, newest first.
pub async fn list_invitations<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    form: FormId,
) -> ServiceResult<Vec<Invitation>> {
    visible_form(repo, actor, form).await?;
    Ok(repo.list_invitations(form).await?)
}

async fn fresh_access_code<R: FullRepository + ?Sized>(repo: &R) -> ServiceResult<String> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_alpha_code(INVITATION_CODE_LEN)?;
        if repo.find_invitation_by_code(&code).await?.is_none() {
            return Ok(code);
        }
    }
    Err(ServiceError::conflict(
        "Could not generate a unique access code, please try again",
    ))
}

/// Creates an active invitation valid for [`INVITATION_VALIDITY_DAYS`].
pub async fn create_invitation<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    form: FormId,
    email: &str,
) -> ServiceResult<Invitation> {
    let email = email.trim().to_lowercase();
    require(&email, "Email is required")?;
    visible_form(repo, actor, form).await?;

    let access_code = fresh_access_code(repo).await?;
    let invitation = repo
        .create_invitation(&NewInvitation {
            form_id: form,
            email,
            access_code,
            expires_at: Utc::now() + Duration::days(INVITATION_VALIDITY_DAYS),
        })
        .await?;
    info!(
        "Invitation for {} to form {} created by {}",
        invitation.email, form, actor.email
    );
    Ok(invitation)
}

/// Loads an invitation whose form the actor may see.
async fn visible_invitation<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: InvitationId,
) -> ServiceResult<(Invitation, BinTallyForm)> {
    let invitation = repo.get_invitation(id).await?;
    let form = visible_form(repo, actor, invitation.form_id)
        .await
        .map_err(hidden_as_missing)?;
    Ok((invitation, form))
}

/// An invitation whose form is gone or out of sight is reported as missing.
fn hidden_as_missing(err: ServiceError) -> ServiceError {
    match err {
        ServiceError::NotFound(_) => ServiceError::not_found("Invitation"),
        ServiceError::Repository(e) if e.is_not_found() => ServiceError::not_found("Invitation"),
        other => other,
    }
}

pub async fn delete_invitation<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: InvitationId,
) -> ServiceResult<()> {
    visible_invitation(repo, actor, id).await?;
    repo.delete_invitation(id).await?;
    Ok(())
}

/// Emails the access code to the invited recipient.
pub async fn send_invitation<R: FullRepository + ?Sized>(
    repo: &R,
    mailer: &dyn Mailer,
    actor: &Actor,
    id: InvitationId,
) -> ServiceResult<DeliveryReceipt> {
    let (invitation, form) = visible_invitation(repo, actor, id).await?;
    let message = invitation_email(&invitation.email, &form.title, &invitation.access_code);
    let receipt = mailer.send(&message).await?;
    info!("Invitation {} emailed to {}", invitation.id, invitation.email);
    Ok(receipt)
}
