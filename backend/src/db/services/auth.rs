//! Administrator sign-in and the startup super admin.

use log::{info, warn};

use super::error::{ServiceError, ServiceResult};
use crate::config::{BootstrapAdmin, PlatformPolicy};
use crate::db::repository::FullRepository;
use crate::models::{Actor, CompanyInput, NewUser, Role, User};
use crate::services::auth::{hash_password, verify_password, AuthSession, SessionStore};

/// Checks credentials, stamps `last_login` and issues a bearer session.
///
/// Unknown emails and wrong passwords fail the same way.
pub async fn sign_in<R: FullRepository + ?Sized>(
    repo: &R,
    sessions: &SessionStore,
    email: &str,
    password: &str,
) -> ServiceResult<AuthSession> {
    let email = email.trim().to_lowercase();
    let user = match repo.find_user_by_email(&email).await? {
        Some(user) => user,
        None => {
            warn!("Sign-in attempt for unknown email {}", email);
            return Err(ServiceError::InvalidCredentials);
        }
    };
    let valid = user
        .password_hash
        .as_deref()
        .is_some_and(|hash| verify_password(password, hash));
    if !valid {
        warn!("Wrong password for {}", email);
        return Err(ServiceError::InvalidCredentials);
    }

    repo.record_login(user.id).await?;
    let session = sessions.issue(Actor::from(&user));
    info!("{} signed in as {}", user.email, user.role);
    Ok(session)
}

pub fn sign_out(sessions: &SessionStore, token: &str) -> bool {
    sessions.revoke(token)
}

/// Ensures the platform company and the configured super admin exist.
///
/// Returns the existing account untouched when the email is already taken.
pub async fn bootstrap_admin<R: FullRepository + ?Sized>(
    repo: &R,
    policy: &PlatformPolicy,
    admin: &BootstrapAdmin,
) -> ServiceResult<User> {
    let email = admin.email.trim().to_lowercase();
    if let Some(existing) = repo.find_user_by_email(&email).await? {
        return Ok(existing);
    }

    let company = match repo.find_company_by_name(&policy.platform_company).await? {
        Some(company) => company,
        None => {
            info!("Creating platform company {}", policy.platform_company);
            repo.create_company(&CompanyInput {
                name: policy.platform_company.clone(),
                address: None,
                abn: None,
            })
            .await?
        }
    };

    let user = repo
        .create_user(&NewUser {
            email,
            name: None,
            password_hash: hash_password(&admin.password),
            role: Role::SuperAdmin,
            company_id: Some(company.id),
        })
        .await?;
    info!("Bootstrap super admin {} created", user.email);
    Ok(user)
}
