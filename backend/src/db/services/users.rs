//! Administrator accounts and the platform company rules that bind them.
//!
//! Super admins always belong to the platform company; site admins never do.

use log::info;

use super::error::{require, ServiceError, ServiceResult};
use crate::config::PlatformPolicy;
use crate::db::repository::FullRepository;
use crate::models::{Actor, Company, CompanyId, NewUser, Role, Scope, User, UserId, UserUpdate, UserWithCompany};
use crate::services::auth::hash_password;

/// Request to create an administrator.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub role: Role,
    pub company_id: Option<CompanyId>,
}

async fn company_of<R: FullRepository + ?Sized>(
    repo: &R,
    company: Option<CompanyId>,
) -> ServiceResult<Option<Company>> {
    match company {
        Some(id) => Ok(Some(repo.get_company(id).await?)),
        None => Ok(None),
    }
}

async fn platform_company<R: FullRepository + ?Sized>(
    repo: &R,
    policy: &PlatformPolicy,
) -> ServiceResult<Option<Company>> {
    Ok(repo.find_company_by_name(&policy.platform_company).await?)
}

/// Checks that `role` may belong to `company`.
fn check_placement(
    policy: &PlatformPolicy,
    role: Role,
    company: Option<&Company>,
    platform_exists: bool,
) -> ServiceResult<()> {
    let in_platform = company.is_some_and(|c| policy.is_platform(&c.name));
    match role {
        Role::SuperAdmin if !in_platform && platform_exists => Err(ServiceError::validation(
            format!(
                "Super Admin users must be assigned to {} company",
                policy.platform_company
            ),
        )),
        Role::SiteAdmin if in_platform => Err(ServiceError::validation(format!(
            "Site Admin users cannot be assigned to {} company",
            policy.platform_company
        ))),
        _ => Ok(()),
    }
}

/// Loads a user the actor is allowed to manage.
async fn managed_user<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: UserId,
) -> ServiceResult<User> {
    let user = repo.get_user(id).await?;
    if !actor.can_see(user.company_id) {
        return Err(ServiceError::not_found("User"));
    }
    if user.role == Role::SuperAdmin && !actor.is_super_admin() {
        return Err(ServiceError::forbidden("Only Super Admins can manage Super Admin users"));
    }
    Ok(user)
}

/// Users visible to the actor, ordered by email.
pub async fn list_users<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
) -> ServiceResult<Vec<UserWithCompany>> {
    let users = match actor.scope() {
        Scope::All => repo.list_users(None).await?,
        Scope::Company(company) => repo.list_users(Some(company)).await?,
        Scope::Nothing => Vec::new(),
    };
    Ok(users)
}

pub async fn create_user<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    policy: &PlatformPolicy,
    request: &CreateUser,
) -> ServiceResult<User> {
    let email = request.email.trim().to_lowercase();
    require(&email, "Email is required")?;
    require(&request.password, "Password is required")?;

    if request.role == Role::SuperAdmin && !actor.is_super_admin() {
        return Err(ServiceError::forbidden(
            "Only Super Admins can create other Super Admin users",
        ));
    }
    if !actor.is_super_admin() && request.company_id != actor.company_id {
        return Err(ServiceError::forbidden(
            "Site Admins can only add users to their own company",
        ));
    }

    let company = company_of(repo, request.company_id).await?;
    let platform_exists = platform_company(repo, policy).await?.is_some();
    check_placement(policy, request.role, company.as_ref(), platform_exists)?;

    if repo.find_user_by_email(&email).await?.is_some() {
        return Err(ServiceError::conflict("A user with this email already exists"));
    }

    let user = repo
        .create_user(&NewUser {
            email,
            name: crate::models::non_blank(request.name.as_deref()),
            password_hash: hash_password(&request.password),
            role: request.role,
            company_id: request.company_id,
        })
        .await?;
    info!("User {} ({}) created by {}", user.email, user.role, actor.email);
    Ok(user)
}

/// Changes a user's role.
///
/// Promotion moves the user into the platform company; demotion out of it
/// clears the company.
pub async fn update_role<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    policy: &PlatformPolicy,
    id: UserId,
    role: Role,
) -> ServiceResult<User> {
    let user = managed_user(repo, actor, id).await?;
    if role == Role::SuperAdmin && !actor.is_super_admin() {
        return Err(ServiceError::forbidden("Only Super Admins can assign Super Admin role"));
    }
    if role == user.role {
        return Ok(user);
    }

    let platform = platform_company(repo, policy).await?;
    let mut update = UserUpdate {
        role: Some(role),
        company_id: None,
    };
    match (role, platform) {
        (Role::SuperAdmin, Some(platform)) if user.company_id != Some(platform.id) => {
            update.company_id = Some(Some(platform.id));
        }
        (Role::SiteAdmin, Some(platform)) if user.company_id == Some(platform.id) => {
            update.company_id = Some(None);
        }
        _ => {}
    }

    let updated = repo.update_user(id, &update).await?;
    info!("User {} role set to {} by {}", updated.email, role, actor.email);
    Ok(updated)
}

/// Assigns a user to a company, or detaches them with `None`.
pub async fn assign_company<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    policy: &PlatformPolicy,
    id: UserId,
    company_id: Option<CompanyId>,
) -> ServiceResult<User> {
    let user = managed_user(repo, actor, id).await?;
    if !actor.is_super_admin() && company_id.is_some() && company_id != actor.company_id {
        return Err(ServiceError::forbidden(
            "Site Admins can only assign users to their own company",
        ));
    }
    if let Some(company) = company_of(repo, company_id).await? {
        check_placement(policy, user.role, Some(&company), true)?;
    }

    Ok(repo
        .update_user(
            id,
            &UserUpdate {
                role: None,
                company_id: Some(company_id),
            },
        )
        .await?)
}

pub async fn delete_user<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: UserId,
) -> ServiceResult<()> {
    if id == actor.user_id {
        return Err(ServiceError::validation("You cannot delete your own account"));
    }
    let user = managed_user(repo, actor, id).await?;
    repo.delete_user(id).await?;
    info!("User {} deleted by {}", user.email, actor.email);
    Ok(())
}

pub async fn get_user<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: UserId,
) -> ServiceResult<User> {
    let user = repo.get_user(id).await?;
    if !actor.can_see(user.company_id) && user.id != actor.user_id {
        return Err(ServiceError::not_found("User"));
    }
    Ok(user)
}
