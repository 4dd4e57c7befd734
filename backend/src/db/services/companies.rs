//! Company administration.

use log::info;

use super::error::{require, require_super_admin, ServiceError, ServiceResult};
use crate::config::PlatformPolicy;
use crate::db::repository::FullRepository;
use crate::models::{Actor, Company, CompanyId, CompanyInput, CompanyWithStats, Scope};

/// Companies visible to the actor, ordered by name, with their form counts.
///
/// Only super admins see the platform company.
pub async fn list_companies<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    policy: &PlatformPolicy,
) -> ServiceResult<Vec<CompanyWithStats>> {
    let companies = repo.list_companies().await?;
    let scope = actor.scope();

    let mut listed = Vec::new();
    for company in companies {
        let visible = match scope {
            Scope::All => true,
            Scope::Company(own) => own == company.id && !policy.is_platform(&company.name),
            Scope::Nothing => false,
        };
        if !visible {
            continue;
        }
        let form_count = repo.count_forms(company.id).await?;
        listed.push(CompanyWithStats {
            company,
            form_count,
        });
    }
    Ok(listed)
}

pub async fn get_company<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: CompanyId,
) -> ServiceResult<Company> {
    let company = repo.get_company(id).await?;
    if !actor.can_see(Some(company.id)) {
        return Err(ServiceError::not_found("Company"));
    }
    Ok(company)
}

pub async fn create_company<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    input: &CompanyInput,
) -> ServiceResult<Company> {
    require_super_admin(actor, "Only Super Admins can create companies")?;
    let input = input.normalized();
    require(&input.name, "Company name is required")?;

    let company = repo.create_company(&input).await?;
    info!("Company '{}' created by {}", company.name, actor.email);
    Ok(company)
}

pub async fn update_company<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    policy: &PlatformPolicy,
    id: CompanyId,
    input: &CompanyInput,
) -> ServiceResult<Company> {
    let existing = get_company(repo, actor, id).await?;
    if policy.is_platform(&existing.name) && !actor.is_super_admin() {
        return Err(ServiceError::forbidden(format!(
            "The {} company can only be edited by super admins",
            policy.platform_company
        )));
    }
    let input = input.normalized();
    require(&input.name, "Company name is required")?;

    Ok(repo.update_company(id, &input).await?)
}

/// Deletes a company. Its users and forms are detached, not deleted.
pub async fn delete_company<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    policy: &PlatformPolicy,
    id: CompanyId,
) -> ServiceResult<()> {
    require_super_admin(actor, "Only Super Admins can delete companies")?;
    let existing = repo.get_company(id).await?;
    if policy.is_platform(&existing.name) {
        return Err(ServiceError::forbidden(format!(
            "The {} company cannot be deleted as it is reserved for super admins",
            policy.platform_company
        )));
    }
    repo.delete_company(id).await?;
    info!("Company '{}' deleted by {}", existing.name, actor.email);
    Ok(())
}
