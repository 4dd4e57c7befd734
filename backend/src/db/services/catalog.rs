//! Bin type and contamination type catalogues.
//!
//! Bin types are shared by every company and only super admins edit them.
//! Contamination types are either global (`company_id = None`) or owned by
//! one company.

use log::info;

use super::error::{require, require_super_admin, ServiceError, ServiceResult};
use crate::db::repository::FullRepository;
use crate::models::{
    Actor, BinType, BinTypeId, BinTypeInput, CompanyId, ContaminationType, ContaminationTypeId,
    ContaminationTypeInput, Scope,
};

// ==================== Bin Types ====================

pub async fn list_bin_types<R: FullRepository + ?Sized>(repo: &R) -> ServiceResult<Vec<BinType>> {
    Ok(repo.list_bin_types().await?)
}

/// Rejects `input` when another bin type already has its identity.
async fn ensure_unique_identity<R: FullRepository + ?Sized>(
    repo: &R,
    input: &BinTypeInput,
    editing: Option<BinTypeId>,
) -> ServiceResult<()> {
    let clash = repo
        .find_bin_types_by_identity(input)
        .await?
        .into_iter()
        .any(|existing| Some(existing.id) != editing);
    if clash {
        return Err(ServiceError::conflict(
            "A bin type with the same name, size and unit already exists",
        ));
    }
    Ok(())
}

pub async fn create_bin_type<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    input: &BinTypeInput,
) -> ServiceResult<BinType> {
    require_super_admin(actor, "Only Super Admins can manage bin types")?;
    let input = input.normalized();
    require(&input.name, "Bin type name is required")?;
    ensure_unique_identity(repo, &input, None).await?;

    let bin_type = repo.create_bin_type(&input).await?;
    info!("Bin type '{}' created by {}", bin_type.name, actor.email);
    Ok(bin_type)
}

pub async fn update_bin_type<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: BinTypeId,
    input: &BinTypeInput,
) -> ServiceResult<BinType> {
    require_super_admin(actor, "Only Super Admins can manage bin types")?;
    let input = input.normalized();
    require(&input.name, "Bin type name is required")?;
    repo.get_bin_type(id).await?;
    ensure_unique_identity(repo, &input, Some(id)).await?;

    Ok(repo.update_bin_type(id, &input).await?)
}

pub async fn delete_bin_type<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: BinTypeId,
) -> ServiceResult<()> {
    require_super_admin(actor, "Only Super Admins can manage bin types")?;
    let bin_type = repo.get_bin_type(id).await?;
    if repo.bin_type_in_use(id).await? {
        return Err(ServiceError::conflict(format!(
            "Bin type '{}' is used by one or more forms and cannot be deleted",
            bin_type.name
        )));
    }
    repo.delete_bin_type(id).await?;
    info!("Bin type '{}' deleted by {}", bin_type.name, actor.email);
    Ok(())
}

// ==================== Contamination Types ====================

/// Contamination types visible to the actor: everything for super admins,
/// global plus own-company types for site admins.
pub async fn list_contamination_types<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
) -> ServiceResult<Vec<ContaminationType>> {
    let types = match actor.scope() {
        Scope::All => repo.list_contamination_types(None).await?,
        Scope::Company(company) => repo.list_contamination_types(Some(company)).await?,
        Scope::Nothing => repo
            .list_contamination_types(None)
            .await?
            .into_iter()
            .filter(|t| t.company_id.is_none())
            .collect(),
    };
    Ok(types)
}

async fn validated_contamination_input<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    input: &ContaminationTypeInput,
) -> ServiceResult<ContaminationTypeInput> {
    let mut input = input.normalized();
    require(&input.name, "Contamination type name is required")?;
    if input.bin_type_ids.is_empty() {
        return Err(ServiceError::validation("Select at least one bin type"));
    }
    for id in &input.bin_type_ids {
        repo.get_bin_type(*id).await?;
    }
    if !actor.is_super_admin() {
        input.company_id = actor.company_id;
    }
    Ok(input)
}

/// Loads a contamination type the actor may edit.
async fn editable_contamination_type<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: ContaminationTypeId,
) -> ServiceResult<ContaminationType> {
    let existing = repo.get_contamination_type(id).await?;
    if actor.is_super_admin() {
        return Ok(existing);
    }
    match existing.company_id {
        None => Err(ServiceError::forbidden(
            "Only Super Admins can edit global contamination types",
        )),
        Some(company) if actor.can_see(Some(company)) => Ok(existing),
        Some(_) => Err(ServiceError::not_found("Contamination type")),
    }
}

pub async fn create_contamination_type<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    input: &ContaminationTypeInput,
) -> ServiceResult<ContaminationType> {
    let input = validated_contamination_input(repo, actor, input).await?;
    let created = repo.create_contamination_type(&input).await?;
    info!(
        "Contamination type '{}' created by {}",
        created.name, actor.email
    );
    Ok(created)
}

/// Updates a contamination type and replaces its bin type links.
pub async fn update_contamination_type<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: ContaminationTypeId,
    input: &ContaminationTypeInput,
) -> ServiceResult<ContaminationType> {
    editable_contamination_type(repo, actor, id).await?;
    let input = validated_contamination_input(repo, actor, input).await?;
    Ok(repo.update_contamination_type(id, &input).await?)
}

pub async fn delete_contamination_type<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: ContaminationTypeId,
) -> ServiceResult<()> {
    let existing = editable_contamination_type(repo, actor, id).await?;
    repo.delete_contamination_type(id).await?;
    info!(
        "Contamination type '{}' deleted by {}",
        existing.name, actor.email
    );
    Ok(())
}

/// Contamination types an inspector may pick for one bin.
///
/// Types linked to `bin_type` are offered; when none are linked every
/// type visible to `company` is offered.
pub async fn options_for_bin<R: FullRepository + ?Sized>(
    repo: &R,
    bin_type: BinTypeId,
    company: Option<CompanyId>,
) -> ServiceResult<Vec<ContaminationType>> {
    let visible = match company {
        Some(company) => repo.list_contamination_types(Some(company)).await?,
        None => repo
            .list_contamination_types(None)
            .await?
            .into_iter()
            .filter(|t| t.company_id.is_none())
            .collect(),
    };
    let linked: Vec<ContaminationType> = visible
        .iter()
        .filter(|t| t.applies_to(bin_type))
        .cloned()
        .collect();
    Ok(if linked.is_empty() { visible } else { linked })
}
