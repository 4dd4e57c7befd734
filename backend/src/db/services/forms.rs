//! Bin tally forms: the checklists workers open with a code.

use std::collections::HashSet;

use log::{info, warn};

use super::error::{require, ServiceError, ServiceResult};
use crate::db::repository::FullRepository;
use crate::models::{
    Actor, BinTallyForm, CompanyId, FormBinInput, FormBinSpec, FormDetails, FormId, FormInput,
    FormSummary, FormUpdate, NewForm, Scope, MAX_BIN_QUANTITY, MIN_BIN_QUANTITY,
};
use crate::services::codes::{generate_alpha_code, FORM_CODE_LEN};

/// Attempts at drawing an unused form code before giving up.
const MAX_CODE_ATTEMPTS: usize = 10;

/// Forms visible to the actor, most recently updated first.
///
/// `company` narrows the listing further; `search` is matched with
/// [`FormSummary::matches`].
pub async fn list_forms<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    company: Option<CompanyId>,
    search: Option<&str>,
) -> ServiceResult<Vec<FormSummary>> {
    let mut forms = match actor.scope() {
        Scope::All => repo.list_forms(company).await?,
        Scope::Company(own) if company.map_or(true, |c| c == own) => {
            repo.list_forms(Some(own)).await?
        }
        Scope::Company(_) | Scope::Nothing => Vec::new(),
    };
    if let Some(needle) = search {
        forms.retain(|form| form.matches(needle));
    }
    Ok(forms)
}

/// Loads a form the actor may see.
pub(super) async fn visible_form<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: FormId,
) -> ServiceResult<BinTallyForm> {
    let form = repo.get_form(id).await?;
    if !actor.can_see(form.company_id) {
        return Err(ServiceError::not_found("Form"));
    }
    Ok(form)
}

pub async fn get_form<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: FormId,
) -> ServiceResult<FormDetails> {
    visible_form(repo, actor, id).await?;
    Ok(repo.form_details(id).await?)
}

fn validate_fields(input: &FormInput) -> ServiceResult<()> {
    require(&input.title, "Title is required")?;
    require(&input.location, "Location is required")?;
    require(input.area.as_deref().unwrap_or(""), "Area is required")?;
    Ok(())
}

/// Checks every requested bin row.
///
/// A bin type may appear on one row only; its quantity carries the count.
pub fn validate_bins(bins: &[FormBinInput]) -> ServiceResult<Vec<FormBinSpec>> {
    let mut seen = HashSet::new();
    bins.iter()
        .enumerate()
        .map(|(index, row)| {
            let bin_type_id = row.bin_type_id.ok_or_else(|| {
                ServiceError::validation(format!("Select a bin type for bin {}", index + 1))
            })?;
            if !seen.insert(bin_type_id) {
                return Err(ServiceError::validation(format!(
                    "Bin {} repeats a bin type already on this form",
                    index + 1
                )));
            }
            if !(MIN_BIN_QUANTITY..=MAX_BIN_QUANTITY).contains(&row.quantity) {
                return Err(ServiceError::validation(format!(
                    "Quantity must be between {} and {}",
                    MIN_BIN_QUANTITY, MAX_BIN_QUANTITY
                )));
            }
            Ok(FormBinSpec {
                id: row.id,
                bin_type_id,
                quantity: row.quantity,
            })
        })
        .collect()
}

/// The company a form created or edited by `actor` belongs to.
fn owning_company(actor: &Actor, requested: Option<CompanyId>) -> ServiceResult<Option<CompanyId>> {
    if actor.is_super_admin() {
        return Ok(requested);
    }
    match actor.company_id {
        Some(company) => Ok(Some(company)),
        None => Err(ServiceError::forbidden(
            "You must be assigned to a company to manage forms",
        )),
    }
}

/// Draws form codes until one is unused.
pub async fn fresh_form_code<R: FullRepository + ?Sized>(repo: &R) -> ServiceResult<String> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_alpha_code(FORM_CODE_LEN)?;
        if repo.find_form_by_code(&code).await?.is_none() {
            return Ok(code);
        }
        warn!("Form code {} already taken, drawing another", code);
    }
    Err(ServiceError::conflict(
        "Could not generate a unique form code, please try again",
    ))
}

pub async fn create_form<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    input: &FormInput,
    bins: &[FormBinInput],
) -> ServiceResult<FormDetails> {
    let input = input.normalized();
    validate_fields(&input)?;
    let bins = validate_bins(bins)?;
    let company_id = owning_company(actor, input.company_id)?;
    if let Some(company) = company_id {
        repo.get_company(company).await?;
    }

    let unique_code = fresh_form_code(repo).await?;
    let details = repo
        .create_form(
            &NewForm {
                title: input.title,
                description: input.description,
                location: input.location,
                area: input.area,
                unique_code,
                company_id,
                created_by: Some(actor.user_id),
            },
            &bins,
        )
        .await?;
    info!(
        "Form '{}' ({}) created by {}",
        details.form.title, details.form.unique_code, actor.email
    );
    Ok(details)
}

/// Updates a form and synchronizes its bin rows with `bins`.
pub async fn update_form<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: FormId,
    input: &FormInput,
    bins: &[FormBinInput],
) -> ServiceResult<FormDetails> {
    let existing = visible_form(repo, actor, id).await?;
    let input = input.normalized();
    validate_fields(&input)?;
    let bins = validate_bins(bins)?;

    let company_id = if actor.is_super_admin() {
        input.company_id
    } else {
        existing.company_id
    };
    if let Some(company) = company_id {
        repo.get_company(company).await?;
    }

    let details = repo
        .update_form(
            id,
            &FormUpdate {
                title: input.title,
                description: input.description,
                location: input.location,
                area: input.area,
                company_id,
            },
            &bins,
        )
        .await?;
    info!("Form '{}' updated by {}", details.form.title, actor.email);
    Ok(details)
}

pub async fn delete_form<R: FullRepository + ?Sized>(
    repo: &R,
    actor: &Actor,
    id: FormId,
) -> ServiceResult<()> {
    let form = visible_form(repo, actor, id).await?;
    repo.delete_form(id).await?;
    info!("Form '{}' deleted by {}", form.title, actor.email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BinTypeId;

    #[test]
    fn test_validate_bins_requires_bin_type() {
        let err = validate_bins(&[FormBinInput {
            id: None,
            bin_type_id: None,
            quantity: 1,
        }])
        .unwrap_err();
        assert_eq!(err.to_string(), "Select a bin type for bin 1");
    }

    #[test]
    fn test_validate_bins_bounds_quantity() {
        let row = |quantity| FormBinInput {
            id: None,
            bin_type_id: Some(BinTypeId::random()),
            quantity,
        };
        assert!(validate_bins(&[row(0)]).is_err());
        assert!(validate_bins(&[row(11)]).is_err());
        assert_eq!(validate_bins(&[row(1), row(10)]).unwrap().len(), 2);
    }

    #[test]
    fn test_validate_bins_rejects_repeated_bin_type() {
        let general = BinTypeId::random();
        let row = |bin_type_id| FormBinInput {
            id: None,
            bin_type_id: Some(bin_type_id),
            quantity: 1,
        };
        let err = validate_bins(&[row(general), row(BinTypeId::random()), row(general)])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Bin 3 repeats a bin type already on this form"
        );
    }

    #[test]
    fn test_area_is_required() {
        let input = FormInput {
            title: "Depot".into(),
            location: "1 Main St".into(),
            area: Some("   ".into()),
            ..Default::default()
        }
        .normalized();
        assert!(matches!(
            validate_fields(&input),
            Err(ServiceError::Validation(_))
        ));
    }
}
