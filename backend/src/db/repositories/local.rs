//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! memory, providing fast, deterministic, and isolated execution.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::*;

/// In-memory local repository.
///
/// Cloning is cheap and clones share the same data.
///
/// # Example
/// ```
/// use bin_tally::db::repositories::LocalRepository;
/// use bin_tally::db::repository::DirectoryRepository;
/// use bin_tally::models::CompanyInput;
///
/// # tokio_test_block(async {
/// let repo = LocalRepository::new();
/// let input = CompanyInput { name: "Acme".into(), ..Default::default() };
/// repo.create_company(&input).await.unwrap();
/// assert_eq!(repo.list_companies().await.unwrap().len(), 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    companies: HashMap<CompanyId, Company>,
    users: HashMap<UserId, User>,
    bin_types: HashMap<BinTypeId, BinType>,
    contamination_types: HashMap<ContaminationTypeId, ContaminationType>,
    forms: HashMap<FormId, BinTallyForm>,
    // Insertion order is the display order of a form's bins.
    form_bins: Vec<FormBin>,
    invitations: HashMap<InvitationId, Invitation>,
    submissions: HashMap<SubmissionId, FormSubmission>,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            companies: HashMap::new(),
            users: HashMap::new(),
            bin_types: HashMap::new(),
            contamination_types: HashMap::new(),
            forms: HashMap::new(),
            form_bins: Vec::new(),
            invitations: HashMap::new(),
            submissions: HashMap::new(),
            is_healthy: true,
        }
    }
}

fn not_found(entity: &str, id: impl ToString) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("{} not found", entity),
        ErrorContext::default()
            .with_entity(entity)
            .with_entity_id(id),
    )
}

impl LocalData {
    fn check_health(&self) -> RepositoryResult<()> {
        if self.is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection(
                "Local repository is marked unhealthy",
            ))
        }
    }

    fn company(&self, id: CompanyId) -> RepositoryResult<&Company> {
        self.companies.get(&id).ok_or_else(|| not_found("company", id))
    }

    fn form(&self, id: FormId) -> RepositoryResult<&BinTallyForm> {
        self.forms.get(&id).ok_or_else(|| not_found("form", id))
    }

    fn ensure_bin_types_exist(&self, ids: &[BinTypeId]) -> RepositoryResult<()> {
        match ids.iter().find(|id| !self.bin_types.contains_key(id)) {
            Some(missing) => Err(RepositoryError::validation_with_context(
                "Bin type does not exist",
                ErrorContext::default()
                    .with_entity("bin_type")
                    .with_entity_id(missing),
            )),
            None => Ok(()),
        }
    }

    fn ensure_distinct_bin_types(&self, bins: &[FormBinSpec]) -> RepositoryResult<()> {
        match repeated_bin_type(bins) {
            Some(repeated) => Err(RepositoryError::validation_with_context(
                "Bin type listed more than once",
                ErrorContext::default()
                    .with_entity("bin_type")
                    .with_entity_id(repeated),
            )),
            None => Ok(()),
        }
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email) && Some(u.id) != except)
    }

    fn details(&self, id: FormId) -> RepositoryResult<FormDetails> {
        let form = self.form(id)?.clone();
        let company = form
            .company_id
            .and_then(|c| self.companies.get(&c))
            .cloned();
        let bins = self
            .form_bins
            .iter()
            .filter(|b| b.form_id == id)
            .filter_map(|b| {
                self.bin_types.get(&b.bin_type_id).map(|t| FormBinDetail {
                    form_bin: b.clone(),
                    bin_type: t.clone(),
                })
            })
            .collect();
        Ok(FormDetails {
            form,
            company,
            bins,
        })
    }

    fn summary(&self, form: &BinTallyForm) -> FormSummary {
        FormSummary {
            form: form.clone(),
            company_name: form
                .company_id
                .and_then(|c| self.companies.get(&c))
                .map(|c| c.name.clone()),
            bin_count: self.form_bins.iter().filter(|b| b.form_id == form.id).count(),
        }
    }

    fn submission_record(&self, submission: &FormSubmission) -> SubmissionRecord {
        let form = self.forms.get(&submission.form_id);
        let company = form
            .and_then(|f| f.company_id)
            .and_then(|c| self.companies.get(&c));
        SubmissionRecord {
            submission: submission.clone(),
            form_title: form.map(|f| f.title.clone()),
            unique_code: form.map(|f| f.unique_code.clone()),
            company_id: company.map(|c| c.id),
            company_name: company.map(|c| c.name.clone()),
        }
    }

    fn code_taken(&self, code: &str, except: Option<FormId>) -> bool {
        self.forms
            .values()
            .any(|f| f.unique_code == code && Some(f.id) != except)
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    /// Get the number of forms stored.
    pub fn form_count(&self) -> usize {
        self.data.read().forms.len()
    }

    /// Get the number of submissions stored.
    pub fn submission_count(&self) -> usize {
        self.data.read().submissions.len()
    }
}

// =============================================================================
// Companies & Users
// =============================================================================

#[async_trait]
impl DirectoryRepository for LocalRepository {
    async fn list_companies(&self) -> RepositoryResult<Vec<Company>> {
        let data = self.data.read();
        data.check_health()?;
        let mut companies: Vec<Company> = data.companies.values().cloned().collect();
        companies.sort_by_key(|c| c.name.to_lowercase());
        Ok(companies)
    }

    async fn get_company(&self, id: CompanyId) -> RepositoryResult<Company> {
        let data = self.data.read();
        data.check_health()?;
        data.company(id).cloned()
    }

    async fn find_company_by_name(&self, name: &str) -> RepositoryResult<Option<Company>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data
            .companies
            .values()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    async fn create_company(&self, input: &CompanyInput) -> RepositoryResult<Company> {
        let mut data = self.data.write();
        data.check_health()?;
        let company = Company {
            id: CompanyId::random(),
            name: input.name.clone(),
            address: input.address.clone(),
            abn: input.abn.clone(),
            created_at: Utc::now(),
        };
        data.companies.insert(company.id, company.clone());
        Ok(company)
    }

    async fn update_company(
        &self,
        id: CompanyId,
        input: &CompanyInput,
    ) -> RepositoryResult<Company> {
        let mut data = self.data.write();
        data.check_health()?;
        let company = data
            .companies
            .get_mut(&id)
            .ok_or_else(|| not_found("company", id))?;
        company.name = input.name.clone();
        company.address = input.address.clone();
        company.abn = input.abn.clone();
        Ok(company.clone())
    }

    async fn delete_company(&self, id: CompanyId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.check_health()?;
        data.companies
            .remove(&id)
            .ok_or_else(|| not_found("company", id))?;
        for user in data.users.values_mut() {
            if user.company_id == Some(id) {
                user.company_id = None;
            }
        }
        for form in data.forms.values_mut() {
            if form.company_id == Some(id) {
                form.company_id = None;
            }
        }
        data.contamination_types
            .retain(|_, t| t.company_id != Some(id));
        Ok(())
    }

    async fn list_users(
        &self,
        company: Option<CompanyId>,
    ) -> RepositoryResult<Vec<UserWithCompany>> {
        let data = self.data.read();
        data.check_health()?;
        let mut users: Vec<UserWithCompany> = data
            .users
            .values()
            .filter(|u| company.is_none() || u.company_id == company)
            .map(|u| UserWithCompany {
                user: u.clone(),
                company_name: u
                    .company_id
                    .and_then(|c| data.companies.get(&c))
                    .map(|c| c.name.clone()),
            })
            .collect();
        users.sort_by(|a, b| a.user.email.cmp(&b.user.email));
        Ok(users)
    }

    async fn get_user(&self, id: UserId) -> RepositoryResult<User> {
        let data = self.data.read();
        data.check_health()?;
        data.users
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("user", id))
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }

    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let mut data = self.data.write();
        data.check_health()?;
        if data.email_taken(&user.email, None) {
            return Err(RepositoryError::conflict_with_context(
                "A user with this email already exists",
                ErrorContext::new("create_user").with_entity("user"),
            ));
        }
        if let Some(company) = user.company_id {
            data.company(company)?;
        }
        let created = User {
            id: UserId::random(),
            email: user.email.clone(),
            name: user.name.clone(),
            password_hash: Some(user.password_hash.clone()),
            role: user.role,
            company_id: user.company_id,
            created_at: Utc::now(),
            last_login: None,
        };
        data.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> RepositoryResult<User> {
        let mut data = self.data.write();
        data.check_health()?;
        if let Some(Some(company)) = update.company_id {
            data.company(company)?;
        }
        let user = data.users.get_mut(&id).ok_or_else(|| not_found("user", id))?;
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(company) = update.company_id {
            user.company_id = company;
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.check_health()?;
        data.users.remove(&id).ok_or_else(|| not_found("user", id))?;
        for form in data.forms.values_mut() {
            if form.created_by == Some(id) {
                form.created_by = None;
            }
        }
        Ok(())
    }

    async fn record_login(&self, id: UserId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.check_health()?;
        let user = data.users.get_mut(&id).ok_or_else(|| not_found("user", id))?;
        user.last_login = Some(Utc::now());
        Ok(())
    }
}

// =============================================================================
// Bin Types & Contamination Types
// =============================================================================

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn list_bin_types(&self) -> RepositoryResult<Vec<BinType>> {
        let data = self.data.read();
        data.check_health()?;
        let mut types: Vec<BinType> = data.bin_types.values().cloned().collect();
        types.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.bin_size.cmp(&b.bin_size))
        });
        Ok(types)
    }

    async fn get_bin_type(&self, id: BinTypeId) -> RepositoryResult<BinType> {
        let data = self.data.read();
        data.check_health()?;
        data.bin_types
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("bin_type", id))
    }

    async fn find_bin_types_by_identity(
        &self,
        input: &BinTypeInput,
    ) -> RepositoryResult<Vec<BinType>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data
            .bin_types
            .values()
            .filter(|t| t.same_identity(input))
            .cloned()
            .collect())
    }

    async fn create_bin_type(&self, input: &BinTypeInput) -> RepositoryResult<BinType> {
        let mut data = self.data.write();
        data.check_health()?;
        if data.bin_types.values().any(|t| t.same_identity(input)) {
            return Err(RepositoryError::conflict(
                "A bin type with this name, size and unit already exists",
            ));
        }
        let now = Utc::now();
        let bin_type = BinType {
            id: BinTypeId::random(),
            name: input.name.clone(),
            color: input.color.clone(),
            icon: input.icon.clone(),
            bin_size: input.bin_size.clone(),
            bin_uom: input.bin_uom.clone(),
            created_at: now,
            updated_at: now,
        };
        data.bin_types.insert(bin_type.id, bin_type.clone());
        Ok(bin_type)
    }

    async fn update_bin_type(
        &self,
        id: BinTypeId,
        input: &BinTypeInput,
    ) -> RepositoryResult<BinType> {
        let mut data = self.data.write();
        data.check_health()?;
        if data
            .bin_types
            .values()
            .any(|t| t.id != id && t.same_identity(input))
        {
            return Err(RepositoryError::conflict(
                "A bin type with this name, size and unit already exists",
            ));
        }
        let bin_type = data
            .bin_types
            .get_mut(&id)
            .ok_or_else(|| not_found("bin_type", id))?;
        bin_type.name = input.name.clone();
        bin_type.color = input.color.clone();
        bin_type.icon = input.icon.clone();
        bin_type.bin_size = input.bin_size.clone();
        bin_type.bin_uom = input.bin_uom.clone();
        bin_type.updated_at = Utc::now();
        Ok(bin_type.clone())
    }

    async fn delete_bin_type(&self, id: BinTypeId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.check_health()?;
        if !data.bin_types.contains_key(&id) {
            return Err(not_found("bin_type", id));
        }
        if data.form_bins.iter().any(|b| b.bin_type_id == id) {
            return Err(RepositoryError::conflict_with_context(
                "Bin type is used by one or more forms",
                ErrorContext::new("delete_bin_type")
                    .with_entity("bin_type")
                    .with_entity_id(id),
            ));
        }
        data.bin_types.remove(&id);
        for contamination in data.contamination_types.values_mut() {
            contamination.bin_type_ids.retain(|b| *b != id);
        }
        Ok(())
    }

    async fn list_contamination_types(
        &self,
        company: Option<CompanyId>,
    ) -> RepositoryResult<Vec<ContaminationType>> {
        let data = self.data.read();
        data.check_health()?;
        let mut types: Vec<ContaminationType> = data
            .contamination_types
            .values()
            .filter(|t| company.is_none() || t.company_id.is_none() || t.company_id == company)
            .cloned()
            .collect();
        types.sort_by_key(|t| t.name.to_lowercase());
        Ok(types)
    }

    async fn get_contamination_type(
        &self,
        id: ContaminationTypeId,
    ) -> RepositoryResult<ContaminationType> {
        let data = self.data.read();
        data.check_health()?;
        data.contamination_types
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("contamination_type", id))
    }

    async fn create_contamination_type(
        &self,
        input: &ContaminationTypeInput,
    ) -> RepositoryResult<ContaminationType> {
        let mut data = self.data.write();
        data.check_health()?;
        data.ensure_bin_types_exist(&input.bin_type_ids)?;
        if let Some(company) = input.company_id {
            data.company(company)?;
        }
        let created = ContaminationType {
            id: ContaminationTypeId::random(),
            name: input.name.clone(),
            description: input.description.clone(),
            company_id: input.company_id,
            bin_type_ids: input.bin_type_ids.clone(),
            created_at: Utc::now(),
        };
        data.contamination_types.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_contamination_type(
        &self,
        id: ContaminationTypeId,
        input: &ContaminationTypeInput,
    ) -> RepositoryResult<ContaminationType> {
        let mut data = self.data.write();
        data.check_health()?;
        data.ensure_bin_types_exist(&input.bin_type_ids)?;
        let existing = data
            .contamination_types
            .get_mut(&id)
            .ok_or_else(|| not_found("contamination_type", id))?;
        existing.name = input.name.clone();
        existing.description = input.description.clone();
        existing.bin_type_ids = input.bin_type_ids.clone();
        Ok(existing.clone())
    }

    async fn delete_contamination_type(&self, id: ContaminationTypeId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.check_health()?;
        data.contamination_types
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("contamination_type", id))
    }
}

// =============================================================================
// Forms & Invitations
// =============================================================================

#[async_trait]
impl FormRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn list_forms(&self, company: Option<CompanyId>) -> RepositoryResult<Vec<FormSummary>> {
        let data = self.data.read();
        data.check_health()?;
        let mut forms: Vec<&BinTallyForm> = data
            .forms
            .values()
            .filter(|f| company.is_none() || f.company_id == company)
            .collect();
        forms.sort_by_key(|f| (Reverse(f.updated_at), f.title.to_lowercase()));
        Ok(forms.into_iter().map(|f| data.summary(f)).collect())
    }

    async fn get_form(&self, id: FormId) -> RepositoryResult<BinTallyForm> {
        let data = self.data.read();
        data.check_health()?;
        data.form(id).cloned()
    }

    async fn find_form_by_code(&self, code: &str) -> RepositoryResult<Option<BinTallyForm>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data
            .forms
            .values()
            .find(|f| f.unique_code == code)
            .cloned())
    }

    async fn form_details(&self, id: FormId) -> RepositoryResult<FormDetails> {
        let data = self.data.read();
        data.check_health()?;
        data.details(id)
    }

    async fn count_forms(&self, company: CompanyId) -> RepositoryResult<usize> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data
            .forms
            .values()
            .filter(|f| f.company_id == Some(company))
            .count())
    }

    async fn bin_type_in_use(&self, bin_type: BinTypeId) -> RepositoryResult<bool> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data.form_bins.iter().any(|b| b.bin_type_id == bin_type))
    }

    async fn create_form(
        &self,
        form: &NewForm,
        bins: &[FormBinSpec],
    ) -> RepositoryResult<FormDetails> {
        let mut data = self.data.write();
        data.check_health()?;
        if data.code_taken(&form.unique_code, None) {
            return Err(RepositoryError::conflict_with_context(
                "Form code already in use",
                ErrorContext::new("create_form").with_details(form.unique_code.clone()),
            ));
        }
        if let Some(company) = form.company_id {
            data.company(company)?;
        }
        let bin_type_ids: Vec<BinTypeId> = bins.iter().map(|b| b.bin_type_id).collect();
        data.ensure_bin_types_exist(&bin_type_ids)?;
        data.ensure_distinct_bin_types(bins)?;

        let now = Utc::now();
        let created = BinTallyForm {
            id: FormId::random(),
            title: form.title.clone(),
            description: form.description.clone(),
            location: form.location.clone(),
            area: form.area.clone(),
            unique_code: form.unique_code.clone(),
            company_id: form.company_id,
            created_by: form.created_by,
            created_at: now,
            updated_at: now,
        };
        for spec in bins {
            data.form_bins.push(FormBin {
                id: FormBinId::random(),
                form_id: created.id,
                bin_type_id: spec.bin_type_id,
                quantity: spec.quantity,
            });
        }
        let id = created.id;
        data.forms.insert(id, created);
        data.details(id)
    }

    async fn update_form(
        &self,
        id: FormId,
        update: &FormUpdate,
        bins: &[FormBinSpec],
    ) -> RepositoryResult<FormDetails> {
        let mut data = self.data.write();
        data.check_health()?;
        data.form(id)?;
        if let Some(company) = update.company_id {
            data.company(company)?;
        }
        let bin_type_ids: Vec<BinTypeId> = bins.iter().map(|b| b.bin_type_id).collect();
        data.ensure_bin_types_exist(&bin_type_ids)?;
        data.ensure_distinct_bin_types(bins)?;
        let foreign_row = bins.iter().filter_map(|b| b.id).find(|row| {
            !data
                .form_bins
                .iter()
                .any(|existing| existing.id == *row && existing.form_id == id)
        });
        if let Some(row) = foreign_row {
            return Err(RepositoryError::validation_with_context(
                "Form bin does not belong to this form",
                ErrorContext::new("update_form")
                    .with_entity("form_bin")
                    .with_entity_id(row),
            ));
        }

        let kept: Vec<FormBinId> = bins.iter().filter_map(|b| b.id).collect();
        data.form_bins
            .retain(|b| b.form_id != id || kept.contains(&b.id));
        for spec in bins {
            match spec.id {
                Some(row) => {
                    if let Some(existing) = data.form_bins.iter_mut().find(|b| b.id == row) {
                        existing.bin_type_id = spec.bin_type_id;
                        existing.quantity = spec.quantity;
                    }
                }
                None => data.form_bins.push(FormBin {
                    id: FormBinId::random(),
                    form_id: id,
                    bin_type_id: spec.bin_type_id,
                    quantity: spec.quantity,
                }),
            }
        }

        if let Some(form) = data.forms.get_mut(&id) {
            form.title = update.title.clone();
            form.description = update.description.clone();
            form.location = update.location.clone();
            form.area = update.area.clone();
            form.company_id = update.company_id;
            form.updated_at = Utc::now();
        }
        data.details(id)
    }

    async fn delete_form(&self, id: FormId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.check_health()?;
        data.forms.remove(&id).ok_or_else(|| not_found("form", id))?;
        data.form_bins.retain(|b| b.form_id != id);
        data.invitations.retain(|_, i| i.form_id != id);
        Ok(())
    }

    async fn list_invitations(&self, form: FormId) -> RepositoryResult<Vec<Invitation>> {
        let data = self.data.read();
        data.check_health()?;
        let mut invitations: Vec<Invitation> = data
            .invitations
            .values()
            .filter(|i| i.form_id == form)
            .cloned()
            .collect();
        invitations.sort_by_key(|i| Reverse(i.created_at));
        Ok(invitations)
    }

    async fn get_invitation(&self, id: InvitationId) -> RepositoryResult<Invitation> {
        let data = self.data.read();
        data.check_health()?;
        data.invitations
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("invitation", id))
    }

    async fn find_invitation_by_code(&self, code: &str) -> RepositoryResult<Option<Invitation>> {
        let data = self.data.read();
        data.check_health()?;
        Ok(data
            .invitations
            .values()
            .find(|i| i.access_code == code)
            .cloned())
    }

    async fn create_invitation(&self, invitation: &NewInvitation) -> RepositoryResult<Invitation> {
        let mut data = self.data.write();
        data.check_health()?;
        data.form(invitation.form_id)?;
        if data
            .invitations
            .values()
            .any(|i| i.access_code == invitation.access_code)
        {
            return Err(RepositoryError::conflict("Invitation code already in use"));
        }
        let now = Utc::now();
        let created = Invitation {
            id: InvitationId::random(),
            form_id: invitation.form_id,
            email: invitation.email.clone(),
            access_code: invitation.access_code.clone(),
            status: InvitationStatus::Active,
            is_used: false,
            expires_at: Some(invitation.expires_at),
            created_at: now,
            last_updated_at: now,
        };
        data.invitations.insert(created.id, created.clone());
        Ok(created)
    }

    async fn delete_invitation(&self, id: InvitationId) -> RepositoryResult<()> {
        let mut data = self.data.write();
        data.check_health()?;
        data.invitations
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("invitation", id))
    }
}

// =============================================================================
// Submissions
// =============================================================================

#[async_trait]
impl SubmissionRepository for LocalRepository {
    async fn store_submission(
        &self,
        submission: &NewSubmission,
    ) -> RepositoryResult<FormSubmission> {
        let mut data = self.data.write();
        data.check_health()?;
        data.form(submission.form_id)?;
        let stored = FormSubmission {
            id: SubmissionId::random(),
            form_id: submission.form_id,
            submitted_by: submission.submitted_by.clone(),
            submitted_at: submission.submitted_at,
            data: submission.data.clone(),
        };
        data.submissions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn list_submissions(
        &self,
        company: Option<CompanyId>,
    ) -> RepositoryResult<Vec<SubmissionRecord>> {
        let data = self.data.read();
        data.check_health()?;
        let mut records: Vec<SubmissionRecord> = data
            .submissions
            .values()
            .map(|s| data.submission_record(s))
            .filter(|r| company.is_none() || r.company_id == company)
            .collect();
        records.sort_by_key(|r| Reverse(r.submission.submitted_at));
        Ok(records)
    }

    async fn get_submission(&self, id: SubmissionId) -> RepositoryResult<SubmissionRecord> {
        let data = self.data.read();
        data.check_health()?;
        data.submissions
            .get(&id)
            .map(|s| data.submission_record(s))
            .ok_or_else(|| not_found("submission", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin_input(name: &str, size: &str) -> BinTypeInput {
        BinTypeInput {
            name: name.into(),
            bin_size: Some(size.into()),
            bin_uom: Some("L".into()),
            ..Default::default()
        }
    }

    fn new_form(code: &str) -> NewForm {
        NewForm {
            title: "Depot".into(),
            description: None,
            location: "Yard".into(),
            area: Some("North".into()),
            unique_code: code.into(),
            company_id: None,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_unhealthy_repository_fails_operations() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        assert!(repo.list_forms(None).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_bin_identity_conflicts() {
        let repo = LocalRepository::new();
        repo.create_bin_type(&bin_input("Glass", "240")).await.unwrap();
        repo.create_bin_type(&bin_input("Glass", "660")).await.unwrap();
        let err = repo
            .create_bin_type(&bin_input("Glass", "240"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ConflictError { .. }));
    }

    #[tokio::test]
    async fn test_form_bins_sync_on_update() {
        let repo = LocalRepository::new();
        let glass = repo.create_bin_type(&bin_input("Glass", "240")).await.unwrap();
        let paper = repo.create_bin_type(&bin_input("Paper", "240")).await.unwrap();
        let created = repo
            .create_form(
                &new_form("ABCDEF"),
                &[
                    FormBinSpec { id: None, bin_type_id: glass.id, quantity: 2 },
                    FormBinSpec { id: None, bin_type_id: paper.id, quantity: 1 },
                ],
            )
            .await
            .unwrap();
        let glass_row = created.bins[0].form_bin.id;

        let update = FormUpdate {
            title: "Depot 2".into(),
            description: None,
            location: "Yard".into(),
            area: None,
            company_id: None,
        };
        let updated = repo
            .update_form(
                created.form.id,
                &update,
                &[
                    FormBinSpec { id: Some(glass_row), bin_type_id: glass.id, quantity: 5 },
                    FormBinSpec { id: None, bin_type_id: paper.id, quantity: 3 },
                ],
            )
            .await
            .unwrap();

        assert_eq!(updated.form.title, "Depot 2");
        assert_eq!(updated.bins.len(), 2);
        assert_eq!(updated.bins[0].form_bin.id, glass_row);
        assert_eq!(updated.bins[0].form_bin.quantity, 5);
        assert_ne!(updated.bins[1].form_bin.id, created.bins[1].form_bin.id);
    }

    #[tokio::test]
    async fn test_form_refuses_repeated_bin_type() {
        let repo = LocalRepository::new();
        let glass = repo.create_bin_type(&bin_input("Glass", "240")).await.unwrap();
        let row = FormBinSpec { id: None, bin_type_id: glass.id, quantity: 1 };
        let err = repo
            .create_form(&new_form("ABCDEF"), &[row.clone(), row.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        assert_eq!(repo.form_count(), 0);

        let created = repo.create_form(&new_form("ABCDEF"), &[row.clone()]).await.unwrap();
        let update = FormUpdate {
            title: "Depot".into(),
            description: None,
            location: "Yard".into(),
            area: None,
            company_id: None,
        };
        let err = repo
            .update_form(created.form.id, &update, &[row.clone(), row])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
        let unchanged = repo.form_details(created.form.id).await.unwrap();
        assert_eq!(unchanged.bins.len(), 1);
    }

    #[tokio::test]
    async fn test_bin_type_in_use_cannot_be_deleted() {
        let repo = LocalRepository::new();
        let glass = repo.create_bin_type(&bin_input("Glass", "240")).await.unwrap();
        repo.create_form(
            &new_form("ABCDEF"),
            &[FormBinSpec { id: None, bin_type_id: glass.id, quantity: 1 }],
        )
        .await
        .unwrap();
        assert!(repo.bin_type_in_use(glass.id).await.unwrap());
        assert!(repo.delete_bin_type(glass.id).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_form_code_conflicts() {
        let repo = LocalRepository::new();
        repo.create_form(&new_form("ABCDEF"), &[]).await.unwrap();
        let err = repo.create_form(&new_form("ABCDEF"), &[]).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConflictError { .. }));
    }

    #[tokio::test]
    async fn test_clear_keeps_health_flag() {
        let repo = LocalRepository::new();
        repo.create_form(&new_form("ABCDEF"), &[]).await.unwrap();
        repo.set_healthy(false);
        repo.clear();
        assert_eq!(repo.form_count(), 0);
        assert!(!repo.health_check().await.unwrap());
    }
}
