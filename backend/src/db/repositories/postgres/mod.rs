//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database.
//! The schema lives in `migrations/` and is applied automatically when the
//! repository is created.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task;
use uuid::Uuid;

use crate::db::repository::{
    CatalogRepository, DirectoryRepository, ErrorContext, FormRepository, RepositoryError,
    RepositoryResult, SubmissionRepository,
};
use crate::models::{
    repeated_bin_type, BinTallyForm, BinType, BinTypeId, BinTypeInput, Company, CompanyId, CompanyInput,
    ContaminationType, ContaminationTypeId, ContaminationTypeInput, FormBinDetail, FormBinSpec,
    FormDetails, FormId, FormSubmission, FormSummary, FormUpdate, Invitation, InvitationId,
    InvitationStatus, NewForm, NewInvitation, NewSubmission, NewUser, SubmissionId,
    SubmissionRecord, User, UserId, UserUpdate, UserWithCompany,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
    /// - `PG_POOL_MAX`: Maximum pool size (default: 10)
    /// - `PG_POOL_MIN`: Minimum pool size (default: 1)
    /// - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
    /// - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
    /// - `PG_MAX_RETRIES`: Maximum retry attempts (default: 3)
    /// - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
///
/// This repository implementation provides:
/// - Connection pooling with configurable limits
/// - Automatic retry for transient failures
/// - Health monitoring and statistics
/// - Automatic schema migrations
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Arguments
    /// * `config` - Database configuration
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    ///
    /// Returns current pool state and query statistics for monitoring.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    ///
    /// Performs a simple query to verify connectivity.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }

    /// Get detailed health information.
    ///
    /// Returns a tuple of (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.health_check().await {
            Ok(true) => (true, Some(start.elapsed().as_millis() as u64), None),
            Ok(false) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some("Health check returned false".to_string()),
            ),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn not_found(entity: &str, id: impl ToString) -> RepositoryError {
    RepositoryError::not_found_with_context(
        format!("{} not found", entity),
        ErrorContext::default()
            .with_entity(entity)
            .with_entity_id(id),
    )
}

// ==================== Row loading helpers ====================

fn load_company(conn: &mut PgConnection, id: Uuid) -> RepositoryResult<CompanyRow> {
    companies::table
        .find(id)
        .select(CompanyRow::as_select())
        .first::<CompanyRow>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .ok_or_else(|| not_found("company", id))
}

fn load_form(conn: &mut PgConnection, id: Uuid) -> RepositoryResult<FormRow> {
    bin_tally_forms::table
        .find(id)
        .select(FormRow::as_select())
        .first::<FormRow>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .ok_or_else(|| not_found("form", id))
}

fn company_names(
    conn: &mut PgConnection,
    ids: impl IntoIterator<Item = Uuid>,
) -> RepositoryResult<HashMap<Uuid, CompanyRow>> {
    let ids: HashSet<Uuid> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = companies::table
        .filter(companies::id.eq_any(ids.into_iter().collect::<Vec<_>>()))
        .select(CompanyRow::as_select())
        .load::<CompanyRow>(conn)
        .map_err(map_diesel_error)?;
    Ok(rows.into_iter().map(|r| (r.id, r)).collect())
}

fn ensure_bin_types_exist(conn: &mut PgConnection, ids: &[BinTypeId]) -> RepositoryResult<()> {
    let wanted: HashSet<Uuid> = ids.iter().map(|id| Uuid::from(*id)).collect();
    if wanted.is_empty() {
        return Ok(());
    }
    let found: HashSet<Uuid> = bin_types::table
        .filter(bin_types::id.eq_any(wanted.iter().copied().collect::<Vec<_>>()))
        .select(bin_types::id)
        .load::<Uuid>(conn)
        .map_err(map_diesel_error)?
        .into_iter()
        .collect();
    match wanted.iter().find(|id| !found.contains(id)) {
        Some(missing) => Err(RepositoryError::validation_with_context(
            "Bin type does not exist",
            ErrorContext::default()
                .with_entity("bin_type")
                .with_entity_id(missing),
        )),
        None => Ok(()),
    }
}

fn ensure_distinct_bin_types(bins: &[FormBinSpec]) -> RepositoryResult<()> {
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

fn contamination_links(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> RepositoryResult<HashMap<Uuid, Vec<BinTypeId>>> {
    let rows: Vec<(Uuid, Uuid)> = contamination_type_bin_types::table
        .filter(contamination_type_bin_types::contamination_type_id.eq_any(ids.to_vec()))
        .select((
            contamination_type_bin_types::contamination_type_id,
            contamination_type_bin_types::bin_type_id,
        ))
        .load(conn)
        .map_err(map_diesel_error)?;
    let mut links: HashMap<Uuid, Vec<BinTypeId>> = HashMap::new();
    for (contamination, bin_type) in rows {
        links.entry(contamination).or_default().push(bin_type.into());
    }
    Ok(links)
}

fn replace_contamination_links(
    conn: &mut PgConnection,
    contamination: Uuid,
    bin_type_ids: &[BinTypeId],
) -> RepositoryResult<()> {
    diesel::delete(
        contamination_type_bin_types::table
            .filter(contamination_type_bin_types::contamination_type_id.eq(contamination)),
    )
    .execute(conn)
    .map_err(map_diesel_error)?;
    let rows: Vec<ContaminationLinkRow> = bin_type_ids
        .iter()
        .map(|id| ContaminationLinkRow {
            contamination_type_id: contamination,
            bin_type_id: (*id).into(),
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(contamination_type_bin_types::table)
            .values(&rows)
            .execute(conn)
            .map_err(map_diesel_error)?;
    }
    Ok(())
}

fn load_contamination_type(
    conn: &mut PgConnection,
    id: Uuid,
) -> RepositoryResult<ContaminationType> {
    let row = contamination_types::table
        .find(id)
        .select(ContaminationTypeRow::as_select())
        .first::<ContaminationTypeRow>(conn)
        .optional()
        .map_err(map_diesel_error)?
        .ok_or_else(|| not_found("contamination_type", id))?;
    let mut links = contamination_links(conn, &[id])?;
    Ok(row.into_model(links.remove(&id).unwrap_or_default()))
}

fn load_form_details(conn: &mut PgConnection, id: Uuid) -> RepositoryResult<FormDetails> {
    let form: BinTallyForm = load_form(conn, id)?.into();
    let company = match form.company_id {
        Some(company) => companies::table
            .find(Uuid::from(company))
            .select(CompanyRow::as_select())
            .first::<CompanyRow>(conn)
            .optional()
            .map_err(map_diesel_error)?
            .map(Company::from),
        None => None,
    };
    let rows: Vec<(FormBinRow, BinTypeRow)> = form_bins::table
        .inner_join(bin_types::table)
        .filter(form_bins::form_id.eq(id))
        .order(form_bins::position.asc())
        .select((FormBinRow::as_select(), BinTypeRow::as_select()))
        .load(conn)
        .map_err(map_diesel_error)?;
    let bins = rows
        .into_iter()
        .map(|(bin, bin_type)| FormBinDetail {
            form_bin: bin.into(),
            bin_type: bin_type.into(),
        })
        .collect();
    Ok(FormDetails {
        form,
        company,
        bins,
    })
}

fn insert_form_bins(
    conn: &mut PgConnection,
    form: Uuid,
    bins: &[FormBinSpec],
) -> RepositoryResult<()> {
    let rows: Vec<NewFormBinRow> = bins
        .iter()
        .enumerate()
        .map(|(position, spec)| NewFormBinRow {
            id: Uuid::new_v4(),
            form_id: form,
            bin_type_id: spec.bin_type_id.into(),
            quantity: spec.quantity,
            position: position as i32,
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(form_bins::table)
            .values(&rows)
            .execute(conn)
            .map_err(map_diesel_error)?;
    }
    Ok(())
}

fn submission_records(
    conn: &mut PgConnection,
    rows: Vec<SubmissionRow>,
) -> RepositoryResult<Vec<SubmissionRecord>> {
    let form_ids: Vec<Uuid> = rows
        .iter()
        .map(|r| r.form_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let forms: HashMap<Uuid, FormRow> = bin_tally_forms::table
        .filter(bin_tally_forms::id.eq_any(form_ids))
        .select(FormRow::as_select())
        .load::<FormRow>(conn)
        .map_err(map_diesel_error)?
        .into_iter()
        .map(|f| (f.id, f))
        .collect();
    let companies = company_names(conn, forms.values().filter_map(|f| f.company_id))?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let form = forms.get(&row.form_id);
            let company = form
                .and_then(|f| f.company_id)
                .and_then(|c| companies.get(&c));
            SubmissionRecord {
                form_title: form.map(|f| f.title.clone()),
                unique_code: form.map(|f| f.unique_code.clone()),
                company_id: company.map(|c| c.id.into()),
                company_name: company.map(|c| c.name.clone()),
                submission: row.into(),
            }
        })
        .collect())
}

// =============================================================================
// Companies & Users
// =============================================================================

#[async_trait]
impl DirectoryRepository for PostgresRepository {
    async fn list_companies(&self) -> RepositoryResult<Vec<Company>> {
        self.with_conn(|conn| {
            let mut companies: Vec<Company> = companies::table
                .select(CompanyRow::as_select())
                .load::<CompanyRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(Company::from)
                .collect();
            companies.sort_by_key(|c| c.name.to_lowercase());
            Ok(companies)
        })
        .await
    }

    async fn get_company(&self, id: CompanyId) -> RepositoryResult<Company> {
        self.with_conn(move |conn| load_company(conn, id.into()).map(Company::from))
            .await
    }

    async fn find_company_by_name(&self, name: &str) -> RepositoryResult<Option<Company>> {
        let name = name.trim().to_lowercase();
        self.with_conn(move |conn| {
            let rows = companies::table
                .select(CompanyRow::as_select())
                .load::<CompanyRow>(conn)
                .map_err(map_diesel_error)?;
            Ok(rows
                .into_iter()
                .find(|c| c.name.to_lowercase() == name)
                .map(Company::from))
        })
        .await
    }

    async fn create_company(&self, input: &CompanyInput) -> RepositoryResult<Company> {
        let row = NewCompanyRow {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            address: input.address.clone(),
            abn: input.abn.clone(),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(companies::table)
                .values(&row)
                .returning(CompanyRow::as_returning())
                .get_result::<CompanyRow>(conn)
                .map(Company::from)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn update_company(
        &self,
        id: CompanyId,
        input: &CompanyInput,
    ) -> RepositoryResult<Company> {
        let input = input.clone();
        self.with_conn(move |conn| {
            diesel::update(companies::table.find(Uuid::from(id)))
                .set((
                    companies::name.eq(&input.name),
                    companies::address.eq(&input.address),
                    companies::abn.eq(&input.abn),
                ))
                .returning(CompanyRow::as_returning())
                .get_result::<CompanyRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Company::from)
                .ok_or_else(|| not_found("company", id))
        })
        .await
    }

    async fn delete_company(&self, id: CompanyId) -> RepositoryResult<()> {
        // Users and forms are detached and company contamination types
        // removed by the foreign key actions.
        self.with_conn(move |conn| {
            let deleted = diesel::delete(companies::table.find(Uuid::from(id)))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(not_found("company", id));
            }
            Ok(())
        })
        .await
    }

    async fn list_users(
        &self,
        company: Option<CompanyId>,
    ) -> RepositoryResult<Vec<UserWithCompany>> {
        self.with_conn(move |conn| {
            let mut query = users::table.select(UserRow::as_select()).into_boxed();
            if let Some(company) = company {
                query = query.filter(users::company_id.eq(Uuid::from(company)));
            }
            let rows = query
                .order(users::email.asc())
                .load::<UserRow>(conn)
                .map_err(map_diesel_error)?;
            let companies = company_names(conn, rows.iter().filter_map(|u| u.company_id))?;

            rows.into_iter()
                .map(|row| {
                    let company_name = row
                        .company_id
                        .and_then(|c| companies.get(&c))
                        .map(|c| c.name.clone());
                    Ok(UserWithCompany {
                        user: User::try_from(row)?,
                        company_name,
                    })
                })
                .collect()
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> RepositoryResult<User> {
        self.with_conn(move |conn| {
            users::table
                .find(Uuid::from(id))
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| not_found("user", id))
                .and_then(User::try_from)
        })
        .await
    }

    async fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let email = email.trim().to_lowercase();
        self.with_conn(move |conn| {
            users::table
                .filter(users::email.eq(&email))
                .select(UserRow::as_select())
                .first::<UserRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(User::try_from)
                .transpose()
        })
        .await
    }

    async fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let row = NewUserRow {
            id: Uuid::new_v4(),
            email: user.email.trim().to_lowercase(),
            name: user.name.clone(),
            password_hash: Some(user.password_hash.clone()),
            role: user.role.as_str().to_string(),
            company_id: user.company_id.map(Uuid::from),
        };
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let taken = users::table
                    .filter(users::email.eq(&row.email))
                    .select(users::id)
                    .first::<Uuid>(tx)
                    .optional()
                    .map_err(map_diesel_error)?;
                if taken.is_some() {
                    return Err(RepositoryError::conflict_with_context(
                        "A user with this email already exists",
                        ErrorContext::new("create_user").with_entity("user"),
                    ));
                }
                if let Some(company) = row.company_id {
                    load_company(tx, company)?;
                }
                diesel::insert_into(users::table)
                    .values(&row)
                    .returning(UserRow::as_returning())
                    .get_result::<UserRow>(tx)
                    .map_err(map_diesel_error)
                    .and_then(User::try_from)
            })
        })
        .await
    }

    async fn update_user(&self, id: UserId, update: &UserUpdate) -> RepositoryResult<User> {
        let update = update.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let user_id = Uuid::from(id);
                users::table
                    .find(user_id)
                    .select(users::id)
                    .first::<Uuid>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .ok_or_else(|| not_found("user", id))?;
                if let Some(Some(company)) = update.company_id {
                    load_company(tx, company.into())?;
                }
                if let Some(role) = update.role {
                    diesel::update(users::table.find(user_id))
                        .set(users::role.eq(role.as_str()))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }
                if let Some(company) = update.company_id {
                    diesel::update(users::table.find(user_id))
                        .set(users::company_id.eq(company.map(Uuid::from)))
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                }
                users::table
                    .find(user_id)
                    .select(UserRow::as_select())
                    .first::<UserRow>(tx)
                    .map_err(map_diesel_error)
                    .and_then(User::try_from)
            })
        })
        .await
    }

    async fn delete_user(&self, id: UserId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(users::table.find(Uuid::from(id)))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(not_found("user", id));
            }
            Ok(())
        })
        .await
    }

    async fn record_login(&self, id: UserId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let updated = diesel::update(users::table.find(Uuid::from(id)))
                .set(users::last_login.eq(Some(Utc::now())))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if updated == 0 {
                return Err(not_found("user", id));
            }
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Bin Types & Contamination Types
// =============================================================================

fn identity_taken(
    conn: &mut PgConnection,
    input: &BinTypeInput,
    except: Option<Uuid>,
) -> RepositoryResult<bool> {
    let rows = bin_types::table
        .filter(bin_types::name.eq(&input.name))
        .select(BinTypeRow::as_select())
        .load::<BinTypeRow>(conn)
        .map_err(map_diesel_error)?;
    Ok(rows
        .into_iter()
        .filter(|r| Some(r.id) != except)
        .map(BinType::from)
        .any(|t| t.same_identity(input)))
}

fn duplicate_bin_type() -> RepositoryError {
    RepositoryError::conflict("A bin type with this name, size and unit already exists")
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn list_bin_types(&self) -> RepositoryResult<Vec<BinType>> {
        self.with_conn(|conn| {
            let mut types: Vec<BinType> = bin_types::table
                .select(BinTypeRow::as_select())
                .load::<BinTypeRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(BinType::from)
                .collect();
            types.sort_by(|a, b| {
                a.name
                    .to_lowercase()
                    .cmp(&b.name.to_lowercase())
                    .then_with(|| a.bin_size.cmp(&b.bin_size))
            });
            Ok(types)
        })
        .await
    }

    async fn get_bin_type(&self, id: BinTypeId) -> RepositoryResult<BinType> {
        self.with_conn(move |conn| {
            bin_types::table
                .find(Uuid::from(id))
                .select(BinTypeRow::as_select())
                .first::<BinTypeRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(BinType::from)
                .ok_or_else(|| not_found("bin_type", id))
        })
        .await
    }

    async fn find_bin_types_by_identity(
        &self,
        input: &BinTypeInput,
    ) -> RepositoryResult<Vec<BinType>> {
        let input = input.clone();
        self.with_conn(move |conn| {
            Ok(bin_types::table
                .filter(bin_types::name.eq(&input.name))
                .select(BinTypeRow::as_select())
                .load::<BinTypeRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(BinType::from)
                .filter(|t| t.same_identity(&input))
                .collect())
        })
        .await
    }

    async fn create_bin_type(&self, input: &BinTypeInput) -> RepositoryResult<BinType> {
        let input = input.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                if identity_taken(tx, &input, None)? {
                    return Err(duplicate_bin_type());
                }
                let row = NewBinTypeRow {
                    id: Uuid::new_v4(),
                    name: input.name.clone(),
                    color: input.color.clone(),
                    icon: input.icon.clone(),
                    bin_size: input.bin_size.clone(),
                    bin_uom: input.bin_uom.clone(),
                };
                diesel::insert_into(bin_types::table)
                    .values(&row)
                    .returning(BinTypeRow::as_returning())
                    .get_result::<BinTypeRow>(tx)
                    .map(BinType::from)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn update_bin_type(
        &self,
        id: BinTypeId,
        input: &BinTypeInput,
    ) -> RepositoryResult<BinType> {
        let input = input.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                if identity_taken(tx, &input, Some(id.into()))? {
                    return Err(duplicate_bin_type());
                }
                diesel::update(bin_types::table.find(Uuid::from(id)))
                    .set((
                        bin_types::name.eq(&input.name),
                        bin_types::color.eq(&input.color),
                        bin_types::icon.eq(&input.icon),
                        bin_types::bin_size.eq(&input.bin_size),
                        bin_types::bin_uom.eq(&input.bin_uom),
                        bin_types::updated_at.eq(Utc::now()),
                    ))
                    .returning(BinTypeRow::as_returning())
                    .get_result::<BinTypeRow>(tx)
                    .optional()
                    .map_err(map_diesel_error)?
                    .map(BinType::from)
                    .ok_or_else(|| not_found("bin_type", id))
            })
        })
        .await
    }

    async fn delete_bin_type(&self, id: BinTypeId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let in_use: i64 = form_bins::table
                    .filter(form_bins::bin_type_id.eq(Uuid::from(id)))
                    .count()
                    .get_result(tx)
                    .map_err(map_diesel_error)?;
                if in_use > 0 {
                    return Err(RepositoryError::conflict_with_context(
                        "Bin type is used by one or more forms",
                        ErrorContext::new("delete_bin_type")
                            .with_entity("bin_type")
                            .with_entity_id(id),
                    ));
                }
                let deleted = diesel::delete(bin_types::table.find(Uuid::from(id)))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                if deleted == 0 {
                    return Err(not_found("bin_type", id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn list_contamination_types(
        &self,
        company: Option<CompanyId>,
    ) -> RepositoryResult<Vec<ContaminationType>> {
        self.with_conn(move |conn| {
            let mut rows = contamination_types::table
                .select(ContaminationTypeRow::as_select())
                .load::<ContaminationTypeRow>(conn)
                .map_err(map_diesel_error)?;
            if let Some(company) = company.map(Uuid::from) {
                rows.retain(|r| r.company_id.map_or(true, |c| c == company));
            }
            let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
            let mut links = contamination_links(conn, &ids)?;

            let mut types: Vec<ContaminationType> = rows
                .into_iter()
                .map(|row| {
                    let bins = links.remove(&row.id).unwrap_or_default();
                    row.into_model(bins)
                })
                .collect();
            types.sort_by_key(|t| t.name.to_lowercase());
            Ok(types)
        })
        .await
    }

    async fn get_contamination_type(
        &self,
        id: ContaminationTypeId,
    ) -> RepositoryResult<ContaminationType> {
        self.with_conn(move |conn| load_contamination_type(conn, id.into()))
            .await
    }

    async fn create_contamination_type(
        &self,
        input: &ContaminationTypeInput,
    ) -> RepositoryResult<ContaminationType> {
        let input = input.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                ensure_bin_types_exist(tx, &input.bin_type_ids)?;
                if let Some(company) = input.company_id {
                    load_company(tx, company.into())?;
                }
                let row = NewContaminationTypeRow {
                    id: Uuid::new_v4(),
                    name: input.name.clone(),
                    description: input.description.clone(),
                    company_id: input.company_id.map(Uuid::from),
                };
                diesel::insert_into(contamination_types::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                replace_contamination_links(tx, row.id, &input.bin_type_ids)?;
                load_contamination_type(tx, row.id)
            })
        })
        .await
    }

    async fn update_contamination_type(
        &self,
        id: ContaminationTypeId,
        input: &ContaminationTypeInput,
    ) -> RepositoryResult<ContaminationType> {
        let input = input.clone();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                ensure_bin_types_exist(tx, &input.bin_type_ids)?;
                let updated = diesel::update(contamination_types::table.find(Uuid::from(id)))
                    .set((
                        contamination_types::name.eq(&input.name),
                        contamination_types::description.eq(&input.description),
                    ))
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                if updated == 0 {
                    return Err(not_found("contamination_type", id));
                }
                replace_contamination_links(tx, id.into(), &input.bin_type_ids)?;
                load_contamination_type(tx, id.into())
            })
        })
        .await
    }

    async fn delete_contamination_type(&self, id: ContaminationTypeId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(contamination_types::table.find(Uuid::from(id)))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(not_found("contamination_type", id));
            }
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Forms & Invitations
// =============================================================================

#[async_trait]
impl FormRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn list_forms(&self, company: Option<CompanyId>) -> RepositoryResult<Vec<FormSummary>> {
        self.with_conn(move |conn| {
            let mut query = bin_tally_forms::table
                .select(FormRow::as_select())
                .into_boxed();
            if let Some(company) = company {
                query = query.filter(bin_tally_forms::company_id.eq(Uuid::from(company)));
            }
            let rows = query
                .order((
                    bin_tally_forms::updated_at.desc(),
                    bin_tally_forms::title.asc(),
                ))
                .load::<FormRow>(conn)
                .map_err(map_diesel_error)?;

            let ids: Vec<Uuid> = rows.iter().map(|f| f.id).collect();
            let mut bin_counts: HashMap<Uuid, usize> = HashMap::new();
            for form_id in form_bins::table
                .filter(form_bins::form_id.eq_any(ids))
                .select(form_bins::form_id)
                .load::<Uuid>(conn)
                .map_err(map_diesel_error)?
            {
                *bin_counts.entry(form_id).or_default() += 1;
            }
            let companies = company_names(conn, rows.iter().filter_map(|f| f.company_id))?;

            Ok(rows
                .into_iter()
                .map(|row| FormSummary {
                    company_name: row
                        .company_id
                        .and_then(|c| companies.get(&c))
                        .map(|c| c.name.clone()),
                    bin_count: bin_counts.get(&row.id).copied().unwrap_or(0),
                    form: row.into(),
                })
                .collect())
        })
        .await
    }

    async fn get_form(&self, id: FormId) -> RepositoryResult<BinTallyForm> {
        self.with_conn(move |conn| load_form(conn, id.into()).map(BinTallyForm::from))
            .await
    }

    async fn find_form_by_code(&self, code: &str) -> RepositoryResult<Option<BinTallyForm>> {
        let code = code.to_string();
        self.with_conn(move |conn| {
            Ok(bin_tally_forms::table
                .filter(bin_tally_forms::unique_code.eq(&code))
                .select(FormRow::as_select())
                .first::<FormRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(BinTallyForm::from))
        })
        .await
    }

    async fn form_details(&self, id: FormId) -> RepositoryResult<FormDetails> {
        self.with_conn(move |conn| load_form_details(conn, id.into()))
            .await
    }

    async fn count_forms(&self, company: CompanyId) -> RepositoryResult<usize> {
        self.with_conn(move |conn| {
            let count: i64 = bin_tally_forms::table
                .filter(bin_tally_forms::company_id.eq(Uuid::from(company)))
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(count as usize)
        })
        .await
    }

    async fn bin_type_in_use(&self, bin_type: BinTypeId) -> RepositoryResult<bool> {
        self.with_conn(move |conn| {
            let count: i64 = form_bins::table
                .filter(form_bins::bin_type_id.eq(Uuid::from(bin_type)))
                .count()
                .get_result(conn)
                .map_err(map_diesel_error)?;
            Ok(count > 0)
        })
        .await
    }

    async fn create_form(
        &self,
        form: &NewForm,
        bins: &[FormBinSpec],
    ) -> RepositoryResult<FormDetails> {
        let row = NewFormRow {
            id: Uuid::new_v4(),
            title: form.title.clone(),
            description: form.description.clone(),
            location: form.location.clone(),
            area: form.area.clone(),
            unique_code: form.unique_code.clone(),
            company_id: form.company_id.map(Uuid::from),
            created_by: form.created_by.map(Uuid::from),
        };
        let bins = bins.to_vec();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let taken = bin_tally_forms::table
                    .filter(bin_tally_forms::unique_code.eq(&row.unique_code))
                    .select(bin_tally_forms::id)
                    .first::<Uuid>(tx)
                    .optional()
                    .map_err(map_diesel_error)?;
                if taken.is_some() {
                    return Err(RepositoryError::conflict_with_context(
                        "Form code already in use",
                        ErrorContext::new("create_form").with_details(row.unique_code.clone()),
                    ));
                }
                if let Some(company) = row.company_id {
                    load_company(tx, company)?;
                }
                let bin_type_ids: Vec<BinTypeId> = bins.iter().map(|b| b.bin_type_id).collect();
                ensure_bin_types_exist(tx, &bin_type_ids)?;
                ensure_distinct_bin_types(&bins)?;

                diesel::insert_into(bin_tally_forms::table)
                    .values(&row)
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                insert_form_bins(tx, row.id, &bins)?;
                load_form_details(tx, row.id)
            })
        })
        .await
    }

    async fn update_form(
        &self,
        id: FormId,
        update: &FormUpdate,
        bins: &[FormBinSpec],
    ) -> RepositoryResult<FormDetails> {
        let update = update.clone();
        let bins = bins.to_vec();
        let form_id = Uuid::from(id);
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                load_form(tx, form_id)?;
                if let Some(company) = update.company_id {
                    load_company(tx, company.into())?;
                }
                let bin_type_ids: Vec<BinTypeId> = bins.iter().map(|b| b.bin_type_id).collect();
                ensure_bin_types_exist(tx, &bin_type_ids)?;
                ensure_distinct_bin_types(&bins)?;

                let existing: HashSet<Uuid> = form_bins::table
                    .filter(form_bins::form_id.eq(form_id))
                    .select(form_bins::id)
                    .load::<Uuid>(tx)
                    .map_err(map_diesel_error)?
                    .into_iter()
                    .collect();
                let kept: Vec<Uuid> = bins.iter().filter_map(|b| b.id).map(Uuid::from).collect();
                if let Some(row) = kept.iter().find(|row| !existing.contains(row)) {
                    return Err(RepositoryError::validation_with_context(
                        "Form bin does not belong to this form",
                        ErrorContext::new("update_form")
                            .with_entity("form_bin")
                            .with_entity_id(row),
                    ));
                }

                diesel::delete(
                    form_bins::table
                        .filter(form_bins::form_id.eq(form_id))
                        .filter(form_bins::id.ne_all(kept.clone())),
                )
                .execute(tx)
                .map_err(map_diesel_error)?;

                for (position, spec) in bins.iter().enumerate() {
                    match spec.id {
                        Some(row) => {
                            diesel::update(form_bins::table.find(Uuid::from(row)))
                                .set((
                                    form_bins::bin_type_id.eq(Uuid::from(spec.bin_type_id)),
                                    form_bins::quantity.eq(spec.quantity),
                                    form_bins::position.eq(position as i32),
                                ))
                                .execute(tx)
                                .map_err(map_diesel_error)?;
                        }
                        None => {
                            diesel::insert_into(form_bins::table)
                                .values(&NewFormBinRow {
                                    id: Uuid::new_v4(),
                                    form_id,
                                    bin_type_id: spec.bin_type_id.into(),
                                    quantity: spec.quantity,
                                    position: position as i32,
                                })
                                .execute(tx)
                                .map_err(map_diesel_error)?;
                        }
                    }
                }

                diesel::update(bin_tally_forms::table.find(form_id))
                    .set((
                        bin_tally_forms::title.eq(&update.title),
                        bin_tally_forms::description.eq(&update.description),
                        bin_tally_forms::location.eq(&update.location),
                        bin_tally_forms::area.eq(&update.area),
                        bin_tally_forms::company_id.eq(update.company_id.map(Uuid::from)),
                        bin_tally_forms::updated_at.eq(Utc::now()),
                    ))
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                load_form_details(tx, form_id)
            })
        })
        .await
    }

    async fn delete_form(&self, id: FormId) -> RepositoryResult<()> {
        // Bins and invitations cascade; submissions carry no foreign key.
        self.with_conn(move |conn| {
            let deleted = diesel::delete(bin_tally_forms::table.find(Uuid::from(id)))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(not_found("form", id));
            }
            Ok(())
        })
        .await
    }

    async fn list_invitations(&self, form: FormId) -> RepositoryResult<Vec<Invitation>> {
        self.with_conn(move |conn| {
            form_invitations::table
                .filter(form_invitations::form_id.eq(Uuid::from(form)))
                .order(form_invitations::created_at.desc())
                .select(InvitationRow::as_select())
                .load::<InvitationRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(Invitation::try_from)
                .collect()
        })
        .await
    }

    async fn get_invitation(&self, id: InvitationId) -> RepositoryResult<Invitation> {
        self.with_conn(move |conn| {
            form_invitations::table
                .find(Uuid::from(id))
                .select(InvitationRow::as_select())
                .first::<InvitationRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| not_found("invitation", id))
                .and_then(Invitation::try_from)
        })
        .await
    }

    async fn find_invitation_by_code(&self, code: &str) -> RepositoryResult<Option<Invitation>> {
        let code = code.to_string();
        self.with_conn(move |conn| {
            form_invitations::table
                .filter(form_invitations::access_code.eq(&code))
                .select(InvitationRow::as_select())
                .first::<InvitationRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(Invitation::try_from)
                .transpose()
        })
        .await
    }

    async fn create_invitation(&self, invitation: &NewInvitation) -> RepositoryResult<Invitation> {
        let row = NewInvitationRow {
            id: Uuid::new_v4(),
            form_id: invitation.form_id.into(),
            email: invitation.email.clone(),
            access_code: invitation.access_code.clone(),
            status: InvitationStatus::Active.as_str().to_string(),
            expires_at: Some(invitation.expires_at),
        };
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                load_form(tx, row.form_id)?;
                diesel::insert_into(form_invitations::table)
                    .values(&row)
                    .returning(InvitationRow::as_returning())
                    .get_result::<InvitationRow>(tx)
                    .map_err(map_diesel_error)
                    .and_then(Invitation::try_from)
            })
        })
        .await
    }

    async fn delete_invitation(&self, id: InvitationId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(form_invitations::table.find(Uuid::from(id)))
                .execute(conn)
                .map_err(map_diesel_error)?;
            if deleted == 0 {
                return Err(not_found("invitation", id));
            }
            Ok(())
        })
        .await
    }
}

// =============================================================================
// Submissions
// =============================================================================

#[async_trait]
impl SubmissionRepository for PostgresRepository {
    async fn store_submission(
        &self,
        submission: &NewSubmission,
    ) -> RepositoryResult<FormSubmission> {
        let row = NewSubmissionRow {
            id: Uuid::new_v4(),
            form_id: submission.form_id.into(),
            submitted_by: submission.submitted_by.clone(),
            submitted_at: submission.submitted_at,
            data: submission.data.clone(),
        };
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                load_form(tx, row.form_id)?;
                diesel::insert_into(form_submissions::table)
                    .values(&row)
                    .returning(SubmissionRow::as_returning())
                    .get_result::<SubmissionRow>(tx)
                    .map(FormSubmission::from)
                    .map_err(map_diesel_error)
            })
        })
        .await
    }

    async fn list_submissions(
        &self,
        company: Option<CompanyId>,
    ) -> RepositoryResult<Vec<SubmissionRecord>> {
        self.with_conn(move |conn| {
            let rows = form_submissions::table
                .order(form_submissions::submitted_at.desc())
                .select(SubmissionRow::as_select())
                .load::<SubmissionRow>(conn)
                .map_err(map_diesel_error)?;
            let records = submission_records(conn, rows)?;
            Ok(records
                .into_iter()
                .filter(|r| company.is_none() || r.company_id == company)
                .collect())
        })
        .await
    }

    async fn get_submission(&self, id: SubmissionId) -> RepositoryResult<SubmissionRecord> {
        self.with_conn(move |conn| {
            let row = form_submissions::table
                .find(Uuid::from(id))
                .select(SubmissionRow::as_select())
                .first::<SubmissionRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .ok_or_else(|| not_found("submission", id))?;
            submission_records(conn, vec![row])?
                .pop()
                .ok_or_else(|| not_found("submission", id))
        })
        .await
    }
}
