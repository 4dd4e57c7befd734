//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::repository::FullRepository;
use crate::services::auth::SessionStore;
use crate::services::drafts::DraftStore;
use crate::services::mailer::{LogMailer, Mailer};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Live admin bearer sessions
    pub sessions: SessionStore,
    /// In-progress worker tallies
    pub drafts: DraftStore,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Create a new application state with the given repository, configuration and mailer.
    pub fn new(
        repository: Arc<dyn FullRepository>,
        config: AppConfig,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            repository,
            sessions: SessionStore::new(config.session_ttl()),
            drafts: DraftStore::new(config.draft_ttl()),
            mailer,
            config: Arc::new(config),
        }
    }

    /// State with default configuration that only logs outgoing email.
    pub fn with_repository(repository: Arc<dyn FullRepository>) -> Self {
        Self::new(repository, AppConfig::default(), Arc::new(LogMailer::new()))
    }
}
