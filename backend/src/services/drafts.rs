//! In-progress tallies held between worker requests.
//!
//! Each draft owns one [`TallySession`] plus the access code that opened it.
//! Drafts live in memory only and are dropped when the worker finishes,
//! leaves, or the draft goes stale.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::define_id_type;
use crate::services::tally::{Site, TallySession};

define_id_type!(DraftId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: DraftId,
    pub access_code: Option<String>,
    pub session: TallySession,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// In-memory draft store.
#[derive(Clone)]
pub struct DraftStore {
    drafts: Arc<RwLock<HashMap<DraftId, Draft>>>,
    ttl: Duration,
}

impl DraftStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            drafts: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Starts a tally of `site` and returns the new draft.
    pub fn create(&self, site: Site, access_code: Option<String>) -> Draft {
        let now = Utc::now();
        let draft = Draft {
            id: DraftId::random(),
            access_code,
            session: TallySession::new(site),
            created_at: now,
            updated_at: now,
        };
        self.drafts.write().insert(draft.id, draft.clone());
        draft
    }

    pub fn get(&self, id: DraftId) -> Option<Draft> {
        self.drafts.read().get(&id).cloned()
    }

    /// Runs `f` against the draft under the write lock and bumps `updated_at`.
    ///
    /// Returns `None` when the draft does not exist.
    pub fn update<R>(&self, id: DraftId, f: impl FnOnce(&mut Draft) -> R) -> Option<R> {
        let mut drafts = self.drafts.write();
        let draft = drafts.get_mut(&id)?;
        let result = f(draft);
        draft.updated_at = Utc::now();
        Some(result)
    }

    pub fn remove(&self, id: DraftId) -> Option<Draft> {
        self.drafts.write().remove(&id)
    }

    /// Drops drafts untouched for longer than the configured TTL.
    pub fn purge_stale(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.ttl;
        let mut drafts = self.drafts.write();
        let before = drafts.len();
        drafts.retain(|_, d| d.updated_at > cutoff);
        let purged = before - drafts.len();
        if purged > 0 {
            log::info!("Purged {} stale tally drafts", purged);
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.drafts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
