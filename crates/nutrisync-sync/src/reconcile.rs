//! Reconciliation between the remote store and the local cache.
//!
//! Load precedence: a configured remote is authoritative; on any failure
//! other than "not found" the most recent local snapshot is used, and with
//! no snapshot the built-in defaults. Writes fan out per record and never
//! stop at the first error.

use chrono::NaiveDate;
use nutrisync_core::{AppState, DailyLog, LogBook, Profile, ProfileId};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::LocalCache;
use crate::remote::RemoteStore;
use crate::stats::SyncStats;
use crate::RemoteError;

/// Where a loaded state came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSource {
    Remote,
    LocalCache,
    Defaults,
}

/// Result of [`Reconciler::load_state`].
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub state: AppState,
    pub source: StateSource,
    /// Set when a configured remote failed and a fallback was used.
    pub failure: Option<String>,
}

/// Outcome of writing a snapshot to the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOutcome {
    Saved,
    Failed(String),
}

impl CacheOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, CacheOutcome::Saved)
    }
}

/// Record a remote write was aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTarget {
    Profile,
    Log(NaiveDate),
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => write!(f, "profile"),
            Self::Log(date) => write!(f, "log {date}"),
        }
    }
}

/// One failed remote write.
#[derive(Debug, Clone)]
pub struct SyncFailure {
    pub target: SyncTarget,
    pub error: RemoteError,
}

/// Outcome of the remote half of a write.
#[derive(Debug, Clone)]
pub enum SyncReport {
    /// No remote configured; nothing to do
    LocalOnly,
    /// Remote writes suspended after an earlier failure
    Skipped,
    /// Every record was attempted
    Completed {
        synced: usize,
        failed: Vec<SyncFailure>,
    },
}

impl SyncReport {
    /// True when everything that was attempted reached the remote.
    pub fn is_clean(&self) -> bool {
        match self {
            SyncReport::Completed { failed, .. } => failed.is_empty(),
            SyncReport::LocalOnly | SyncReport::Skipped => true,
        }
    }

    pub fn failures(&self) -> &[SyncFailure] {
        match self {
            SyncReport::Completed { failed, .. } => failed,
            SyncReport::LocalOnly | SyncReport::Skipped => &[],
        }
    }

    pub fn synced(&self) -> usize {
        match self {
            SyncReport::Completed { synced, .. } => *synced,
            SyncReport::LocalOnly | SyncReport::Skipped => 0,
        }
    }
}

/// Merges remote and local state on load and fans writes out to both.
pub struct Reconciler {
    identity: ProfileId,
    remote: Option<Arc<dyn RemoteStore>>,
    cache: Arc<dyn LocalCache>,
    stats: Arc<SyncStats>,
}

impl Reconciler {
    /// Local-only reconciler.
    pub fn new(cache: Arc<dyn LocalCache>) -> Self {
        Self {
            identity: ProfileId::GUEST,
            remote: None,
            cache,
            stats: Arc::new(SyncStats::new()),
        }
    }

    /// Attach a remote store; it becomes authoritative on load.
    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn stats(&self) -> &Arc<SyncStats> {
        &self.stats
    }

    /// Build the starting state.
    pub async fn load_state(&self) -> LoadReport {
        let Some(remote) = &self.remote else {
            debug!("No remote configured, loading local snapshot");
            return self.fallback(None).await;
        };

        match self.load_remote(remote.as_ref()).await {
            Ok(state) => {
                info!(logs = state.logs.len(), "Loaded state from remote");
                LoadReport {
                    state,
                    source: StateSource::Remote,
                    failure: None,
                }
            }
            Err(e) => {
                warn!(error = %e, "Remote load failed, falling back to local snapshot");
                self.fallback(Some(e.to_string())).await
            }
        }
    }

    async fn load_remote(&self, remote: &dyn RemoteStore) -> Result<AppState, RemoteError> {
        let profile = match remote.fetch_profile(self.identity).await {
            Ok(profile) => profile,
            Err(RemoteError::NotFound) => {
                debug!("No remote profile yet");
                self.cached_state()
                    .await
                    .map(|state| state.profile)
                    .unwrap_or_default()
            }
            Err(e) => return Err(e),
        };

        let logs = match remote.fetch_logs(self.identity).await {
            Ok(logs) => logs,
            Err(RemoteError::NotFound) => Vec::new(),
            Err(e) => return Err(e),
        };

        Ok(AppState::new(profile, LogBook::from(logs)))
    }

    async fn fallback(&self, failure: Option<String>) -> LoadReport {
        match self.cached_state().await {
            Some(state) => LoadReport {
                state,
                source: StateSource::LocalCache,
                failure,
            },
            None => LoadReport {
                state: AppState::default(),
                source: StateSource::Defaults,
                failure,
            },
        }
    }

    async fn cached_state(&self) -> Option<AppState> {
        match self.cache.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable local snapshot");
                None
            }
        }
    }

    /// Upsert the profile on the fixed identity.
    pub async fn persist_profile(&self, profile: &Profile) -> SyncReport {
        let Some(remote) = &self.remote else {
            return SyncReport::LocalOnly;
        };

        let result = remote.upsert_profile(self.identity, profile).await;
        self.stats.record_upsert(result.is_ok());

        match result {
            Ok(()) => SyncReport::Completed {
                synced: 1,
                failed: Vec::new(),
            },
            Err(error) => {
                warn!(error = %error, "Failed to sync profile");
                SyncReport::Completed {
                    synced: 0,
                    failed: vec![SyncFailure {
                        target: SyncTarget::Profile,
                        error,
                    }],
                }
            }
        }
    }

    /// Upsert each log on `(identity, date)`. One failure does not stop the rest.
    pub async fn persist_logs(&self, logs: &[DailyLog]) -> SyncReport {
        let Some(remote) = &self.remote else {
            return SyncReport::LocalOnly;
        };

        let mut synced = 0;
        let mut failed = Vec::new();

        for log in logs {
            let result = remote.upsert_log(self.identity, log).await;
            self.stats.record_upsert(result.is_ok());

            match result {
                Ok(()) => synced += 1,
                Err(error) => {
                    warn!(date = %log.date, error = %error, "Failed to sync daily log");
                    failed.push(SyncFailure {
                        target: SyncTarget::Log(log.date),
                        error,
                    });
                }
            }
        }

        debug!(synced, failed = failed.len(), "Daily log sync finished");

        SyncReport::Completed { synced, failed }
    }

    /// Write the full snapshot to the local cache.
    pub async fn cache_snapshot(&self, state: &AppState) -> CacheOutcome {
        let result = self.cache.save(state).await;
        self.stats.record_cache_write(result.is_ok());

        match result {
            Ok(()) => CacheOutcome::Saved,
            Err(e) => {
                warn!(error = %e, "Failed to write local snapshot");
                CacheOutcome::Failed(e.to_string())
            }
        }
    }
}
