//! Sync mode and the user-facing advisory.

use parking_lot::RwLock;
use std::fmt;

use crate::reconcile::SyncReport;

pub(crate) const WRITE_FAILED: &str = "Failed to sync, saved locally";
pub(crate) const LOAD_FAILED: &str = "Cloud unavailable, showing locally saved data";
pub(crate) const CACHE_FAILED: &str = "Could not save changes on this device";

/// How writes reach durable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// No remote configured; the local cache is the only durable copy
    LocalOnly,
    /// Writes go to the cache and the remote
    Cloud,
    /// The remote failed; writes stay local until a retry succeeds
    Degraded,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalOnly => write!(f, "local-only"),
            Self::Cloud => write!(f, "cloud"),
            Self::Degraded => write!(f, "degraded"),
        }
    }
}

/// Notice that something did not reach durable storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncAdvisory {
    pub message: String,
    pub detail: String,
}

impl SyncAdvisory {
    pub(crate) fn new(message: &str, detail: impl Into<String>) -> Self {
        Self {
            message: message.to_string(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for SyncAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.detail)
    }
}

/// Shared between the store and its sync worker.
pub(crate) struct SyncHealth {
    mode: RwLock<SyncMode>,
    advisory: RwLock<Option<SyncAdvisory>>,
}

impl SyncHealth {
    pub fn new(mode: SyncMode) -> Self {
        Self {
            mode: RwLock::new(mode),
            advisory: RwLock::new(None),
        }
    }

    pub fn mode(&self) -> SyncMode {
        *self.mode.read()
    }

    pub fn set_mode(&self, mode: SyncMode) {
        *self.mode.write() = mode;
    }

    pub fn advisory(&self) -> Option<SyncAdvisory> {
        self.advisory.read().clone()
    }

    pub fn raise(&self, advisory: SyncAdvisory) {
        *self.advisory.write() = Some(advisory);
    }

    pub fn dismiss(&self) {
        *self.advisory.write() = None;
    }

    /// Degrade and raise an advisory if a remote write failed.
    pub fn observe(&self, report: &SyncReport) {
        let Some(first) = report.failures().first() else {
            return;
        };

        let detail = format!(
            "{} of {} writes failed; first: {}: {}",
            report.failures().len(),
            report.failures().len() + report.synced(),
            first.target,
            first.error
        );
        self.raise(SyncAdvisory::new(WRITE_FAILED, detail));
        self.set_mode(SyncMode::Degraded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::{SyncFailure, SyncTarget};
    use crate::RemoteError;

    #[test]
    fn test_clean_report_keeps_mode() {
        let health = SyncHealth::new(SyncMode::Cloud);
        health.observe(&SyncReport::Completed {
            synced: 2,
            failed: Vec::new(),
        });
        assert_eq!(health.mode(), SyncMode::Cloud);
        assert!(health.advisory().is_none());
    }

    #[test]
    fn test_failure_degrades_and_raises() {
        let health = SyncHealth::new(SyncMode::Cloud);
        health.observe(&SyncReport::Completed {
            synced: 1,
            failed: vec![SyncFailure {
                target: SyncTarget::Profile,
                error: RemoteError::Unavailable("timeout".to_string()),
            }],
        });

        assert_eq!(health.mode(), SyncMode::Degraded);
        let advisory = health.advisory().unwrap();
        assert_eq!(advisory.message, WRITE_FAILED);
        assert!(advisory.detail.contains("1 of 2"));
        assert!(advisory.detail.contains("timeout"));

        health.dismiss();
        assert!(health.advisory().is_none());
        assert_eq!(health.mode(), SyncMode::Degraded);
    }
}
