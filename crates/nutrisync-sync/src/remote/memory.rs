//! In-process remote store.
//!
//! Keeps both collections in maps keyed exactly like the hosted tables and
//! can be told to fail, which makes it the stand-in for the hosted service in
//! tests and in `--remote memory` runs.

use async_trait::async_trait;
use chrono::NaiveDate;
use nutrisync_core::{DailyLog, Profile, ProfileId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::RemoteStore;
use crate::RemoteError;

#[derive(Default)]
struct Tables {
    profiles: HashMap<ProfileId, Profile>,
    daily_logs: BTreeMap<(ProfileId, NaiveDate), DailyLog>,
}

/// Remote store backed by process memory.
#[derive(Default)]
pub struct MemoryRemote {
    tables: RwLock<Tables>,
    offline: AtomicBool,
    failing_dates: RwLock<HashSet<NaiveDate>>,
    upserts: AtomicU64,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with [`RemoteError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make log upserts for `date` fail.
    pub fn fail_date(&self, date: NaiveDate) {
        self.failing_dates.write().insert(date);
    }

    /// Number of successful upserts of either kind.
    pub fn upsert_count(&self) -> u64 {
        self.upserts.load(Ordering::SeqCst)
    }

    /// Number of log rows stored for `id`.
    pub fn log_rows(&self, id: ProfileId) -> usize {
        self.tables
            .read()
            .daily_logs
            .keys()
            .filter(|(owner, _)| *owner == id)
            .count()
    }

    pub fn stored_log(&self, id: ProfileId, date: NaiveDate) -> Option<DailyLog> {
        self.tables.read().daily_logs.get(&(id, date)).cloned()
    }

    pub fn stored_profile(&self, id: ProfileId) -> Option<Profile> {
        self.tables.read().profiles.get(&id).cloned()
    }

    fn check_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("remote is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch_profile(&self, id: ProfileId) -> Result<Profile, RemoteError> {
        self.check_online()?;
        self.tables
            .read()
            .profiles
            .get(&id)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    async fn fetch_logs(&self, id: ProfileId) -> Result<Vec<DailyLog>, RemoteError> {
        self.check_online()?;
        Ok(self
            .tables
            .read()
            .daily_logs
            .iter()
            .filter(|((owner, _), _)| *owner == id)
            .map(|(_, log)| log.clone())
            .collect())
    }

    async fn upsert_profile(&self, id: ProfileId, profile: &Profile) -> Result<(), RemoteError> {
        self.check_online()?;
        self.tables.write().profiles.insert(id, profile.clone());
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn upsert_log(&self, id: ProfileId, log: &DailyLog) -> Result<(), RemoteError> {
        self.check_online()?;
        if self.failing_dates.read().contains(&log.date) {
            return Err(RemoteError::Http {
                status: 503,
                message: format!("write rejected for {}", log.date),
            });
        }
        self.tables
            .write()
            .daily_logs
            .insert((id, log.date), log.clone());
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
