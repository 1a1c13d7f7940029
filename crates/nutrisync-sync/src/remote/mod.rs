//! Remote upsert service contract.
//!
//! Two collections: profiles keyed by identity, and daily logs keyed by
//! `(identity, date)`. Writes are insert-or-overwrite and never duplicate.

mod memory;
mod postgrest;

pub use memory::MemoryRemote;
pub use postgrest::PostgrestRemote;

use async_trait::async_trait;
use nutrisync_core::{DailyLog, Profile, ProfileId};

use crate::RemoteError;

/// A key/value upsert service holding the authoritative copy of the state.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Select the profile for `id`. Absence is [`RemoteError::NotFound`].
    async fn fetch_profile(&self, id: ProfileId) -> Result<Profile, RemoteError>;

    /// Select every daily log belonging to `id`.
    async fn fetch_logs(&self, id: ProfileId) -> Result<Vec<DailyLog>, RemoteError>;

    /// Insert or overwrite the profile for `id`.
    async fn upsert_profile(&self, id: ProfileId, profile: &Profile) -> Result<(), RemoteError>;

    /// Insert or overwrite the log for `(id, log.date)`.
    async fn upsert_log(&self, id: ProfileId, log: &DailyLog) -> Result<(), RemoteError>;
}
