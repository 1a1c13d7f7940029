//! NutriSync State Synchronization
//!
//! This crate owns the canonical application state and keeps it in step
//! with a local durable cache and an optional remote upsert service.

mod cache;
mod error;
mod health;
mod reconcile;
pub mod remote;
mod stats;
mod store;
mod worker;

pub use cache::{FileCache, LocalCache};
pub use error::{CacheError, RemoteError, StoreError};
pub use health::{SyncAdvisory, SyncMode};
pub use reconcile::{
    CacheOutcome, LoadReport, Reconciler, StateSource, SyncFailure, SyncReport, SyncTarget,
};
pub use remote::{MemoryRemote, PostgrestRemote, RemoteStore};
pub use stats::{SyncStats, SyncStatsSnapshot};
pub use store::{StateStore, StoreStatus, WriteReceipt};
pub use worker::SyncTicket;
