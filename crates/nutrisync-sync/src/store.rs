//! Canonical in-memory state and its mutation entry points.
//!
//! Every mutation computes the next state from a copy, swaps it in, writes
//! the whole snapshot to the local cache and then hands the changed records
//! to the sync worker. The in-memory result is visible before any remote
//! call finishes.

use chrono::NaiveDate;
use nutrisync_core::log::{append_exercise, append_food, find_log_for_date, merge_logs};
use nutrisync_core::{
    AppState, Clock, DailyLog, DailyReport, ExerciseEntry, FoodEntry, NewExercise, NewFood,
    Profile,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::health::{SyncAdvisory, SyncHealth, SyncMode, CACHE_FAILED, LOAD_FAILED};
use crate::reconcile::{CacheOutcome, LoadReport, Reconciler, SyncReport};
use crate::stats::SyncStatsSnapshot;
use crate::worker::{SyncJob, SyncTicket, SyncWorker};
use crate::StoreError;

enum Phase {
    Loading,
    Ready(AppState),
}

/// Whether the first load has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Loading,
    Ready,
}

/// Result of a mutation.
///
/// `applied` and `cache` are final when the receipt is returned; `sync`
/// resolves once the remote writes have been attempted.
#[derive(Debug)]
pub struct WriteReceipt {
    pub applied: AppState,
    pub cache: CacheOutcome,
    pub sync: SyncTicket,
}

/// Owner of the application state.
pub struct StateStore {
    reconciler: Arc<Reconciler>,
    clock: Arc<dyn Clock>,
    /// Serializes loads and mutations
    gate: Mutex<()>,
    phase: RwLock<Phase>,
    health: Arc<SyncHealth>,
    worker: SyncWorker,
}

impl StateStore {
    /// Create a store in the loading phase. Must be called inside a tokio
    /// runtime; the sync worker is spawned here.
    pub fn new(reconciler: Reconciler, clock: Arc<dyn Clock>) -> Self {
        let mode = if reconciler.has_remote() {
            SyncMode::Cloud
        } else {
            SyncMode::LocalOnly
        };
        let reconciler = Arc::new(reconciler);
        let health = Arc::new(SyncHealth::new(mode));
        let worker = SyncWorker::spawn(reconciler.clone(), health.clone());

        Self {
            reconciler,
            clock,
            gate: Mutex::new(()),
            phase: RwLock::new(Phase::Loading),
            health,
            worker,
        }
    }

    /// Build the state from remote and cache and become ready.
    pub async fn load(&self) -> Result<LoadReport, StoreError> {
        let _guard = self.gate.lock().await;
        Ok(self.load_locked().await)
    }

    async fn load_locked(&self) -> LoadReport {
        let report = self.reconciler.load_state().await;

        *self.phase.write() = Phase::Ready(report.state.clone());

        match (&report.failure, self.reconciler.has_remote()) {
            (Some(reason), _) => {
                self.health.raise(SyncAdvisory::new(LOAD_FAILED, reason.clone()));
                self.health.set_mode(SyncMode::Degraded);
            }
            (None, true) => {
                self.health.dismiss();
                self.health.set_mode(SyncMode::Cloud);
            }
            (None, false) => self.health.set_mode(SyncMode::LocalOnly),
        }

        self.write_cache(&report.state).await;

        info!(
            source = ?report.source,
            logs = report.state.logs.len(),
            mode = %self.health.mode(),
            "State loaded"
        );

        report
    }

    /// Replace the profile.
    pub async fn update_profile(&self, profile: Profile) -> Result<WriteReceipt, StoreError> {
        profile.validate()?;

        let _guard = self.gate.lock().await;
        let current = self.current()?;
        let next = AppState::new(profile.clone(), current.logs);

        debug!(name = %profile.name, "Updating profile");
        Ok(self.commit(next, SyncJob::Profile(profile)).await)
    }

    /// Upsert logs by date. Dates not in `logs` are untouched.
    pub async fn update_logs(&self, logs: Vec<DailyLog>) -> Result<WriteReceipt, StoreError> {
        let _guard = self.gate.lock().await;
        let current = self.current()?;
        Ok(self.commit_logs(&current, logs).await)
    }

    /// Append a food entry to today's log.
    pub async fn add_food_today(&self, food: NewFood) -> Result<WriteReceipt, StoreError> {
        let _guard = self.gate.lock().await;
        let current = self.current()?;
        let today = self.clock.today();

        let entry = FoodEntry::record(food, self.clock.as_ref());
        debug!(date = %today, food = %entry.name, calories = entry.calories, "Adding food");

        let updated = append_food(find_log_for_date(&current, today), today, entry);
        Ok(self.commit_logs(&current, vec![updated]).await)
    }

    /// Append an exercise session to today's log.
    pub async fn add_exercise_today(
        &self,
        exercise: NewExercise,
    ) -> Result<WriteReceipt, StoreError> {
        let _guard = self.gate.lock().await;
        let current = self.current()?;
        let today = self.clock.today();

        let entry = ExerciseEntry::record(exercise, self.clock.as_ref());
        debug!(date = %today, kind = %entry.kind, "Adding exercise");

        let updated = append_exercise(find_log_for_date(&current, today), today, entry);
        Ok(self.commit_logs(&current, vec![updated]).await)
    }

    /// Set the day's water intake in millilitres.
    pub async fn set_hydration(
        &self,
        date: NaiveDate,
        ml: f64,
    ) -> Result<WriteReceipt, StoreError> {
        self.edit_log(date, |log| log.with_hydration(ml)).await
    }

    /// Add `ml` to the day's water intake.
    pub async fn add_hydration(
        &self,
        date: NaiveDate,
        ml: f64,
    ) -> Result<WriteReceipt, StoreError> {
        self.edit_log(date, |log| log.add_hydration(ml)).await
    }

    pub async fn set_sleep_hours(
        &self,
        date: NaiveDate,
        hours: f64,
    ) -> Result<WriteReceipt, StoreError> {
        self.edit_log(date, |log| log.with_sleep_hours(hours)).await
    }

    pub async fn set_sedentary_hours(
        &self,
        date: NaiveDate,
        hours: f64,
    ) -> Result<WriteReceipt, StoreError> {
        self.edit_log(date, |log| log.with_sedentary_hours(hours)).await
    }

    async fn edit_log<F>(&self, date: NaiveDate, edit: F) -> Result<WriteReceipt, StoreError>
    where
        F: FnOnce(&DailyLog) -> DailyLog,
    {
        let _guard = self.gate.lock().await;
        let current = self.current()?;

        let updated = match find_log_for_date(&current, date) {
            Some(log) => edit(log),
            None => edit(&DailyLog::empty(date)),
        };
        Ok(self.commit_logs(&current, vec![updated]).await)
    }

    /// Wait for queued remote writes, then reload.
    ///
    /// A successful reload from the remote leaves degraded mode; the remote
    /// copy replaces whatever was applied locally while degraded.
    ///
    /// The gate is held across the drain so no mutation can queue a write
    /// that the reload would miss.
    pub async fn retry_sync(&self) -> Result<LoadReport, StoreError> {
        let _guard = self.gate.lock().await;
        self.worker.flush().await?;

        info!("Retrying sync");
        Ok(self.load_locked().await)
    }

    /// Current state, or `None` before the first load.
    pub fn snapshot(&self) -> Option<AppState> {
        match &*self.phase.read() {
            Phase::Ready(state) => Some(state.clone()),
            Phase::Loading => None,
        }
    }

    pub fn status(&self) -> StoreStatus {
        match &*self.phase.read() {
            Phase::Ready(_) => StoreStatus::Ready,
            Phase::Loading => StoreStatus::Loading,
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.health.mode()
    }

    /// Metrics for today's log (empty if nothing was logged yet).
    pub fn today_report(&self) -> Option<DailyReport> {
        let today = self.clock.today();
        let state = self.snapshot()?;
        let report = match find_log_for_date(&state, today) {
            Some(log) => DailyReport::build(&state.profile, log),
            None => DailyReport::build(&state.profile, &DailyLog::empty(today)),
        };
        Some(report)
    }

    pub fn advisory(&self) -> Option<SyncAdvisory> {
        self.health.advisory()
    }

    pub fn dismiss_advisory(&self) {
        self.health.dismiss();
    }

    pub fn stats(&self) -> SyncStatsSnapshot {
        self.reconciler.stats().snapshot()
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    fn current(&self) -> Result<AppState, StoreError> {
        match &*self.phase.read() {
            Phase::Ready(state) => Ok(state.clone()),
            Phase::Loading => Err(StoreError::NotReady),
        }
    }

    async fn commit_logs(&self, current: &AppState, logs: Vec<DailyLog>) -> WriteReceipt {
        let next = merge_logs(current, &logs);
        self.commit(next, SyncJob::Logs(logs)).await
    }

    /// Swap in `next`, write the cache and queue the remote writes.
    /// Caller holds the gate.
    async fn commit(&self, next: AppState, job: SyncJob) -> WriteReceipt {
        *self.phase.write() = Phase::Ready(next.clone());

        let cache = self.write_cache(&next).await;
        let sync = self.dispatch(job);

        WriteReceipt {
            applied: next,
            cache,
            sync,
        }
    }

    async fn write_cache(&self, state: &AppState) -> CacheOutcome {
        let outcome = self.reconciler.cache_snapshot(state).await;
        if let CacheOutcome::Failed(reason) = &outcome {
            self.health.raise(SyncAdvisory::new(CACHE_FAILED, reason.clone()));
        }
        outcome
    }

    fn dispatch(&self, job: SyncJob) -> SyncTicket {
        match self.health.mode() {
            SyncMode::LocalOnly => SyncTicket::ready(SyncReport::LocalOnly),
            SyncMode::Degraded => {
                let count = job.record_count();
                self.reconciler.stats().record_skipped(count);
                debug!(count, "Remote writes suspended, kept locally");
                SyncTicket::ready(SyncReport::Skipped)
            }
            SyncMode::Cloud => self.worker.submit(job).unwrap_or_else(|e| {
                warn!(error = %e, "Could not queue remote write");
                self.health.set_mode(SyncMode::Degraded);
                SyncTicket::ready(SyncReport::Skipped)
            }),
        }
    }
}
