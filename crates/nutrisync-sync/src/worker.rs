//! Background task that sends remote writes one at a time.
//!
//! Jobs are processed strictly in submission order, so two writes to the
//! same daily log reach the remote in the order they were applied locally.

use nutrisync_core::{DailyLog, Profile};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::health::{SyncHealth, SyncMode};
use crate::reconcile::{Reconciler, SyncReport};
use crate::StoreError;

pub(crate) enum SyncJob {
    Profile(Profile),
    Logs(Vec<DailyLog>),
    /// Resolves once every earlier job has finished
    Flush,
}

impl SyncJob {
    pub fn record_count(&self) -> u64 {
        match self {
            SyncJob::Profile(_) => 1,
            SyncJob::Logs(logs) => logs.len() as u64,
            SyncJob::Flush => 0,
        }
    }
}

type Envelope = (SyncJob, oneshot::Sender<SyncReport>);

pub(crate) struct SyncWorker {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl SyncWorker {
    /// Start the worker on the current tokio runtime.
    pub fn spawn(reconciler: Arc<Reconciler>, health: Arc<SyncHealth>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::run(rx, reconciler, health));
        Self { tx }
    }

    pub fn submit(&self, job: SyncJob) -> Result<SyncTicket, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send((job, reply))
            .map_err(|_| StoreError::WorkerStopped)?;
        Ok(SyncTicket::pending(rx))
    }

    /// Wait until every job submitted so far has been processed.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.submit(SyncJob::Flush)?
            .wait()
            .await
            .map(|_| ())
            .ok_or(StoreError::WorkerStopped)
    }

    async fn run(
        mut rx: mpsc::UnboundedReceiver<Envelope>,
        reconciler: Arc<Reconciler>,
        health: Arc<SyncHealth>,
    ) {
        debug!("Sync worker started");

        while let Some((job, reply)) = rx.recv().await {
            let report = match job {
                SyncJob::Flush => SyncReport::Completed {
                    synced: 0,
                    failed: Vec::new(),
                },
                // Queued before the failure that degraded us
                ref job if health.mode() == SyncMode::Degraded => {
                    reconciler.stats().record_skipped(job.record_count());
                    SyncReport::Skipped
                }
                SyncJob::Profile(profile) => {
                    let report = reconciler.persist_profile(&profile).await;
                    health.observe(&report);
                    report
                }
                SyncJob::Logs(logs) => {
                    let report = reconciler.persist_logs(&logs).await;
                    health.observe(&report);
                    report
                }
            };

            // Receiver may have been dropped by a caller that didn't care
            let _ = reply.send(report);
        }

        info!("Sync worker stopped");
    }
}

enum TicketState {
    Ready(SyncReport),
    Pending(oneshot::Receiver<SyncReport>),
}

/// Handle to the remote half of a write.
///
/// The local half is already done when a ticket is handed out; awaiting
/// [`SyncTicket::outcome`] is optional.
pub struct SyncTicket {
    state: TicketState,
}

impl SyncTicket {
    pub(crate) fn ready(report: SyncReport) -> Self {
        Self {
            state: TicketState::Ready(report),
        }
    }

    fn pending(rx: oneshot::Receiver<SyncReport>) -> Self {
        Self {
            state: TicketState::Pending(rx),
        }
    }

    async fn wait(self) -> Option<SyncReport> {
        match self.state {
            TicketState::Ready(report) => Some(report),
            TicketState::Pending(rx) => rx.await.ok(),
        }
    }

    /// Wait for the remote writes to finish.
    ///
    /// Reports [`SyncReport::Skipped`] if the worker went away first.
    pub async fn outcome(self) -> SyncReport {
        self.wait().await.unwrap_or(SyncReport::Skipped)
    }
}

impl std::fmt::Debug for SyncTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            TicketState::Ready(report) => f.debug_tuple("SyncTicket").field(report).finish(),
            TicketState::Pending(_) => f.write_str("SyncTicket(pending)"),
        }
    }
}
