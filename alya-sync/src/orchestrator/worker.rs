//! SyncWorker - background flush loop
//!
//! Listens for change notifications, debounces them, and runs the
//! scheduled flush on a fixed interval.

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::{FlushTrigger, SyncOrchestrator};

pub(super) struct SyncWorker {
    orchestrator: SyncOrchestrator,
    changes: mpsc::UnboundedReceiver<()>,
    shutdown: CancellationToken,
}

impl SyncWorker {
    pub(super) fn new(
        orchestrator: SyncOrchestrator,
        changes: mpsc::UnboundedReceiver<()>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            orchestrator,
            changes,
            shutdown,
        }
    }

    /// Run until shutdown
    ///
    /// 1. A change while connected (re)starts the debounce deadline
    /// 2. The deadline passing flushes once, with whatever state is current
    /// 3. The scheduled interval flushes independently (skipped when busy)
    /// 4. Shutdown flushes a still-pending debounced change, including one
    ///    still queued in the channel
    pub(super) async fn run(mut self) {
        let debounce = self.orchestrator.config().debounce;
        let mut scheduled = tokio::time::interval(self.orchestrator.config().scheduled_interval);
        scheduled.set_missed_tick_behavior(MissedTickBehavior::Delay);
        scheduled.tick().await; // skip immediate tick

        tracing::info!(
            debounce_ms = debounce.as_millis() as u64,
            scheduled_secs = self.orchestrator.config().scheduled_interval.as_secs(),
            "SyncWorker started"
        );

        let mut debounce_deadline: Option<Instant> = None;

        loop {
            let sleep_until =
                debounce_deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("SyncWorker shutting down");
                    // A change sent right before shutdown may still be queued
                    let mut pending = debounce_deadline.is_some();
                    while self.changes.try_recv().is_ok() {
                        pending |= self.orchestrator.mode().is_connected();
                    }
                    if pending {
                        self.orchestrator.flush(FlushTrigger::Shutdown).await;
                    }
                    break;
                }

                _ = tokio::time::sleep_until(sleep_until), if debounce_deadline.is_some() => {
                    debounce_deadline = None;
                    self.orchestrator.flush(FlushTrigger::Debounced).await;
                }

                _ = scheduled.tick() => {
                    if self.orchestrator.mode().is_connected() {
                        tracing::debug!("Scheduled flush");
                        self.orchestrator.flush(FlushTrigger::Scheduled).await;
                    }
                }

                change = self.changes.recv() => {
                    match change {
                        Some(()) if self.orchestrator.mode().is_connected() => {
                            debounce_deadline = Some(Instant::now() + debounce);
                        }
                        Some(()) => {}
                        None => {
                            tracing::info!("Change channel closed, SyncWorker stopping");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("SyncWorker stopped");
    }
}
