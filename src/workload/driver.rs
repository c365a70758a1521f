use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::StatsSnapshot;
use super::WorkloadStats;
use crate::utils::time::format_secs;
use crate::utils::time::get_now_as_millis;
use crate::NodeClient;
use crate::PrimaryResolver;
use crate::Statement;
use crate::TransactionRecord;
use crate::WorkloadConfig;

/// One-time signals emitted by the driver while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadEvent {
    /// First iteration that could not resolve any primary
    FailoverDetected { at: Instant },
    /// First later iteration that resolved a primary again
    FailoverCompleted { at: Instant, duration: Duration },
}

/// What a single loop iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    NoPrimary,
    Written { primary: String },
    WriteFailed { primary: String, kind: String },
}

/// Background write generator.
///
/// The driver is the only writer of its [`WorkloadStats`]. Each iteration
/// resolves the primary, writes one transaction to it and sleeps one
/// interval. Cancellation is checked between iterations and raced against
/// the sleep, never against an in-flight write.
pub struct WorkloadDriver {
    resolver: PrimaryResolver,
    client: Arc<dyn NodeClient>,
    config: WorkloadConfig,
    stats: Arc<WorkloadStats>,
    events: Option<mpsc::UnboundedSender<WorkloadEvent>>,
    attempt: u64,
}

impl WorkloadDriver {
    pub fn new(
        resolver: PrimaryResolver,
        client: Arc<dyn NodeClient>,
        config: WorkloadConfig,
    ) -> Self {
        Self {
            resolver,
            client,
            config,
            stats: Arc::new(WorkloadStats::new()),
            events: None,
            attempt: 0,
        }
    }

    pub fn with_events(
        mut self,
        events: mpsc::UnboundedSender<WorkloadEvent>,
    ) -> Self {
        self.events = Some(events);
        self
    }

    pub fn stats(&self) -> Arc<WorkloadStats> {
        self.stats.clone()
    }

    /// Runs one iteration body, without the trailing sleep.
    pub async fn run_iteration(&mut self) -> IterationOutcome {
        self.attempt += 1;
        let attempt = self.attempt;

        let primary = match self.resolver.resolve_primary().await {
            Some(primary) => primary,
            None => {
                let now = Instant::now();
                if self.stats.record_no_primary(now) {
                    warn!(attempt, "failover detected: no primary resolvable");
                    self.emit(WorkloadEvent::FailoverDetected { at: now });
                } else {
                    debug!(attempt, "still no primary");
                }
                return IterationOutcome::NoPrimary;
            }
        };

        let now = Instant::now();
        if let Some(duration) = self.stats.record_primary_resolved(now) {
            info!(
                attempt,
                primary = %primary.name,
                duration = %format_secs(duration),
                "failover completed: writes accepted again"
            );
            self.emit(WorkloadEvent::FailoverCompleted { at: now, duration });
        }

        let record = TransactionRecord::for_attempt(attempt, get_now_as_millis());
        match self
            .client
            .execute(&primary, &Statement::InsertTransaction(record))
            .await
        {
            Ok(_) => {
                let progress = self.stats.record_success();
                if self.config.progress_every > 0 && progress.successful_inserts % self.config.progress_every == 0 {
                    info!(
                        primary = %primary.name,
                        successful = progress.successful_inserts,
                        total = progress.total_attempts,
                        "workload progress"
                    );
                }
                IterationOutcome::Written { primary: primary.name }
            }
            Err(e) => {
                let kind = e.classify();
                debug!(attempt, primary = %primary.name, error = %e, "write rejected");
                self.stats.record_failure(&kind);
                IterationOutcome::WriteFailed {
                    primary: primary.name,
                    kind,
                }
            }
        }
    }

    /// Loops until `cancel` fires.
    pub async fn run(
        mut self,
        cancel: CancellationToken,
    ) {
        let interval = self.config.interval();
        info!(?interval, "workload started");

        while !cancel.is_cancelled() {
            self.run_iteration().await;

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }

        let stats = self.stats.snapshot();
        info!(
            total = stats.total_attempts,
            successful = stats.successful_inserts,
            failed = stats.failed_inserts,
            "workload stopped"
        );
    }

    /// Starts the loop on the runtime and hands back its owner.
    pub fn spawn(self) -> WorkloadHandle {
        let cancel = CancellationToken::new();
        let stats = self.stats.clone();
        let join = tokio::spawn(self.run(cancel.clone()));
        WorkloadHandle {
            cancel,
            join: Some(join),
            stats,
        }
    }

    fn emit(
        &self,
        event: WorkloadEvent,
    ) {
        if let Some(tx) = &self.events {
            // Receiver gone only means nobody listens anymore
            let _ = tx.send(event);
        }
    }
}

/// Owner of a running [`WorkloadDriver`]. Dropping it cancels the loop.
pub struct WorkloadHandle {
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
    stats: Arc<WorkloadStats>,
}

impl WorkloadHandle {
    /// Progress view; may trail the in-flight iteration.
    pub fn progress(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |j| j.is_finished())
    }

    /// Signals cancellation and waits up to `grace` for the in-flight
    /// iteration to finish. A loop still busy after `grace` is aborted; its
    /// unfinished attempt is then not counted. The task is gone by the time
    /// the snapshot is taken.
    pub async fn stop(
        mut self,
        grace: Duration,
    ) -> StatsSnapshot {
        self.cancel.cancel();

        if let Some(mut join) = self.join.take() {
            match timeout(grace, &mut join).await {
                Ok(Ok(())) => debug!("workload joined"),
                Ok(Err(e)) => error!(error = %e, "workload task failed"),
                Err(_) => {
                    warn!(?grace, "workload did not stop within grace period, aborting");
                    join.abort();
                    // Wait for the aborted task to be dropped before reading stats
                    if let Err(e) = join.await {
                        if !e.is_cancelled() {
                            error!(error = %e, "workload task failed");
                        }
                    }
                }
            }
        }

        self.stats.snapshot()
    }
}

impl Drop for WorkloadHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
