use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio::time::Instant;
use tracing::error;
use tracing::info;
use tracing::info_span;
use tracing::warn;
use tracing::Instrument;

use super::ElectionOutcome;
use super::ElectionPoll;
use super::FinalReport;
use super::PollOutcome;
use super::ScenarioState;
use super::StateTracker;
use crate::generate_payload;
use crate::utils::async_task::task_with_timeout_and_backoff;
use crate::utils::time::format_secs;
use crate::ClusterDirectory;
use crate::ConsistencyVerifier;
use crate::LagReport;
use crate::Node;
use crate::NodeClient;
use crate::NodeLifecycle;
use crate::PrimaryResolver;
use crate::RejoinOutcome;
use crate::Result;
use crate::ScenarioError;
use crate::Settings;
use crate::Statement;
use crate::Table;
use crate::TopologyProber;
use crate::WorkloadDriver;
use crate::WorkloadEvent;

/// Payload written at baseline for the byte-level check.
struct PayloadProbe {
    id: u64,
    bytes: Vec<u8>,
    lag: LagReport,
}

/// Drives one failover scenario against a cluster.
pub struct FailoverController {
    settings: Settings,
    client: Arc<dyn NodeClient>,
    lifecycle: Arc<dyn NodeLifecycle>,
    resolver: PrimaryResolver,
    verifier: ConsistencyVerifier,
    tracker: StateTracker,
}

impl FailoverController {
    pub fn new(
        settings: Settings,
        directory: Arc<ClusterDirectory>,
        client: Arc<dyn NodeClient>,
        lifecycle: Arc<dyn NodeLifecycle>,
    ) -> Self {
        let prober = TopologyProber::new(client.clone(), directory.clone());
        let resolver = PrimaryResolver::new(prober, settings.retry.primary_resolution);
        let verifier = ConsistencyVerifier::new(client.clone(), directory);
        Self {
            settings,
            client,
            lifecycle,
            resolver,
            verifier,
            tracker: StateTracker::new(),
        }
    }

    pub fn state(&self) -> ScenarioState {
        self.tracker.current()
    }

    pub fn path(&self) -> &[ScenarioState] {
        self.tracker.path()
    }

    /// Runs the whole scenario once. Every call starts again from `Idle`,
    /// so one controller can drive several runs back to back.
    ///
    /// Errors only when no primary exists at baseline or the workload
    /// schema cannot be provisioned; every later failure ends up in the
    /// returned report.
    pub async fn run_scenario(&mut self) -> Result<FinalReport> {
        let run_id = nanoid::nanoid!(10);
        let span = info_span!("scenario", run_id = %run_id);
        self.execute(run_id).instrument(span).await
    }

    async fn execute(
        &mut self,
        run_id: String,
    ) -> Result<FinalReport> {
        let scenario = self.settings.scenario.clone();
        self.tracker = StateTracker::new();

        // Baseline
        self.log_topology("baseline").await;
        let baseline = self
            .resolver
            .resolve_primary()
            .await
            .ok_or(ScenarioError::NoBaselinePrimary)?;
        info!(primary = %baseline, "baseline primary");
        self.tracker.transition(ScenarioState::BaselineChecked)?;

        // Workload
        self.provision_schema(&baseline).await?;
        let payload = self.write_payload_probe(&baseline).await;

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let workload = WorkloadDriver::new(
            self.resolver.clone(),
            self.client.clone(),
            self.settings.workload.clone(),
        )
        .with_events(events_tx)
        .spawn();
        self.tracker.transition(ScenarioState::WorkloadRunning)?;

        info!(warmup = %format_secs(scenario.warmup()), "warming up");
        sleep(scenario.warmup()).await;
        let progress = workload.progress();
        info!(
            total = progress.total_attempts,
            successful = progress.successful_inserts,
            "steady state reached"
        );

        // Failure
        let injected_at = Instant::now();
        match self.lifecycle.stop(&baseline).await {
            Ok(()) => warn!(node = %baseline.name, "primary stopped"),
            Err(e) => error!(node = %baseline.name, error = %e, "failed to stop primary"),
        }
        self.tracker.transition(ScenarioState::FailureInjected)?;

        // Election
        sleep(scenario.pre_election_settle()).await;
        self.tracker.transition(ScenarioState::ElectionPending)?;
        let (election, polls) = self.await_election(&baseline).await;
        if election.is_confirmed() {
            self.tracker.transition(ScenarioState::NewPrimaryConfirmed)?;
        } else {
            error!(
                max_wait = %format_secs(scenario.election_max_wait()),
                "no primary elected, continuing with cleanup"
            );
            self.tracker.transition(ScenarioState::TimedOut)?;
        }

        sleep(scenario.post_election_settle()).await;
        self.log_topology("after failover").await;
        info!(
            duration = %format_secs(scenario.post_failover_workload()),
            "workload continues on the new topology"
        );
        sleep(scenario.post_failover_workload()).await;

        // Recovery
        self.tracker.transition(ScenarioState::Recovering)?;
        let rejoin = self.recover(&baseline).await;
        self.log_topology("after recovery").await;

        // Settle
        let stats = workload.stop(scenario.stop_grace()).await;
        self.tracker.transition(ScenarioState::Settled)?;

        let mut detection_delay = None;
        while let Ok(event) = events_rx.try_recv() {
            if let WorkloadEvent::FailoverDetected { at } = event {
                detection_delay = Some(at.saturating_duration_since(injected_at));
            }
        }

        info!(
            total = stats.total_attempts,
            successful = stats.successful_inserts,
            failed = stats.failed_inserts,
            success_rate = ?stats.success_rate(),
            failover = ?stats.failover_duration().map(format_secs),
            lost = stats.lost_writes(),
            "workload statistics"
        );
        self.tracker.transition(ScenarioState::Reported)?;

        // Verification
        info!(settle = %format_secs(scenario.consistency_settle()), "waiting for replication to drain");
        sleep(scenario.consistency_settle()).await;
        let consistency = self.verifier.check_row_counts(Table::Transactions).await;
        let (payload, lag) = match payload {
            Some(probe) => (
                Some(self.verifier.check_payload(probe.id, &probe.bytes).await),
                Some(probe.lag),
            ),
            None => (None, None),
        };
        let final_primary = self.resolver.resolve_primary().await.map(|n| n.name);
        if final_primary.is_none() {
            warn!("no primary at the end of the run");
        }
        self.tracker.transition(ScenarioState::Done)?;

        let report = FinalReport {
            run_id,
            baseline_primary: baseline.name,
            election,
            polls,
            final_primary,
            rejoin,
            detection_delay,
            workload: stats,
            consistency,
            payload,
            lag,
            path: self.tracker.path().to_vec(),
        };
        info!(consistent = report.is_consistent(), "scenario finished");
        Ok(report)
    }

    /// Drop-and-recreate on the baseline primary, with bounded retry.
    async fn provision_schema(
        &self,
        primary: &Node,
    ) -> Result<()> {
        let statement = Statement::ProvisionSchema;
        task_with_timeout_and_backoff(
            || self.client.execute(primary, &statement),
            self.settings.retry.schema,
        )
        .await
        .map_err(|e| ScenarioError::SchemaProvisioning {
            node: primary.name.clone(),
            reason: e.to_string(),
        })?;
        info!(node = %primary.name, "workload schema provisioned");
        Ok(())
    }

    /// Writes the random payload and measures how long each secondary takes
    /// to see it. A failed write only disables the payload check.
    async fn write_payload_probe(
        &self,
        primary: &Node,
    ) -> Option<PayloadProbe> {
        let config = &self.settings.workload.payload_check;
        if !config.enabled {
            return None;
        }

        let bytes = generate_payload(config.size_bytes);
        let written = self
            .client
            .execute(
                primary,
                &Statement::InsertPayload {
                    payload: bytes.clone(),
                },
            )
            .await;
        let written_at = Instant::now();

        let id = match written {
            Ok(outcome) => outcome.last_insert_id,
            Err(e) => {
                warn!(node = %primary.name, error = %e, "payload write failed, skipping payload check");
                return None;
            }
        };
        let Some(id) = id else {
            warn!(node = %primary.name, "payload write returned no id, skipping payload check");
            return None;
        };
        info!(id, size = bytes.len(), "payload written");

        let lag = self
            .verifier
            .measure_replication_lag(primary, id, written_at, config.lag_timeout(), config.lag_poll_interval())
            .await;
        Some(PayloadProbe { id, bytes, lag })
    }

    /// Polls for a primary other than `stopped` until the max wait passes,
    /// then makes one last attempt.
    async fn await_election(
        &self,
        stopped: &Node,
    ) -> (ElectionOutcome, Vec<ElectionPoll>) {
        let scenario = &self.settings.scenario;
        let started = Instant::now();
        let mut polls = Vec::new();

        while started.elapsed() < scenario.election_max_wait() {
            let outcome = match self.resolver.resolve_primary().await {
                None => PollOutcome::NoPrimary,
                Some(p) if p.name == stopped.name => PollOutcome::SamePrimary(p.name),
                Some(p) => PollOutcome::NewPrimary(p.name),
            };
            let elapsed = started.elapsed();
            info!(elapsed = %format_secs(elapsed), %outcome, "election poll");
            polls.push(ElectionPoll {
                elapsed,
                outcome: outcome.clone(),
            });

            if let PollOutcome::NewPrimary(name) = outcome {
                info!(primary = %name, after = %format_secs(elapsed), "new primary elected");
                return (ElectionOutcome::Elected(name), polls);
            }
            sleep(scenario.election_poll_interval()).await;
        }

        let final_attempt = self.resolver.resolve_primary().await;
        let elapsed = started.elapsed();
        match final_attempt {
            Some(p) => {
                warn!(primary = %p.name, "primary found only after the election wait expired");
                let outcome = if p.name == stopped.name {
                    PollOutcome::SamePrimary(p.name.clone())
                } else {
                    PollOutcome::NewPrimary(p.name.clone())
                };
                polls.push(ElectionPoll { elapsed, outcome });
                (ElectionOutcome::Stale(p.name), polls)
            }
            None => {
                polls.push(ElectionPoll {
                    elapsed,
                    outcome: PollOutcome::NoPrimary,
                });
                (ElectionOutcome::NoPrimary, polls)
            }
        }
    }

    /// Restarts the stopped node and brings it back into the group.
    async fn recover(
        &self,
        node: &Node,
    ) -> std::result::Result<RejoinOutcome, String> {
        let scenario = &self.settings.scenario;

        if let Err(e) = self.lifecycle.start(node).await {
            error!(node = %node.name, error = %e, "failed to start node");
        }
        info!(node = %node.name, wait = %format_secs(scenario.startup_wait()), "waiting for node startup");
        sleep(scenario.startup_wait()).await;

        let rejoin = match self.lifecycle.rejoin(node).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(node = %node.name, error = %e, "rejoin failed");
                Err(e.to_string())
            }
        };

        sleep(scenario.rejoin_wait()).await;
        rejoin
    }

    /// Status display: every node's view of the group.
    async fn log_topology(
        &self,
        label: &str,
    ) {
        for probe in self.resolver.prober().probe_all().await {
            match probe.result {
                Ok(snapshot) => {
                    for m in &snapshot.members {
                        info!(
                            phase = label,
                            source = %probe.node,
                            member = %m.host,
                            port = m.port,
                            state = %m.state,
                            role = %m.role,
                            "member"
                        );
                    }
                }
                Err(e) => warn!(phase = label, node = %probe.node, kind = %e.kind(), "node unavailable"),
            }
        }
    }
}
