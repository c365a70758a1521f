use std::sync::Arc;

use async_trait::async_trait;
use failover_drill::ClusterDirectory;
use failover_drill::FailoverController;
use failover_drill::LifecycleError;
use failover_drill::Node;
use failover_drill::NodeLifecycle;
use failover_drill::RejoinOutcome;
use failover_drill::Settings;
use failover_drill::SimulatedCluster;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
}

/// Default three-node registry with shortened scenario timings.
pub fn drill_settings() -> Settings {
    let mut settings = Settings::default();
    let s = &mut settings.scenario;
    s.warmup_secs = 5;
    s.pre_election_settle_secs = 1;
    s.election_poll_interval_ms = 1000;
    s.election_max_wait_secs = 20;
    s.post_election_settle_secs = 1;
    s.post_failover_workload_secs = 5;
    s.startup_wait_secs = 2;
    s.rejoin_wait_secs = 3;
    s.consistency_settle_secs = 2;
    settings
}

pub struct TestContext {
    pub directory: Arc<ClusterDirectory>,
    pub cluster: Arc<SimulatedCluster>,
    pub settings: Settings,
}

impl TestContext {
    pub fn new(settings: Settings) -> Self {
        enable_logger();
        let directory = Arc::new(ClusterDirectory::from_config(&settings.cluster));
        let cluster = SimulatedCluster::shared(&directory, &settings.simulation);
        Self {
            directory,
            cluster,
            settings,
        }
    }

    pub fn controller(&self) -> FailoverController {
        self.controller_with(self.cluster.clone())
    }

    pub fn controller_with(
        &self,
        lifecycle: Arc<dyn NodeLifecycle>,
    ) -> FailoverController {
        FailoverController::new(
            self.settings.clone(),
            self.directory.clone(),
            self.cluster.clone(),
            lifecycle,
        )
    }
}

/// Lifecycle whose stop takes the whole cluster off the network for good,
/// so no member can ever be asked for a primary again.
pub struct BlackoutLifecycle {
    pub cluster: Arc<SimulatedCluster>,
    pub directory: Arc<ClusterDirectory>,
}

impl BlackoutLifecycle {
    fn black_out(&self) {
        for n in self.directory.list_nodes() {
            self.cluster.set_unreachable(&n.name, true);
        }
    }
}

#[async_trait]
impl NodeLifecycle for BlackoutLifecycle {
    async fn stop(
        &self,
        node: &Node,
    ) -> Result<(), LifecycleError> {
        self.cluster.stop(node).await?;
        self.black_out();
        Ok(())
    }

    async fn start(
        &self,
        node: &Node,
    ) -> Result<(), LifecycleError> {
        self.cluster.start(node).await
    }

    async fn rejoin(
        &self,
        node: &Node,
    ) -> Result<RejoinOutcome, LifecycleError> {
        self.cluster.rejoin(node).await
    }
}
