use std::sync::Arc;

use async_trait::async_trait;
use failover_drill::generate_payload;
use failover_drill::ConsistencyVerifier;
use failover_drill::LifecycleError;
use failover_drill::Node;
use failover_drill::NodeClient;
use failover_drill::NodeLifecycle;
use failover_drill::PayloadReport;
use failover_drill::RejoinOutcome;
use failover_drill::SimulatedCluster;
use failover_drill::Statement;

use crate::common::drill_settings;
use crate::common::TestContext;

fn payload_settings() -> failover_drill::Settings {
    let mut settings = drill_settings();
    settings.workload.payload_check.enabled = true;
    settings
}

#[tokio::test(start_paused = true)]
async fn test_payload_survives_failover_byte_identical() {
    let ctx = TestContext::new(payload_settings());

    let report = ctx.controller().run_scenario().await.unwrap();

    let payload = report.payload.as_ref().expect("payload check ran");
    assert_eq!(payload.expected_len, 5000);
    assert_eq!(payload.results.len(), 3);
    assert!(payload.all_match());

    let lag = report.lag.as_ref().expect("lag measured");
    assert_eq!(lag.primary, "node1");
    assert_eq!(lag.entries.len(), 2);
    assert!(lag.all_replicated());
    assert!(report.is_consistent());
}

#[tokio::test(start_paused = true)]
async fn test_single_byte_corruption_fails_content_check() {
    let ctx = TestContext::new(payload_settings());
    let primary = ctx.directory.node_by_name("node1").unwrap().clone();
    ctx.cluster.execute(&primary, &Statement::ProvisionSchema).await.unwrap();

    let bytes = generate_payload(5000);
    let id = ctx
        .cluster
        .execute(
            &primary,
            &Statement::InsertPayload {
                payload: bytes.clone(),
            },
        )
        .await
        .unwrap()
        .last_insert_id
        .unwrap();

    let verifier = ConsistencyVerifier::new(ctx.cluster.clone(), ctx.directory.clone());
    assert!(verifier.check_payload(id, &bytes).await.all_match());

    assert!(ctx.cluster.corrupt_payload("node2", id, 2500));
    let check = verifier.check_payload(id, &bytes).await;

    assert!(!check.all_match());
    assert_eq!(check.results[0].report, PayloadReport::Match);
    assert_eq!(
        check.results[1].report,
        PayloadReport::Mismatch {
            first_difference: 2500,
            observed_len: 5000
        }
    );
    assert_eq!(check.results[2].report, PayloadReport::Match);
}

/// Damages the stored payload on one secondary while the primary is down.
struct CorruptingLifecycle {
    cluster: Arc<SimulatedCluster>,
}

#[async_trait]
impl NodeLifecycle for CorruptingLifecycle {
    async fn stop(
        &self,
        node: &Node,
    ) -> Result<(), LifecycleError> {
        self.cluster.stop(node).await?;
        self.cluster.corrupt_payload("node3", 1, 42);
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

#[tokio::test(start_paused = true)]
async fn test_corruption_during_run_is_reported() {
    let ctx = TestContext::new(payload_settings());
    let lifecycle = Arc::new(CorruptingLifecycle {
        cluster: ctx.cluster.clone(),
    });

    let report = ctx.controller_with(lifecycle).run_scenario().await.unwrap();

    // Row counts cannot see it
    assert!(report.consistency.is_consistent());
    let payload = report.payload.as_ref().unwrap();
    let node3 = payload.results.iter().find(|r| r.node == "node3").unwrap();
    assert_eq!(
        node3.report,
        PayloadReport::Mismatch {
            first_difference: 42,
            observed_len: 5000
        }
    );
    assert!(!report.is_consistent());
}
