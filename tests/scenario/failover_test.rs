use std::time::Duration;

use failover_drill::ConsistencyVerifier;
use failover_drill::ElectionOutcome;
use failover_drill::PrimaryResolver;
use failover_drill::RejoinOutcome;
use failover_drill::ScenarioState;
use failover_drill::Table;
use failover_drill::TopologyProber;
use failover_drill::WorkloadDriver;

use crate::common::drill_settings;
use crate::common::TestContext;

/// Three members, node1 primary: stop it, let the group elect, bring it
/// back and check every member holds the same rows.
#[tokio::test(start_paused = true)]
async fn test_3_node_failover() {
    let ctx = TestContext::new(drill_settings());
    let max_wait = ctx.settings.scenario.election_max_wait();

    let report = ctx.controller().run_scenario().await.unwrap();

    assert_eq!(report.baseline_primary, "node1");
    match &report.election {
        ElectionOutcome::Elected(name) => assert_ne!(name, "node1"),
        other => panic!("expected an election, got {other:?}"),
    }
    assert!(report.visited(ScenarioState::NewPrimaryConfirmed));
    assert_eq!(report.path.last(), Some(&ScenarioState::Done));

    let window = report.failover_duration().expect("failover window recorded");
    assert!(window > Duration::ZERO);
    assert!(window < max_wait);
    assert!(report.detection_delay.is_some());

    let w = &report.workload;
    assert_eq!(w.successful_inserts + w.failed_inserts, w.total_attempts);
    assert!(w.errors.get("no_primary").copied().unwrap_or_default() >= 1);
    assert!(report.success_rate().unwrap() > 50.0);

    assert_eq!(report.rejoin, Ok(RejoinOutcome::Joined));
    assert!(report.consistency.is_consistent());
    assert_eq!(report.consistency.counts.len(), 3);
    // Every acknowledged write is on every member
    assert_eq!(report.consistency.count_of("node1"), Some(w.successful_inserts));
    assert!(report.is_consistent());

    assert_eq!(ctx.cluster.open_connections(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_verification_is_idempotent_after_failover() {
    let ctx = TestContext::new(drill_settings());
    ctx.controller().run_scenario().await.unwrap();

    let verifier = ConsistencyVerifier::new(ctx.cluster.clone(), ctx.directory.clone());
    let first = verifier.check_row_counts(Table::Transactions).await;
    let second = verifier.check_row_counts(Table::Transactions).await;

    assert_eq!(first, second);
    assert!(first.is_consistent());
}

#[tokio::test(start_paused = true)]
async fn test_auto_rejoined_member_counts_as_rejoined() {
    let mut settings = drill_settings();
    settings.simulation.auto_rejoin = true;
    let ctx = TestContext::new(settings);

    let report = ctx.controller().run_scenario().await.unwrap();

    assert_eq!(report.rejoin, Ok(RejoinOutcome::AlreadyJoined));
    assert!(report.is_consistent());
}

#[tokio::test(start_paused = true)]
async fn test_workload_stopped_before_first_attempt() {
    let ctx = TestContext::new(drill_settings());
    let resolver = PrimaryResolver::new(
        TopologyProber::new(ctx.cluster.clone(), ctx.directory.clone()),
        ctx.settings.retry.primary_resolution,
    );

    let handle = WorkloadDriver::new(resolver, ctx.cluster.clone(), ctx.settings.workload.clone()).spawn();
    let stats = handle.stop(Duration::from_secs(1)).await;

    assert_eq!(stats.total_attempts, 0);
    assert_eq!(stats.success_rate(), None);
    assert_eq!(stats.lost_writes(), 0);
}
