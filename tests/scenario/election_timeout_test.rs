use std::sync::Arc;

use failover_drill::ElectionOutcome;
use failover_drill::PollOutcome;
use failover_drill::ScenarioState;

use crate::common::drill_settings;
use crate::common::BlackoutLifecycle;
use crate::common::TestContext;

/// Stopping the primary takes every member off the network: no election
/// can be observed, yet the run still completes and reports.
#[tokio::test(start_paused = true)]
async fn test_election_timeout_still_reaches_done() {
    let ctx = TestContext::new(drill_settings());
    let lifecycle = Arc::new(BlackoutLifecycle {
        cluster: ctx.cluster.clone(),
        directory: ctx.directory.clone(),
    });

    let mut controller = ctx.controller_with(lifecycle);
    let report = controller.run_scenario().await.unwrap();

    assert_eq!(report.election, ElectionOutcome::NoPrimary);
    assert!(report.polls.len() > 1);
    assert!(report.polls.iter().all(|p| p.outcome == PollOutcome::NoPrimary));
    assert!(report.visited(ScenarioState::TimedOut));
    assert!(!report.visited(ScenarioState::NewPrimaryConfirmed));
    assert!(report.visited(ScenarioState::Reported));
    assert_eq!(controller.state(), ScenarioState::Done);

    assert_eq!(report.final_primary, None);
    assert!(report.rejoin.is_err());
    assert!(!report.consistency.is_consistent());
    assert_eq!(report.consistency.unavailable_nodes().len(), 3);

    // The gap opened and never closed
    let w = &report.workload;
    assert!(w.window.detected_at.is_some());
    assert_eq!(report.failover_duration(), None);
    assert_eq!(w.successful_inserts + w.failed_inserts, w.total_attempts);
    assert!(report.success_rate().unwrap() < 100.0);
    assert!(report.to_string().contains("NO PRIMARY ELECTED"));

    assert_eq!(ctx.cluster.open_connections(), 0);
}
