use std::time::Duration;

use tokio::time::sleep;

use crate::constants::ER_GROUP_REPLICATION_CONFIGURATION;
use crate::constants::ER_NO_SUCH_TABLE;
use crate::constants::ER_OPTION_PREVENTS_STATEMENT;
use crate::test_utils::node;
use crate::test_utils::test_directory;
use crate::LifecycleError;
use crate::MemberRole;
use crate::MemberState;
use crate::MemberStatus;
use crate::Node;
use crate::NodeClient;
use crate::NodeErrorKind;
use crate::NodeLifecycle;
use crate::RejoinOutcome;
use crate::SimulatedCluster;
use crate::SimulationConfig;
use crate::Statement;
use crate::Table;
use crate::TransactionRecord;

fn cluster() -> SimulatedCluster {
    SimulatedCluster::new(&test_directory(), &SimulationConfig::default())
}

async fn members(
    sim: &SimulatedCluster,
    from: &str,
) -> Vec<MemberStatus> {
    sim.query(&node(from), &Statement::GroupMembers)
        .await
        .unwrap()
        .iter()
        .map(|row| MemberStatus::from_row(from, row).unwrap())
        .collect()
}

async fn count(
    sim: &SimulatedCluster,
    on: &str,
) -> u64 {
    let rows = sim
        .query(
            &node(on),
            &Statement::CountRows {
                table: Table::Transactions,
            },
        )
        .await
        .unwrap();
    rows[0].get_u64("count").unwrap()
}

async fn insert(
    sim: &SimulatedCluster,
    on: &str,
    n: u64,
) -> crate::ClientResult<crate::ExecOutcome> {
    sim.execute(
        &node(on),
        &Statement::InsertTransaction(TransactionRecord::for_attempt(n, 0)),
    )
    .await
}

#[tokio::test(start_paused = true)]
async fn test_initial_group_has_first_node_primary() {
    let sim = cluster();

    let view = members(&sim, "node3").await;

    assert_eq!(view.len(), 3);
    assert!(view.iter().all(|m| m.state == MemberState::Online));
    assert_eq!(view.iter().filter(|m| m.is_primary()).count(), 1);
    assert_eq!(view[0].host, "node1");
    assert_eq!(view[0].role, MemberRole::Primary);
    assert_eq!(sim.primary().as_deref(), Some("node1"));
}

#[tokio::test(start_paused = true)]
async fn test_writes_need_schema_and_primary() {
    let sim = cluster();

    let e = insert(&sim, "node1", 1).await.unwrap_err();
    assert_eq!(e.code(), Some(ER_NO_SUCH_TABLE));

    let e = sim.execute(&node("node2"), &Statement::ProvisionSchema).await.unwrap_err();
    assert_eq!(e.code(), Some(ER_OPTION_PREVENTS_STATEMENT));

    sim.execute(&node("node1"), &Statement::ProvisionSchema).await.unwrap();

    let e = insert(&sim, "node2", 1).await.unwrap_err();
    assert_eq!(e.code(), Some(ER_OPTION_PREVENTS_STATEMENT));
    assert_eq!(e.classify(), "error_1290");

    let outcome = insert(&sim, "node1", 1).await.unwrap();
    assert_eq!(outcome.last_insert_id, Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_writes_replicate_to_every_member() {
    let sim = cluster();
    sim.execute(&node("node1"), &Statement::ProvisionSchema).await.unwrap();

    for n in 1..=5 {
        insert(&sim, "node1", n).await.unwrap();
    }

    for name in ["node1", "node2", "node3"] {
        assert_eq!(count(&sim, name).await, 5);
    }
}

#[tokio::test(start_paused = true)]
async fn test_primary_loss_and_election() {
    let sim = cluster();

    sim.stop(&node("node1")).await.unwrap();

    let e = sim.query(&node("node1"), &Statement::GroupMembers).await.unwrap_err();
    assert_eq!(e.kind(), NodeErrorKind::ConnectFailed);

    let view = members(&sim, "node2").await;
    assert!(view.iter().all(|m| !m.is_primary()));
    let old = view.iter().find(|m| m.host == "node1").unwrap();
    assert_eq!(old.state, MemberState::Unreachable);

    sleep(Duration::from_millis(4900)).await;
    assert_eq!(sim.primary(), None);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(sim.primary().as_deref(), Some("node2"));
    let view = members(&sim, "node3").await;
    assert_eq!(view.len(), 2);
    assert!(view.iter().all(|m| m.host != "node1"));
}

#[tokio::test(start_paused = true)]
async fn test_restart_rejoin_and_recovery() {
    let sim = cluster();
    sim.execute(&node("node1"), &Statement::ProvisionSchema).await.unwrap();
    insert(&sim, "node1", 1).await.unwrap();

    sim.stop(&node("node1")).await.unwrap();
    sleep(Duration::from_secs(6)).await;
    insert(&sim, "node2", 2).await.unwrap();
    insert(&sim, "node2", 3).await.unwrap();

    sim.start(&node("node1")).await.unwrap();
    let view = members(&sim, "node1").await;
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].state, MemberState::Offline);
    assert_eq!(count(&sim, "node1").await, 1);

    assert_eq!(sim.rejoin(&node("node1")).await.unwrap(), RejoinOutcome::Joined);
    assert_eq!(count(&sim, "node1").await, 3);
    let view = members(&sim, "node2").await;
    let rejoined = view.iter().find(|m| m.host == "node1").unwrap();
    assert_eq!(rejoined.state, MemberState::Recovering);
    assert_eq!(rejoined.role, MemberRole::Secondary);

    sleep(Duration::from_millis(2100)).await;
    let view = members(&sim, "node2").await;
    assert!(view.iter().all(|m| m.state == MemberState::Online));

    assert_eq!(sim.rejoin(&node("node1")).await.unwrap(), RejoinOutcome::AlreadyJoined);
    // The new primary keeps its role
    assert_eq!(sim.primary().as_deref(), Some("node2"));
}

#[tokio::test(start_paused = true)]
async fn test_rejoin_without_primary_fails() {
    let sim = cluster();
    sim.stop(&node("node1")).await.unwrap();
    sim.start(&node("node1")).await.unwrap();

    // Election still pending
    let e = sim.rejoin(&node("node1")).await.unwrap_err();
    match e {
        LifecycleError::Rejoin { source, .. } => {
            assert_eq!(source.code(), Some(ER_GROUP_REPLICATION_CONFIGURATION));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_auto_rejoin_on_start() {
    let config = SimulationConfig {
        auto_rejoin: true,
        ..Default::default()
    };
    let sim = SimulatedCluster::new(&test_directory(), &config);

    sim.stop(&node("node3")).await.unwrap();
    sim.start(&node("node3")).await.unwrap();

    assert_eq!(sim.rejoin(&node("node3")).await.unwrap(), RejoinOutcome::AlreadyJoined);
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_is_idempotent() {
    let sim = cluster();

    sim.stop(&node("node2")).await.unwrap();
    sim.stop(&node("node2")).await.unwrap();
    assert!(!sim.is_running("node2"));

    sim.start(&node("node2")).await.unwrap();
    sim.start(&node("node2")).await.unwrap();
    assert!(sim.is_running("node2"));

    let ghost = Node::new("ghost", "localhost", 4000, "ghost");
    assert!(matches!(
        sim.stop(&ghost).await.unwrap_err(),
        LifecycleError::UnknownNode(_)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_member_refuses_connections() {
    let sim = cluster();
    sim.set_unreachable("node1", true);

    let e = insert(&sim, "node1", 1).await.unwrap_err();
    assert_eq!(e.classify(), "connection_failed");

    sim.set_unreachable("node1", false);
    assert!(sim.query(&node("node1"), &Statement::GroupMembers).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_payload_round_trip_and_corruption() {
    let sim = cluster();
    sim.execute(&node("node1"), &Statement::ProvisionSchema).await.unwrap();
    let payload = b"replicated-bytes".to_vec();

    let id = sim
        .execute(
            &node("node1"),
            &Statement::InsertPayload {
                payload: payload.clone(),
            },
        )
        .await
        .unwrap()
        .last_insert_id
        .unwrap();

    let read = |name: &'static str| {
        let sim = &sim;
        async move {
            let rows = sim.query(&node(name), &Statement::ReadPayload { id }).await.unwrap();
            rows.first().and_then(|r| r.get_bytes("payload")).map(<[u8]>::to_vec)
        }
    };

    assert_eq!(read("node3").await, Some(payload.clone()));
    assert!(sim.corrupt_payload("node3", id, 0));
    assert_ne!(read("node3").await, Some(payload.clone()));
    assert_eq!(read("node2").await, Some(payload));
    assert!(!sim.corrupt_payload("node3", id + 1, 0));
}

#[tokio::test(start_paused = true)]
async fn test_connections_released_on_every_path() {
    let sim = cluster();

    let _ = insert(&sim, "node1", 1).await;
    let _ = sim.execute(&node("node2"), &Statement::ProvisionSchema).await;
    let _ = sim.query(&node("node1"), &Statement::ProvisionSchema).await;
    sim.set_unreachable("node3", true);
    let _ = sim.query(&node("node3"), &Statement::GroupMembers).await;
    let _ = sim
        .query(&Node::new("ghost", "h", 1, "ghost"), &Statement::GroupMembers)
        .await;

    assert_eq!(sim.open_connections(), 0);
}
