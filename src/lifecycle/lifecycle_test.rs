use mockall::predicate::eq;

use crate::constants::ER_GROUP_REPLICATION_CONFIGURATION;
use crate::constants::ER_GROUP_REPLICATION_RUNNING;
use crate::rejoin_via_client;
use crate::test_utils::node;
use crate::ExecOutcome;
use crate::LifecycleError;
use crate::MockNodeClient;
use crate::NodeError;
use crate::RejoinOutcome;
use crate::Statement;

#[tokio::test]
async fn test_rejoin_joined() {
    let mut client = MockNodeClient::new();
    client
        .expect_execute()
        .with(eq(node("node1")), eq(Statement::StartGroupReplication))
        .times(1)
        .returning(|_, _| Ok(ExecOutcome::default()));

    let outcome = rejoin_via_client(&client, &node("node1")).await.unwrap();

    assert_eq!(outcome, RejoinOutcome::Joined);
}

#[tokio::test]
async fn test_rejoin_already_running_is_success() {
    let mut client = MockNodeClient::new();
    client.expect_execute().times(1).returning(|n, _| {
        Err(NodeError::query(
            &n.name,
            Some(ER_GROUP_REPLICATION_RUNNING),
            "group replication already running",
        ))
    });

    let outcome = rejoin_via_client(&client, &node("node1")).await.unwrap();

    assert_eq!(outcome, RejoinOutcome::AlreadyJoined);
}

#[tokio::test]
async fn test_rejoin_other_failures_are_errors() {
    let mut client = MockNodeClient::new();
    let mut calls = 0;
    client.expect_execute().times(2).returning(move |n, _| {
        calls += 1;
        if calls == 1 {
            Err(NodeError::query(&n.name, Some(ER_GROUP_REPLICATION_CONFIGURATION), "no group"))
        } else {
            Err(NodeError::connect(&n.name, "refused"))
        }
    });

    let e = rejoin_via_client(&client, &node("node2")).await.unwrap_err();
    match e {
        LifecycleError::Rejoin { node, source } => {
            assert_eq!(node, "node2");
            assert_eq!(source.code(), Some(ER_GROUP_REPLICATION_CONFIGURATION));
        }
        other => panic!("unexpected error {other:?}"),
    }

    let e = rejoin_via_client(&client, &node("node2")).await.unwrap_err();
    assert!(matches!(e, LifecycleError::Rejoin { .. }));
}
