use std::path::PathBuf;
use std::sync::Arc;

use crate::test_utils::node;
use crate::CommandSpec;
use crate::ContainerLifecycle;
use crate::LifecycleConfig;
use crate::LifecycleError;
use crate::MockNodeClient;
use crate::NodeLifecycle;

fn lifecycle(
    docker_bin: &str,
    compose_bin: &str,
) -> ContainerLifecycle {
    ContainerLifecycle::new(
        LifecycleConfig {
            compose_file: PathBuf::from("deploy/compose.yaml"),
            docker_bin: docker_bin.to_string(),
            compose_bin: compose_bin.to_string(),
        },
        Arc::new(MockNodeClient::new()),
    )
}

#[test]
fn test_command_lines() {
    let lc = lifecycle("docker", "docker-compose");
    let n = node("node2");

    assert_eq!(lc.stop_command(&n).to_string(), "docker stop node2");
    assert_eq!(lc.remove_command(&n).to_string(), "docker rm -f node2");
    assert_eq!(
        lc.recreate_command(&n),
        CommandSpec {
            program: "docker-compose".to_string(),
            args: ["-f", "deploy/compose.yaml", "up", "-d", "node2"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_successful_commands() {
    let lc = lifecycle("true", "true");

    lc.stop(&node("node1")).await.unwrap();
    lc.start(&node("node1")).await.unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_command_reports_status() {
    let lc = lifecycle("false", "true");

    let e = lc.stop(&node("node1")).await.unwrap_err();
    match e {
        LifecycleError::CommandFailed { command, .. } => assert_eq!(command, "false stop node1"),
        other => panic!("unexpected error {other:?}"),
    }

    // Removal failure alone does not fail a start
    lc.start(&node("node1")).await.unwrap();
}

#[tokio::test]
async fn test_missing_binary_is_spawn_error() {
    let lc = lifecycle("/nonexistent/docker-binary", "/nonexistent/compose-binary");

    let e = lc.start(&node("node3")).await.unwrap_err();
    assert!(matches!(e, LifecycleError::Spawn { .. }));
}
