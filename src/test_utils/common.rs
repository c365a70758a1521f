use std::sync::Arc;

use crate::constants::COL_MEMBER_HOST;
use crate::constants::COL_MEMBER_ID;
use crate::constants::COL_MEMBER_PORT;
use crate::constants::COL_MEMBER_ROLE;
use crate::constants::COL_MEMBER_STATE;
use crate::ClusterDirectory;
use crate::MemberRole;
use crate::MemberState;
use crate::Node;
use crate::Row;
use crate::Settings;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// node1..node3 on localhost:3306..3308, handles equal to names.
pub fn test_nodes() -> Vec<Node> {
    (1..=3)
        .map(|i| Node::new(format!("node{i}"), "localhost", 3305 + i as u16, format!("node{i}")))
        .collect()
}

pub fn test_directory() -> Arc<ClusterDirectory> {
    Arc::new(ClusterDirectory::new(test_nodes()))
}

pub fn node(name: &str) -> Node {
    test_nodes()
        .into_iter()
        .find(|n| n.name == name)
        .unwrap_or_else(|| panic!("unknown test node {name}"))
}

pub fn member_row(
    host: &str,
    port: u16,
    state: MemberState,
    role: MemberRole,
) -> Row {
    Row::new()
        .with(COL_MEMBER_ID, format!("uuid-{host}"))
        .with(COL_MEMBER_HOST, host)
        .with(COL_MEMBER_PORT, port as u64)
        .with(COL_MEMBER_STATE, state.as_str())
        .with(COL_MEMBER_ROLE, role.as_str())
}

/// Membership table of the three test nodes, all ONLINE, with `primary`
/// (if any) holding the PRIMARY role.
pub fn group_rows(primary: Option<&str>) -> Vec<Row> {
    test_nodes()
        .iter()
        .map(|n| {
            let role = if Some(n.handle.as_str()) == primary {
                MemberRole::Primary
            } else {
                MemberRole::Secondary
            };
            member_row(&n.handle, n.port, MemberState::Online, role)
        })
        .collect()
}

/// Defaults (three local nodes) with scenario timings shortened so a
/// whole run takes well under a minute of paused tokio time.
pub fn fast_settings() -> Settings {
    let mut settings = Settings::default();
    let s = &mut settings.scenario;
    s.warmup_secs = 2;
    s.pre_election_settle_secs = 1;
    s.election_poll_interval_ms = 1000;
    s.election_max_wait_secs = 10;
    s.post_election_settle_secs = 1;
    s.post_failover_workload_secs = 2;
    s.startup_wait_secs = 1;
    s.rejoin_wait_secs = 3;
    s.stop_grace_ms = 1000;
    s.consistency_settle_secs = 1;
    settings.simulation.election_delay_ms = 3000;
    settings.simulation.recovery_delay_ms = 1000;
    settings
}
