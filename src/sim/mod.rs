//! In-process replication group.
//!
//! [`SimulatedCluster`] plays both collaborators of the drill: it answers
//! statements as a [`NodeClient`] and stops/starts members as a
//! [`NodeLifecycle`]. Elections and distributed recovery take the
//! configured amount of (tokio) time, so scenarios run unchanged on a
//! paused clock.

mod state;

#[cfg(test)]
mod sim_test;

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;

use self::state::SimState;
use crate::rejoin_via_client;
use crate::ClientResult;
use crate::ClusterDirectory;
use crate::ExecOutcome;
use crate::LifecycleError;
use crate::Node;
use crate::NodeClient;
use crate::NodeError;
use crate::NodeLifecycle;
use crate::RejoinOutcome;
use crate::Row;
use crate::SimulationConfig;
use crate::Statement;

pub struct SimulatedCluster {
    state: Mutex<SimState>,
    auto_rejoin: bool,
    open_connections: AtomicUsize,
}

/// Held for the duration of one statement.
struct Connection<'a> {
    open: &'a AtomicUsize,
}

impl<'a> Connection<'a> {
    fn open(open: &'a AtomicUsize) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        Self { open }
    }
}

impl Drop for Connection<'_> {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SimulatedCluster {
    /// Healthy group over every directory node; the first node is primary.
    pub fn new(
        directory: &ClusterDirectory,
        config: &SimulationConfig,
    ) -> Self {
        Self {
            state: Mutex::new(SimState::new(
                directory.list_nodes(),
                config.election_delay(),
                config.recovery_delay(),
            )),
            auto_rejoin: config.auto_rejoin,
            open_connections: AtomicUsize::new(0),
        }
    }

    pub fn shared(
        directory: &ClusterDirectory,
        config: &SimulationConfig,
    ) -> Arc<Self> {
        Arc::new(Self::new(directory, config))
    }

    /// Connections currently held by in-flight statements.
    pub fn open_connections(&self) -> usize {
        self.open_connections.load(Ordering::SeqCst)
    }

    /// Name of the member holding the primary role right now.
    pub fn primary(&self) -> Option<String> {
        let mut state = self.state.lock();
        state.tick(Instant::now());
        state.primary.map(|i| state.nodes[i].node.name.clone())
    }

    pub fn is_running(
        &self,
        name: &str,
    ) -> bool {
        let state = self.state.lock();
        state.index_of(name).map_or(false, |i| state.nodes[i].running)
    }

    /// Network partition of a single member: it keeps its state but
    /// refuses every connection.
    pub fn set_unreachable(
        &self,
        name: &str,
        unreachable: bool,
    ) {
        let mut state = self.state.lock();
        if let Some(i) = state.index_of(name) {
            state.nodes[i].reachable = !unreachable;
        }
    }

    /// Damages payload `id` on `name` only; false if there is no such byte.
    pub fn corrupt_payload(
        &self,
        name: &str,
        id: u64,
        byte_index: usize,
    ) -> bool {
        let mut state = self.state.lock();
        match state.index_of(name) {
            Some(i) => state.corrupt_payload(i, id, byte_index),
            None => false,
        }
    }

    fn run<T>(
        &self,
        node: &Node,
        op: impl FnOnce(&mut SimState, usize, Instant) -> ClientResult<T>,
    ) -> ClientResult<T> {
        let _conn = Connection::open(&self.open_connections);
        let now = Instant::now();
        let mut state = self.state.lock();
        state.tick(now);
        let i = state
            .index_of(&node.name)
            .ok_or_else(|| NodeError::connect(&node.name, "unknown host"))?;
        state.connect(i)?;
        op(&mut state, i, now)
    }

    fn node_index(
        &self,
        node: &Node,
    ) -> Result<usize, LifecycleError> {
        self.state
            .lock()
            .index_of(&node.name)
            .ok_or_else(|| LifecycleError::UnknownNode(node.name.clone()))
    }
}

#[async_trait]
impl NodeClient for SimulatedCluster {
    async fn query(
        &self,
        node: &Node,
        statement: &Statement,
    ) -> ClientResult<Vec<Row>> {
        tokio::task::yield_now().await;
        self.run(node, |state, i, now| match statement {
            Statement::GroupMembers => Ok(state.group_members(i, now)),
            Statement::CountRows { table } => state.count_rows(i, *table),
            Statement::ReadPayload { id } => state.read_payload(i, *id),
            other => Err(NodeError::query(
                &node.name,
                None,
                format!("{} does not return rows", other.label()),
            )),
        })
    }

    async fn execute(
        &self,
        node: &Node,
        statement: &Statement,
    ) -> ClientResult<ExecOutcome> {
        tokio::task::yield_now().await;
        let result = self.run(node, |state, i, now| match statement {
            Statement::ProvisionSchema => state.provision_schema(i),
            Statement::InsertTransaction(record) => state.insert_transaction(i, record),
            Statement::InsertPayload { payload } => state.insert_payload(i, payload),
            Statement::StartGroupReplication => state.join(i, now),
            other => Err(NodeError::query(
                &node.name,
                None,
                format!("{} is a read statement", other.label()),
            )),
        });
        if let Err(e) = &result {
            debug!(node = %node.name, statement = statement.label(), error = %e, "statement failed");
        }
        result
    }
}

#[async_trait]
impl NodeLifecycle for SimulatedCluster {
    async fn stop(
        &self,
        node: &Node,
    ) -> Result<(), LifecycleError> {
        let i = self.node_index(node)?;
        let mut state = self.state.lock();
        state.tick(Instant::now());
        if state.stop(i, Instant::now()) {
            info!(node = %node.name, "simulated member stopped");
        }
        Ok(())
    }

    async fn start(
        &self,
        node: &Node,
    ) -> Result<(), LifecycleError> {
        let i = self.node_index(node)?;
        let mut state = self.state.lock();
        let now = Instant::now();
        state.tick(now);
        if !state.start(i) {
            return Ok(());
        }
        info!(node = %node.name, "simulated member started");

        if self.auto_rejoin {
            match state.join(i, now) {
                Ok(_) => info!(node = %node.name, "member rejoined on its own"),
                Err(e) => debug!(node = %node.name, error = %e, "automatic rejoin failed"),
            }
        }
        Ok(())
    }

    async fn rejoin(
        &self,
        node: &Node,
    ) -> Result<RejoinOutcome, LifecycleError> {
        rejoin_via_client(self, node).await
    }
}
