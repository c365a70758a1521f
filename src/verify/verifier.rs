use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::compare_payload;
use super::ConsistencyReport;
use super::LagReport;
use super::NodeCount;
use super::NodeLag;
use super::NodePayload;
use super::PayloadCheck;
use super::PayloadReport;
use crate::constants::COL_COUNT;
use crate::constants::COL_PAYLOAD;
use crate::ClusterDirectory;
use crate::Node;
use crate::NodeClient;
use crate::NodeError;
use crate::Statement;
use crate::Table;

/// Reads every registered node and compares what they hold.
///
/// All checks are read-only, so running them twice on a quiescent cluster
/// gives the same report.
#[derive(Clone)]
pub struct ConsistencyVerifier {
    client: Arc<dyn NodeClient>,
    directory: Arc<ClusterDirectory>,
}

impl ConsistencyVerifier {
    pub fn new(
        client: Arc<dyn NodeClient>,
        directory: Arc<ClusterDirectory>,
    ) -> Self {
        Self { client, directory }
    }

    /// Row count of `table` on every node, in registry order.
    pub async fn check_row_counts(
        &self,
        table: Table,
    ) -> ConsistencyReport {
        let mut counts = Vec::with_capacity(self.directory.len());
        for node in self.directory.list_nodes() {
            let count = match self.count_rows(node, table).await {
                Ok(count) => Some(count),
                Err(e) => {
                    warn!(node = %node.name, %table, error = %e, "row count unavailable");
                    None
                }
            };
            counts.push(NodeCount {
                node: node.name.clone(),
                count,
            });
        }

        let report = ConsistencyReport { table, counts };
        info!(%table, consistent = report.is_consistent(), "row counts compared");
        report
    }

    async fn count_rows(
        &self,
        node: &Node,
        table: Table,
    ) -> Result<u64, NodeError> {
        let rows = self.client.query(node, &Statement::CountRows { table }).await?;
        rows.first()
            .and_then(|row| row.get_u64(COL_COUNT))
            .ok_or_else(|| NodeError::query(&node.name, None, "count query returned no usable row"))
    }

    /// Reads payload `id` from every node and compares it with `expected`.
    pub async fn check_payload(
        &self,
        id: u64,
        expected: &[u8],
    ) -> PayloadCheck {
        let mut results = Vec::with_capacity(self.directory.len());
        for node in self.directory.list_nodes() {
            let report = match self.read_payload(node, id).await {
                Ok(Some(observed)) => compare_payload(expected, &observed),
                Ok(None) => PayloadReport::Missing,
                Err(e) => {
                    warn!(node = %node.name, id, error = %e, "payload read failed");
                    PayloadReport::Unavailable
                }
            };
            if !report.is_match() {
                warn!(node = %node.name, id, %report, "payload differs from the written value");
            }
            results.push(NodePayload {
                node: node.name.clone(),
                report,
            });
        }

        PayloadCheck {
            id,
            expected_len: expected.len(),
            results,
        }
    }

    async fn read_payload(
        &self,
        node: &Node,
        id: u64,
    ) -> Result<Option<Vec<u8>>, NodeError> {
        let rows = self.client.query(node, &Statement::ReadPayload { id }).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get_bytes(COL_PAYLOAD))
            .map(<[u8]>::to_vec))
    }

    /// Polls every node except `primary`, concurrently, until payload `id`
    /// is visible or `timeout` passes. Lag is measured from `written_at`.
    pub async fn measure_replication_lag(
        &self,
        primary: &Node,
        id: u64,
        written_at: Instant,
        timeout: Duration,
        poll_interval: Duration,
    ) -> LagReport {
        let probes = self
            .directory
            .list_nodes()
            .iter()
            .filter(|n| n.name != primary.name)
            .map(|node| self.wait_for_row(node, id, written_at, timeout, poll_interval));

        let entries = join_all(probes).await;
        let report = LagReport {
            primary: primary.name.clone(),
            entries,
        };
        info!(max_lag = ?report.max_lag(), all_replicated = report.all_replicated(), "replication lag measured");
        report
    }

    async fn wait_for_row(
        &self,
        node: &Node,
        id: u64,
        written_at: Instant,
        timeout: Duration,
        poll_interval: Duration,
    ) -> NodeLag {
        let deadline = written_at + timeout;
        loop {
            match self.read_payload(node, id).await {
                Ok(Some(_)) => {
                    let lag = written_at.elapsed();
                    debug!(node = %node.name, ?lag, "row visible");
                    return NodeLag {
                        node: node.name.clone(),
                        lag: Some(lag),
                    };
                }
                Ok(None) => {}
                Err(e) => debug!(node = %node.name, error = %e, "lag probe failed"),
            }

            if Instant::now() >= deadline {
                warn!(node = %node.name, id, ?timeout, "row not replicated in time");
                return NodeLag {
                    node: node.name.clone(),
                    lag: None,
                };
            }
            sleep(poll_interval).await;
        }
    }
}
