use std::sync::Arc;

use tokio::time::Instant;
use tracing::debug;
use tracing::warn;

use crate::ClusterDirectory;
use crate::MemberStatus;
use crate::Node;
use crate::NodeClient;
use crate::NodeError;
use crate::Statement;
use crate::TopologyError;
use crate::TopologySnapshot;

/// Per-node outcome of [`TopologyProber::probe_all`].
#[derive(Debug)]
pub struct NodeProbe {
    pub node: String,
    pub result: Result<TopologySnapshot, NodeError>,
}

#[derive(Clone)]
pub struct TopologyProber {
    client: Arc<dyn NodeClient>,
    directory: Arc<ClusterDirectory>,
}

impl TopologyProber {
    pub fn new(
        client: Arc<dyn NodeClient>,
        directory: Arc<ClusterDirectory>,
    ) -> Self {
        Self { client, directory }
    }

    pub fn directory(&self) -> &Arc<ClusterDirectory> {
        &self.directory
    }

    /// Runs the membership query against `node`.
    ///
    /// Rows that cannot be parsed are dropped with a warning; the rest of the
    /// snapshot is still usable.
    pub async fn probe(
        &self,
        node: &Node,
    ) -> Result<TopologySnapshot, NodeError> {
        let rows = self.client.query(node, &Statement::GroupMembers).await?;

        let members = rows
            .iter()
            .filter_map(|row| match MemberStatus::from_row(&node.name, row) {
                Ok(member) => Some(member),
                Err(e) => {
                    warn!(node = %node.name, error = %e, "skipping membership row");
                    None
                }
            })
            .collect();

        Ok(TopologySnapshot {
            source: node.name.clone(),
            taken_at: Instant::now(),
            members,
        })
    }

    /// Snapshot from the first node, in registry order, that answers with at
    /// least one member. Failures on one node never stop the search.
    pub async fn first_responsive_snapshot(&self) -> Result<TopologySnapshot, TopologyError> {
        for node in self.directory.list_nodes() {
            match self.probe(node).await {
                Ok(snapshot) if !snapshot.is_empty() => return Ok(snapshot),
                Ok(_) => {
                    debug!(node = %node.name, "empty membership table, trying next node");
                }
                Err(e) => {
                    debug!(node = %node.name, kind = %e.kind(), error = %e, "probe failed, trying next node");
                }
            }
        }
        Err(TopologyError::NoResponsiveNode)
    }

    /// Probes every node; used for status display and per-node checks.
    pub async fn probe_all(&self) -> Vec<NodeProbe> {
        let mut probes = Vec::with_capacity(self.directory.len());
        for node in self.directory.list_nodes() {
            probes.push(NodeProbe {
                node: node.name.clone(),
                result: self.probe(node).await,
            });
        }
        probes
    }
}
