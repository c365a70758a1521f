use std::collections::HashSet;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Static description of one cluster member as seen from the drill host.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// Logical name used throughout reports (e.g. `node1`)
    pub name: String,

    /// Address the drill connects to
    pub host: String,

    pub port: u16,

    /// Lifecycle handle (container name). Members report this value as
    /// their host, so it doubles as the external identity.
    pub handle: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClusterConfig {
    #[serde(default = "default_nodes")]
    pub nodes: Vec<NodeConfig>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
        }
    }
}

impl ClusterConfig {
    /// Validates cluster configuration consistency
    /// # Errors
    /// Returns `Error::Config` if any configuration rules are violated
    pub fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(invalid("cluster.nodes must contain at least one node"));
        }

        let mut names = HashSet::new();
        let mut handles = HashSet::new();
        for node in &self.nodes {
            if node.name.trim().is_empty() {
                return Err(invalid("cluster.nodes entries need a non-empty name"));
            }
            if !names.insert(node.name.as_str()) {
                return Err(invalid(format!("Duplicate node name {} in cluster.nodes", node.name)));
            }
            if !handles.insert(node.handle.as_str()) {
                return Err(invalid(format!(
                    "Duplicate handle {} in cluster.nodes",
                    node.handle
                )));
            }
            if node.port == 0 {
                return Err(invalid(format!("Node {} must specify a non-zero port", node.name)));
            }
        }

        Ok(())
    }
}

pub(super) fn invalid(msg: impl Into<String>) -> Error {
    Error::Config(ConfigError::Message(msg.into()))
}

fn default_nodes() -> Vec<NodeConfig> {
    (1..=3)
        .map(|i| NodeConfig {
            name: format!("node{i}"),
            host: "localhost".to_string(),
            port: 3305 + i as u16,
            handle: format!("node{i}"),
        })
        .collect()
}
