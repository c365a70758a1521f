//! Static node registry and the membership types produced by probes.

mod member;
pub use member::*;


use std::fmt;

use crate::ClusterConfig;
use crate::NodeConfig;

/// One registry entry. Static for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Lifecycle handle (container name); also the identity members report
    pub handle: String,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        handle: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            handle: handle.into(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Node {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address())
    }
}

impl From<&NodeConfig> for Node {
    fn from(c: &NodeConfig) -> Self {
        Node::new(&c.name, &c.host, c.port, &c.handle)
    }
}

/// Ordered, immutable mapping of logical node name to connection
/// coordinates and lifecycle handle.
#[derive(Debug, Clone)]
pub struct ClusterDirectory {
    nodes: Vec<Node>,
}

impl ClusterDirectory {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn from_config(config: &ClusterConfig) -> Self {
        Self::new(config.nodes.iter().map(Node::from).collect())
    }

    /// Registry order is the probing order.
    pub fn list_nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_by_name(
        &self,
        name: &str,
    ) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Maps the host a member reports about itself back to a local node.
    pub fn node_by_external_identity(
        &self,
        identity: &str,
    ) -> Option<&Node> {
        self.nodes.iter().find(|n| n.handle == identity)
    }

    pub fn node_by_port(
        &self,
        port: u16,
    ) -> Option<&Node> {
        self.nodes.iter().find(|n| n.port == port)
    }
}
