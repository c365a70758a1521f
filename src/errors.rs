//! Failover Drill Error Hierarchy
//!
//! Errors are grouped by the boundary they cross. Only configuration, I/O and
//! the scenario hard gates ever reach [`Error`] and terminate a run; node,
//! topology, lifecycle and retry failures are folded into statistics and
//! reports by the caller.

use std::time::Duration;

use config::ConfigError;

use crate::constants::ER_GROUP_REPLICATION_RUNNING;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading or validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Scenario-level hard gates and bookkeeping errors
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Failure classification at the node client boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeErrorKind {
    ConnectFailed,
    QueryFailed,
}

impl std::fmt::Display for NodeErrorKind {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            NodeErrorKind::ConnectFailed => write!(f, "connect-failed"),
            NodeErrorKind::QueryFailed => write!(f, "query-failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeError {
    /// Node unreachable, refused the login or the network dropped
    #[error("Connect to {node} failed: {reason}")]
    ConnectFailed { node: String, reason: String },

    /// Statement rejected by the node, with the server error code when known
    #[error("Query on {node} failed (code {code:?}): {message}")]
    QueryFailed {
        node: String,
        code: Option<u32>,
        message: String,
    },
}

impl NodeError {
    pub fn connect(
        node: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        NodeError::ConnectFailed {
            node: node.into(),
            reason: reason.into(),
        }
    }

    pub fn query(
        node: impl Into<String>,
        code: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        NodeError::QueryFailed {
            node: node.into(),
            code,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> NodeErrorKind {
        match self {
            NodeError::ConnectFailed { .. } => NodeErrorKind::ConnectFailed,
            NodeError::QueryFailed { .. } => NodeErrorKind::QueryFailed,
        }
    }

    pub fn code(&self) -> Option<u32> {
        match self {
            NodeError::ConnectFailed { .. } => None,
            NodeError::QueryFailed { code, .. } => *code,
        }
    }

    /// Stable bucket used by the workload error breakdown.
    pub fn classify(&self) -> String {
        match self {
            NodeError::ConnectFailed { .. } => "connection_failed".to_string(),
            NodeError::QueryFailed { code: Some(code), .. } => format!("error_{code}"),
            NodeError::QueryFailed { code: None, .. } => "error_unknown".to_string(),
        }
    }

    /// `START GROUP_REPLICATION` on a member that is already in the group.
    pub fn is_group_already_running(&self) -> bool {
        self.code() == Some(ER_GROUP_REPLICATION_RUNNING)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    /// A PRIMARY was reported at a host that no local node is registered under
    #[error("Member reported at host '{host}' cannot be mapped to a known node")]
    UnmappedMember { host: String },

    /// Membership row is missing a column or carries an unknown value
    #[error("Malformed membership row from {node}: {reason}")]
    MalformedRow { node: String, reason: String },

    /// Every node failed to answer the membership query
    #[error("No node answered the membership query")]
    NoResponsiveNode,

    /// Snapshot answered but nobody holds the PRIMARY role
    #[error("Snapshot from {node} has no PRIMARY member")]
    NoPrimary { node: String },
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Node {0} is not registered with the lifecycle controller")]
    UnknownNode(String),

    /// External command exited with a failure status
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// External command could not be launched at all
    #[error("Failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Rejoin statement failed with something other than "already running"
    #[error("Rejoin of {node} failed: {source}")]
    Rejoin {
        node: String,
        #[source]
        source: NodeError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    /// Retry policy exhaustion
    #[error("Task failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: usize, last_error: String },

    /// Single attempt exceeded its timeout
    #[error("Retry timeout after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Hard gate: there is nothing to fail over from
    #[error("No primary resolvable at baseline; refusing to start the scenario")]
    NoBaselinePrimary,

    #[error("Failed to provision the workload schema on {node}: {reason}")]
    SchemaProvisioning { node: String, reason: String },

    #[error("Invalid scenario transition {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
}
