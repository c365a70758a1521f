//! Node runtime control: stop, start and rejoin the replication group.

mod container;
pub use container::*;

#[cfg(test)]
mod container_test;
#[cfg(test)]
mod lifecycle_test;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tracing::info;

use crate::LifecycleError;
use crate::Node;
use crate::NodeClient;
use crate::Statement;

/// How a rejoin request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejoinOutcome {
    /// The member started group replication on our request
    Joined,
    /// The member was already part of the group
    AlreadyJoined,
}

/// Controls the process backing a [`Node`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait NodeLifecycle: Send + Sync + 'static {
    async fn stop(
        &self,
        node: &Node,
    ) -> Result<(), LifecycleError>;

    /// May recreate the process rather than resume it.
    async fn start(
        &self,
        node: &Node,
    ) -> Result<(), LifecycleError>;

    /// Idempotent: a member that is already in the group is a success.
    async fn rejoin(
        &self,
        node: &Node,
    ) -> Result<RejoinOutcome, LifecycleError>;
}

/// Issues `START GROUP_REPLICATION` on `node` and classifies the answer.
pub async fn rejoin_via_client(
    client: &dyn NodeClient,
    node: &Node,
) -> Result<RejoinOutcome, LifecycleError> {
    match client.execute(node, &Statement::StartGroupReplication).await {
        Ok(_) => {
            info!(node = %node.name, "group replication started");
            Ok(RejoinOutcome::Joined)
        }
        Err(e) if e.is_group_already_running() => {
            info!(node = %node.name, "node already rejoined the group");
            Ok(RejoinOutcome::AlreadyJoined)
        }
        Err(source) => Err(LifecycleError::Rejoin {
            node: node.name.clone(),
            source,
        }),
    }
}
