use tracing::debug;
use tracing::warn;

use super::TopologyProber;
use crate::utils::async_task::task_with_timeout_and_backoff;
use crate::BackoffPolicy;
use crate::Node;
use crate::TopologyError;

#[derive(Clone)]
pub struct PrimaryResolver {
    prober: TopologyProber,
    policy: BackoffPolicy,
}

impl PrimaryResolver {
    pub fn new(
        prober: TopologyProber,
        policy: BackoffPolicy,
    ) -> Self {
        Self { prober, policy }
    }

    pub fn prober(&self) -> &TopologyProber {
        &self.prober
    }

    /// One attempt: first responsive snapshot, its PRIMARY member, mapped
    /// back to a registry node.
    pub async fn resolve_once(&self) -> Result<Node, TopologyError> {
        let snapshot = self.prober.first_responsive_snapshot().await?;

        let primary = snapshot.primary().ok_or_else(|| TopologyError::NoPrimary {
            node: snapshot.source.clone(),
        })?;

        match self.prober.directory().node_by_external_identity(&primary.host) {
            Some(node) => Ok(node.clone()),
            None => {
                let e = TopologyError::UnmappedMember {
                    host: primary.host.clone(),
                };
                warn!(source = %snapshot.source, "{}", e);
                Err(e)
            }
        }
    }

    /// Bounded retry over [`resolve_once`](Self::resolve_once).
    ///
    /// Returns `None` when no attempt yields a mappable primary; never errors.
    pub async fn resolve_primary(&self) -> Option<Node> {
        match task_with_timeout_and_backoff(|| self.resolve_once(), self.policy).await {
            Ok(node) => Some(node),
            Err(e) => {
                debug!(error = %e, "no primary resolvable");
                None
            }
        }
    }
}
