use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::rejoin_via_client;
use super::NodeLifecycle;
use super::RejoinOutcome;
use crate::LifecycleConfig;
use crate::LifecycleError;
use crate::Node;
use crate::NodeClient;

/// External command line, kept apart from its execution so it can be
/// inspected and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    fn new(
        program: &str,
        args: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            program: program.to_string(),
            args: args.into_iter().collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// docker-compose backed lifecycle. The node handle is the container and
/// compose service name.
pub struct ContainerLifecycle {
    config: LifecycleConfig,
    client: Arc<dyn NodeClient>,
}

impl ContainerLifecycle {
    pub fn new(
        config: LifecycleConfig,
        client: Arc<dyn NodeClient>,
    ) -> Self {
        Self { config, client }
    }

    pub fn stop_command(
        &self,
        node: &Node,
    ) -> CommandSpec {
        CommandSpec::new(&self.config.docker_bin, ["stop".to_string(), node.handle.clone()])
    }

    pub fn remove_command(
        &self,
        node: &Node,
    ) -> CommandSpec {
        CommandSpec::new(
            &self.config.docker_bin,
            ["rm".to_string(), "-f".to_string(), node.handle.clone()],
        )
    }

    pub fn recreate_command(
        &self,
        node: &Node,
    ) -> CommandSpec {
        CommandSpec::new(
            &self.config.compose_bin,
            [
                "-f".to_string(),
                self.config.compose_file.display().to_string(),
                "up".to_string(),
                "-d".to_string(),
                node.handle.clone(),
            ],
        )
    }

    async fn run(
        &self,
        spec: &CommandSpec,
    ) -> Result<(), LifecycleError> {
        debug!(command = %spec, "running");
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| LifecycleError::Spawn {
                command: spec.to_string(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(LifecycleError::CommandFailed {
                command: spec.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

#[async_trait]
impl NodeLifecycle for ContainerLifecycle {
    async fn stop(
        &self,
        node: &Node,
    ) -> Result<(), LifecycleError> {
        info!(node = %node.name, container = %node.handle, "stopping container");
        self.run(&self.stop_command(node)).await
    }

    async fn start(
        &self,
        node: &Node,
    ) -> Result<(), LifecycleError> {
        // A stopped container keeps its name; remove it so compose can recreate it
        if let Err(e) = self.run(&self.remove_command(node)).await {
            warn!(node = %node.name, error = %e, "container removal failed, recreating anyway");
        }
        info!(node = %node.name, container = %node.handle, "recreating container");
        self.run(&self.recreate_command(node)).await
    }

    async fn rejoin(
        &self,
        node: &Node,
    ) -> Result<RejoinOutcome, LifecycleError> {
        rejoin_via_client(self.client.as_ref(), node).await
    }
}
