use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::cluster::invalid;
use crate::Result;

/// Container tooling used by [`crate::ContainerLifecycle`].
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LifecycleConfig {
    #[serde(default = "default_compose_file")]
    pub compose_file: PathBuf,

    #[serde(default = "default_docker_bin")]
    pub docker_bin: String,

    #[serde(default = "default_compose_bin")]
    pub compose_bin: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            compose_file: default_compose_file(),
            docker_bin: default_docker_bin(),
            compose_bin: default_compose_bin(),
        }
    }
}

impl LifecycleConfig {
    pub fn validate(&self) -> Result<()> {
        if self.compose_file.as_os_str().is_empty() {
            return Err(invalid("lifecycle.compose_file path cannot be empty"));
        }
        if self.docker_bin.trim().is_empty() || self.compose_bin.trim().is_empty() {
            return Err(invalid("lifecycle.docker_bin and lifecycle.compose_bin cannot be empty"));
        }
        Ok(())
    }
}

fn default_compose_file() -> PathBuf {
    PathBuf::from("docker-compose.yaml")
}
fn default_docker_bin() -> String {
    "docker".to_string()
}
fn default_compose_bin() -> String {
    "docker-compose".to_string()
}
