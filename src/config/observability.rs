use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ObservabilityConfig {
    /// When set, logs go to `<log_dir>/failover-drill.log` instead of stdout
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}
