//! fabricscale.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Label whose presence marks a node's devices as exposed through the fabric.
pub const DEFAULT_FABRIC_LABEL_KEY: &str = "composable.fabric.dra";

/// Suffix appended to the configured status record name for scale-up reports.
pub const SCALE_UP_STATUS_SUFFIX: &str = "-scaleup";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FabricScaleConfig {
    pub fabric: FabricConfig,
    pub status: StatusConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FabricConfig {
    /// Node label marking fabric-attached devices. Only presence matters.
    pub label_key: String,
    /// Node label carrying the node group id, used by the label resolver.
    pub node_group_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusConfig {
    pub namespace: String,
    /// Base name of the status record; the scale-up report is written to
    /// `{record_name}-scaleup`.
    pub record_name: String,
    /// Upper bound on read-modify-write attempts when a concurrent writer
    /// changes the record between fetch and write.
    pub max_write_attempts: u32,
    pub report_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            label_key: DEFAULT_FABRIC_LABEL_KEY.to_string(),
            node_group_label: "fabricscale.io/node-group".to_string(),
        }
    }
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            namespace: "kube-system".to_string(),
            record_name: "cluster-autoscaler-status".to_string(),
            max_write_attempts: 3,
            report_interval_secs: 10,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/fabricscale"),
        }
    }
}

impl FabricScaleConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: FabricScaleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fabric.label_key.is_empty() {
            return Err(ConfigError::Invalid("fabric.label_key must not be empty".into()));
        }
        if self.status.record_name.is_empty() {
            return Err(ConfigError::Invalid("status.record_name must not be empty".into()));
        }
        if self.status.max_write_attempts == 0 {
            return Err(ConfigError::Invalid(
                "status.max_write_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl StatusConfig {
    /// Name of the record the scale-up status is persisted to.
    pub fn scale_up_record_name(&self) -> String {
        format!("{}{}", self.record_name, SCALE_UP_STATUS_SUFFIX)
    }
}
