//! Tunables for the client handshake.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_STATE_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read handshake config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid handshake config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client handshake configuration. Missing fields take their defaults.
///
/// 客户端握手配置。缺失的字段使用默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeConfig {
    /// How long the client may wait in any non-terminal state before the
    /// handshake aborts with a timeout.
    pub state_timeout_ms: u64,
    /// Offer newly provisioned identities to the sync service when it is
    /// logged in.
    pub upload_provisioned_identities: bool,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            state_timeout_ms: DEFAULT_STATE_TIMEOUT_MS,
            upload_provisioned_identities: true,
        }
    }
}

impl HandshakeConfig {
    pub fn state_timeout(&self) -> Duration {
        Duration::from_millis(self.state_timeout_ms)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(Into::into)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
