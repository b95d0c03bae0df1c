//! TOML configuration for the `tessera` binary.
//!
//! Every section is optional. Missing keys fall back to the defaults below,
//! and command-line flags override whatever the file says.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;
use tessera_types::{
    DEFAULT_MAX_IN_FLIGHT, DEFAULT_PART_SIZE, GatewayConfig, MAX_PART_SIZE, TransportProtocol,
};

/// File name looked up under the platform config directory.
const CONFIG_FILE_NAME: &str = "tessera.toml";

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Where chunks are stored.
    pub gateway: GatewaySection,
    /// Chunking and concurrency.
    pub transfer: TransferSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[gateway]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Backend type: `"http"` (default) or `"file"`.
    pub backend: String,
    /// Chunk server host for the http backend.
    pub host: String,
    /// Chunk server port for the http backend.
    pub port: u16,
    /// `"http"` or `"https"`.
    pub protocol: TransportProtocol,
    /// Chunk directory for the file backend, and for `tessera serve`.
    pub store_dir: PathBuf,
}

impl Default for GatewaySection {
    fn default() -> Self {
        let endpoint = GatewayConfig::default();
        let store_dir = dirs::data_dir()
            .map(|d| d.join("tessera").join("chunks"))
            .unwrap_or_else(|| PathBuf::from(".tessera/chunks"));
        Self {
            backend: "http".to_string(),
            host: endpoint.endpoint_host,
            port: endpoint.endpoint_port,
            protocol: endpoint.protocol,
            store_dir,
        }
    }
}

/// `[transfer]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TransferSection {
    /// Chunk size in bytes.
    pub part_size: u32,
    /// Maximum concurrent gateway calls per operation.
    pub max_in_flight: usize,
}

impl Default for TransferSection {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from `path`, or from the default location if it exists.
    ///
    /// An explicit path must exist. The default location is optional.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_path() {
                Some(p) if p.is_file() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let config: CliConfig =
            toml::from_str(&content).with_context(|| format!("invalid {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        let config: CliConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges. Call again after applying command-line overrides.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.transfer.part_size == 0 {
            bail!("transfer.part_size must be greater than zero");
        }
        if self.transfer.part_size > MAX_PART_SIZE {
            bail!("transfer.part_size must be at most {MAX_PART_SIZE} bytes");
        }
        if self.transfer.max_in_flight == 0 {
            bail!("transfer.max_in_flight must be at least 1");
        }
        match self.gateway.backend.as_str() {
            "http" | "file" => Ok(()),
            other => bail!("unknown gateway.backend {other:?} (expected \"http\" or \"file\")"),
        }
    }

    /// Endpoint for the http backend.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            endpoint_host: self.gateway.host.clone(),
            endpoint_port: self.gateway.port,
            protocol: self.gateway.protocol,
        }
    }
}

/// `<config dir>/tessera/tessera.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tessera").join(CONFIG_FILE_NAME))
}
