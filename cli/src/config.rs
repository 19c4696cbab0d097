//! CLI configuration: an optional JSON file, overridden by flags and env vars.

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy_primitives::Address;
use anyhow::{anyhow, Context, Result};
use chaincall_core::{AggregatorAbi, BlockTag, MulticallConfig};
use serde::{Deserialize, Serialize};

use crate::logging::LogConfig;

/// Contents of a `chaincall` config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// JSON-RPC endpoint.
    #[serde(default)]
    pub rpc_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Aggregator ABI document; the bundled schema is used when absent.
    #[serde(default)]
    pub abi_path: Option<PathBuf>,
    #[serde(default)]
    pub multicall: Option<MulticallConfig>,
    #[serde(default)]
    pub log: LogConfig,
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            abi_path: None,
            multicall: None,
            log: LogConfig::default(),
        }
    }
}

/// Values given on the command line (or through the environment).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub rpc_url: Option<String>,
    pub contract: Option<Address>,
    pub block: Option<BlockTag>,
    pub abi_path: Option<PathBuf>,
    pub request_timeout_ms: Option<u64>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: String,
    pub request_timeout: Duration,
    pub abi_path: Option<PathBuf>,
    pub multicall: MulticallConfig,
    pub log: LogConfig,
}

impl CliConfig {
    /// Read a config file, or start from defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file '{}'", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config file '{}'", path.display()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Apply command-line overrides and check that every required value is set.
    pub fn resolve(self, overrides: Overrides) -> Result<Settings> {
        let rpc_url = overrides
            .rpc_url
            .or(self.rpc_url)
            .ok_or_else(|| anyhow!("no RPC URL: pass --rpc-url or set CHAINCALL_RPC_URL"))?;

        let mut multicall = match (self.multicall, overrides.contract) {
            (Some(mut cfg), Some(contract)) => {
                cfg.contract = contract;
                cfg
            }
            (Some(cfg), None) => cfg,
            (None, Some(contract)) => MulticallConfig::new(contract),
            (None, None) => {
                return Err(anyhow!(
                    "no aggregator address: pass --contract or set CHAINCALL_CONTRACT"
                ))
            }
        };
        if let Some(block) = overrides.block {
            multicall.block = block;
        }

        let mut log = self.log;
        if let Some(level) = overrides.log_level {
            log.level = level;
        }
        log.json |= overrides.json_logs;

        Ok(Settings {
            rpc_url,
            request_timeout: Duration::from_millis(
                overrides.request_timeout_ms.unwrap_or(self.request_timeout_ms),
            ),
            abi_path: overrides.abi_path.or(self.abi_path),
            multicall,
            log,
        })
    }
}

impl Settings {
    /// Load the configured ABI document, or the bundled one.
    pub fn abi(&self) -> Result<AggregatorAbi> {
        match &self.abi_path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("read ABI file '{}'", path.display()))?;
                Ok(AggregatorAbi::from_json(&text)?)
            }
            None => Ok(AggregatorAbi::bundled()),
        }
    }
}
