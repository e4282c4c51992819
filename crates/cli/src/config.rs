//! Client configuration loading.
//!
//! A JSON file wins when given; otherwise everything comes from `LEDGER_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use ledger_types::{ClientConfig, EndpointConfig, MspConfig, DEFAULT_CONNECT_TIMEOUT_SECS};

pub const PEERS_ENV: &str = "LEDGER_PEERS";
pub const ORDERER_ENV: &str = "LEDGER_ORDERER";
pub const CHANNEL_ENV: &str = "LEDGER_CHANNEL";
pub const MSP_ID_ENV: &str = "LEDGER_MSP_ID";
pub const MSP_KEY_ENV: &str = "LEDGER_MSP_KEY";
pub const CLIENT_CERT_ENV: &str = "LEDGER_CLIENT_CERT";
pub const CONNECT_TIMEOUT_ENV: &str = "LEDGER_CONNECT_TIMEOUT_SECS";
pub const DELIVERY_TIMEOUT_ENV: &str = "LEDGER_DELIVERY_TIMEOUT_SECS";
pub const ERROR_THRESHOLD_ENV: &str = "LEDGER_ERROR_THRESHOLD";

pub fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => load_config_file(path),
        None => load_config_from(|key| std::env::var(key).ok()),
    }
}

pub fn load_config_file(path: &Path) -> Result<ClientConfig> {
    info!("Loading configuration from {}", path.display());
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
    let config: ClientConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid configuration file {}", path.display()))?;
    validate(&config)?;
    Ok(config)
}

/// Build a configuration from an environment lookup.
pub fn load_config_from<F>(lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let required = |key: &str| {
        lookup(key)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
    };

    let client_cert_path = lookup(CLIENT_CERT_ENV).map(PathBuf::from);
    let connect_timeout_secs = match lookup(CONNECT_TIMEOUT_ENV) {
        Some(v) => v
            .parse::<u64>()
            .with_context(|| format!("{} must be a number of seconds", CONNECT_TIMEOUT_ENV))?,
        None => DEFAULT_CONNECT_TIMEOUT_SECS,
    };

    let endpoint = |address: &str| EndpointConfig {
        address: address.trim().to_string(),
        client_cert_path: client_cert_path.clone(),
        connect_timeout_secs,
    };

    let peers: Vec<EndpointConfig> = required(PEERS_ENV)?
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(&endpoint)
        .collect();

    let error_threshold = lookup(ERROR_THRESHOLD_ENV)
        .unwrap_or_else(|| "400".to_string())
        .parse::<i32>()
        .with_context(|| format!("{} must be a status code", ERROR_THRESHOLD_ENV))?;

    let delivery_timeout_secs = lookup(DELIVERY_TIMEOUT_ENV)
        .unwrap_or_else(|| "100".to_string())
        .parse::<u64>()
        .with_context(|| format!("{} must be a number of seconds", DELIVERY_TIMEOUT_ENV))?;

    let config = ClientConfig {
        msp: MspConfig {
            msp_id: required(MSP_ID_ENV)?,
            key_path: PathBuf::from(required(MSP_KEY_ENV)?),
        },
        channel_id: required(CHANNEL_ENV)?,
        peers,
        orderer: endpoint(&required(ORDERER_ENV)?),
        error_threshold,
        delivery_timeout_secs,
    };

    validate(&config)?;
    Ok(config)
}

fn validate(config: &ClientConfig) -> Result<()> {
    if config.peers.is_empty() {
        anyhow::bail!("at least one peer endpoint is required");
    }
    if config.channel_id.is_empty() {
        anyhow::bail!("channel id must not be empty");
    }
    if config.delivery_timeout_secs == 0 {
        anyhow::bail!("delivery timeout must be positive");
    }
    Ok(())
}
