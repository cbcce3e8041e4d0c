//! Process configuration — broker, pool, and batching parameters.
//!
//! Resolution mirrors the teacher crate's split: a YAML file plus env-var
//! fallbacks for anything secret or environment-specific, merged into one
//! typed struct. Config loading itself is an ambient concern — the broker
//! and object-store clients it points at are out of scope implementations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_batch_period_ms() -> u64 {
    1_000
}

fn default_window_secs() -> u64 {
    60
}

fn default_ns_per_sec() -> u64 {
    1_000_000_000
}

/// Top-level process configuration, loaded from YAML with env-var overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Address of the broker this process ingests frames from.
    pub broker_url: String,

    /// Connection string / address for the object-store backend.
    pub pool_url: String,

    /// How long a batch accumulates before flushing, in milliseconds.
    #[serde(default = "default_batch_period_ms")]
    pub batch_period_ms: u64,

    /// `windowSize` used by `contents_hash_label` (spec §9 Open Question 3).
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// `nanoseconds` used by `contents_hash_label` (spec §9 Open Question 3).
    #[serde(default = "default_ns_per_sec")]
    pub ns_per_sec: u64,
}

impl VaultConfig {
    pub fn batch_period(&self) -> Duration {
        Duration::from_millis(self.batch_period_ms)
    }

    /// Load from a YAML file, then apply env-var overrides for
    /// `VAULTAIRE_BROKER_URL` / `VAULTAIRE_POOL_URL`.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;

        if let Ok(url) = std::env::var("VAULTAIRE_BROKER_URL") {
            config.broker_url = url;
        }
        if let Ok(url) = std::env::var("VAULTAIRE_POOL_URL") {
            config.pool_url = url;
        }

        Ok(config)
    }
}
