//! Configuration for the orchestration service

use serde::{Deserialize, Serialize};
use std::time::Duration;

use ledger_types::ClientConfig;

/// Status codes at or above this value mark a failed endorsement.
pub const DEFAULT_ERROR_THRESHOLD: i32 = 400;

/// Configuration for the orchestration service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Endorsement status codes at or above this are rejections
    pub error_threshold: i32,

    /// Deadline covering both the delivery connect and wait phases
    pub delivery_timeout: Duration,

    /// Watch observing nodes for the commit after submission
    pub wait_for_commit: bool,
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            delivery_timeout: Duration::from_secs(100),
            wait_for_commit: true,
        }
    }
}

impl From<&ClientConfig> for OrchestrationConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            error_threshold: config.error_threshold,
            delivery_timeout: Duration::from_secs(config.delivery_timeout_secs),
            wait_for_commit: true,
        }
    }
}

/// Builder for OrchestrationConfig
pub struct OrchestrationConfigBuilder {
    config: OrchestrationConfig,
}

impl OrchestrationConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: OrchestrationConfig::default(),
        }
    }

    pub fn error_threshold(mut self, threshold: i32) -> Self {
        self.config.error_threshold = threshold;
        self
    }

    pub fn delivery_timeout(mut self, timeout: Duration) -> Self {
        self.config.delivery_timeout = timeout;
        self
    }

    pub fn wait_for_commit(mut self, wait: bool) -> Self {
        self.config.wait_for_commit = wait;
        self
    }

    pub fn build(self) -> OrchestrationConfig {
        self.config
    }
}

impl Default for OrchestrationConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
