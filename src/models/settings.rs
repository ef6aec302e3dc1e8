//! Settings Models
//!
//! Orchestrator configuration and its partial-update request.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use step_analysis_core::DEFAULT_POLL_BUDGET;

/// Orchestrator configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestratorSettings {
    /// Base URL of the analysis execution service
    pub service_url: String,
    /// Countdown ticks between two status checks
    #[serde(default = "default_poll_budget")]
    pub poll_budget: u32,
    /// Delay of one countdown tick, in milliseconds
    #[serde(default = "default_poll_tick_ms")]
    pub poll_tick_ms: u64,
    /// Per-request timeout of the HTTP client, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Resubmit parameterless analyses found in a stale status
    #[serde(default = "default_autorun_stale")]
    pub autorun_stale: bool,
}

fn default_poll_budget() -> u32 {
    DEFAULT_POLL_BUDGET
}

fn default_poll_tick_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_autorun_stale() -> bool {
    true
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8080/service".to_string(),
            poll_budget: default_poll_budget(),
            poll_tick_ms: default_poll_tick_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            autorun_stale: default_autorun_stale(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub service_url: Option<String>,
    pub poll_budget: Option<u32>,
    pub poll_tick_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub autorun_stale: Option<bool>,
}

impl OrchestratorSettings {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(service_url) = update.service_url {
            self.service_url = service_url;
        }
        if let Some(budget) = update.poll_budget {
            self.poll_budget = budget;
        }
        if let Some(tick) = update.poll_tick_ms {
            self.poll_tick_ms = tick;
        }
        if let Some(timeout) = update.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(autorun) = update.autorun_stale {
            self.autorun_stale = autorun;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = url::Url::parse(&self.service_url)
            .map_err(|e| format!("Invalid service_url '{}': {}", self.service_url, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "Invalid service_url scheme: {}. Must be 'http' or 'https'",
                url.scheme()
            ));
        }

        if !(1..=20).contains(&self.poll_budget) {
            return Err("poll_budget must be between 1 and 20".to_string());
        }

        if self.poll_tick_ms < 10 {
            return Err("poll_tick_ms must be at least 10 milliseconds".to_string());
        }

        if !(1..=600).contains(&self.request_timeout_secs) {
            return Err("request_timeout_secs must be between 1 and 600".to_string());
        }

        Ok(())
    }

    pub fn poll_tick(&self) -> Duration {
        Duration::from_millis(self.poll_tick_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
