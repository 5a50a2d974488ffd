//! Settings file contents
//!
//! ```yaml
//! region: RegionOne
//! token: gAAAAAB...
//! enable_logging: false
//! endpoints:
//!   network: https://neutron.example.com:9696
//!   volumev3: https://cinder.example.com/v3/<project>
//! wait:
//!   poll_interval_ms: 5000
//!   min_poll_interval_ms: 3000
//!   grace_window_ms: 30000
//! timeouts:
//!   default: { create: 600, update: 600, delete: 600 }
//!   cluster: { create: 3600 }
//! ```

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Region name (`OS_REGION_NAME`)
    pub region: Option<String>,

    /// Pre-issued auth token (`OS_AUTH_TOKEN`)
    pub token: Option<String>,

    /// Debug logging of API traffic (`OS_DEBUG`)
    pub enable_logging: bool,

    /// Base URL per service type
    pub endpoints: BTreeMap<String, String>,

    pub wait: WaitSettings,

    /// Per resource kind, plus an optional `default` entry
    pub timeouts: BTreeMap<String, TimeoutSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    pub poll_interval_ms: u64,
    pub min_poll_interval_ms: u64,
    pub max_poll_interval_ms: u64,
    pub multiplier: f64,
    pub grace_window_ms: u64,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            min_poll_interval_ms: 3_000,
            max_poll_interval_ms: 10_000,
            multiplier: 2.0,
            grace_window_ms: 30_000,
        }
    }
}

impl WaitSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn min_poll_interval(&self) -> Duration {
        Duration::from_millis(self.min_poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }

    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }
}

/// Operation timeouts in seconds. Missing entries fall back to `default`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub create: Option<u64>,
    pub update: Option<u64>,
    pub delete: Option<u64>,
}

impl TimeoutSettings {
    /// Fill unset entries from `fallback`
    pub fn or(self, fallback: TimeoutSettings) -> TimeoutSettings {
        TimeoutSettings {
            create: self.create.or(fallback.create),
            update: self.update.or(fallback.update),
            delete: self.delete.or(fallback.delete),
        }
    }

    pub fn create(&self) -> Duration {
        secs(self.create)
    }

    pub fn update(&self) -> Duration {
        secs(self.update)
    }

    pub fn delete(&self) -> Duration {
        secs(self.delete)
    }
}

fn secs(value: Option<u64>) -> Duration {
    Duration::from_secs(value.unwrap_or(DEFAULT_TIMEOUT_SECS))
}

impl Settings {
    /// Parse YAML settings
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Override values from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Override values from `lookup`. Empty variables are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(region) = get("OS_REGION_NAME") {
            self.region = Some(region);
        }
        if let Some(token) = get("OS_AUTH_TOKEN") {
            self.token = Some(token);
        }
        if let Some(debug) = get("OS_DEBUG") {
            self.enable_logging = !matches!(debug.trim(), "0" | "false" | "no");
        }
    }

    /// Timeouts for a resource kind, merged over the `default` entry
    pub fn timeouts_for(&self, kind: &str) -> TimeoutSettings {
        let fallback = self.timeouts.get("default").copied().unwrap_or_default();
        self.timeouts
            .get(kind)
            .copied()
            .unwrap_or_default()
            .or(fallback)
    }

    /// Check values that would make waiting misbehave
    pub fn validate(&self) -> Result<()> {
        let wait = &self.wait;
        if wait.poll_interval_ms == 0 {
            return Err(invalid("wait.poll_interval_ms", "must be greater than zero"));
        }
        if wait.max_poll_interval_ms < wait.min_poll_interval_ms {
            return Err(invalid(
                "wait.max_poll_interval_ms",
                "must not be lower than wait.min_poll_interval_ms",
            ));
        }
        if !wait.multiplier.is_finite() || wait.multiplier <= 0.0 {
            return Err(invalid("wait.multiplier", "must be a positive number"));
        }
        for (kind, timeouts) in &self.timeouts {
            if [timeouts.create, timeouts.update, timeouts.delete].contains(&Some(0)) {
                return Err(invalid(
                    &format!("timeouts.{}", kind),
                    "timeouts must be greater than zero",
                ));
            }
        }
        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        message: message.to_string(),
    }
}
