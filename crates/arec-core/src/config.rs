//! Configuration types for the arec system
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main arec configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// The record to keep in sync
    pub record: RecordConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration for one record with default engine settings
    pub fn new(record: RecordConfig) -> Self {
        Self {
            record,
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.record.validate()?;
        self.engine.validate()?;
        Ok(())
    }
}

/// DNS record configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Zone (domain) the record lives in, e.g. "example.com"
    pub zone_name: String,

    /// Fully-qualified record name, e.g. "home.example.com"
    pub name: String,

    /// TTL used when the record has to be created
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl RecordConfig {
    /// Create a new record configuration with the default TTL
    ///
    /// A single trailing root dot is dropped from both names; the API only
    /// matches the relative form.
    pub fn new(zone_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            zone_name: strip_root_dot(zone_name.into()),
            name: strip_root_dot(name.into()),
            ttl: default_ttl(),
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_name.is_empty() {
            return Err(crate::Error::config("Zone name cannot be empty"));
        }
        if self.name.is_empty() {
            return Err(crate::Error::config("Record name cannot be empty"));
        }

        let zone = self.zone_name.trim_end_matches('.').to_ascii_lowercase();
        let name = self.name.trim_end_matches('.').to_ascii_lowercase();
        if name != zone && !name.ends_with(&format!(".{zone}")) {
            return Err(crate::Error::config(format!(
                "Record {} is not inside zone {}",
                self.name, self.zone_name
            )));
        }

        if self.ttl == 0 {
            return Err(crate::Error::config("Record TTL must be > 0"));
        }

        Ok(())
    }
}

fn strip_root_dot(mut name: String) -> String {
    if name.ends_with('.') {
        name.pop();
    }
    name
}

fn default_ttl() -> u32 {
    60
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds between reconciliation ticks
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Upper bound for a single reconciliation cycle (in seconds)
    ///
    /// Kept well below `interval_secs`; a cycle that runs past a tick makes
    /// that tick get skipped rather than queued.
    #[serde(default = "default_cycle_timeout_secs")]
    pub cycle_timeout_secs: u64,

    /// Upper bound for a single bootstrap attempt (in seconds)
    #[serde(default = "default_bootstrap_timeout_secs")]
    pub bootstrap_timeout_secs: u64,

    /// Fixed delay between failed bootstrap attempts (in seconds)
    #[serde(default = "default_bootstrap_retry_delay_secs")]
    pub bootstrap_retry_delay_secs: u64,

    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == 0 {
            return Err(crate::Error::config("Update interval must be > 0"));
        }
        if self.cycle_timeout_secs == 0 {
            return Err(crate::Error::config("Cycle timeout must be > 0"));
        }
        if self.bootstrap_timeout_secs == 0 {
            return Err(crate::Error::config("Bootstrap timeout must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_secs)
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_secs(self.bootstrap_timeout_secs)
    }

    pub fn bootstrap_retry_delay(&self) -> Duration {
        Duration::from_secs(self.bootstrap_retry_delay_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            cycle_timeout_secs: default_cycle_timeout_secs(),
            bootstrap_timeout_secs: default_bootstrap_timeout_secs(),
            bootstrap_retry_delay_secs: default_bootstrap_retry_delay_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_cycle_timeout_secs() -> u64 {
    30
}

fn default_bootstrap_timeout_secs() -> u64 {
    30
}

fn default_bootstrap_retry_delay_secs() -> u64 {
    60
}

fn default_event_channel_capacity() -> usize {
    100
}
