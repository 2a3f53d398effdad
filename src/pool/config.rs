use crate::error::ImpalaError;
use serde::Deserialize;
use std::time::Duration;

/// Pool sizing and timing.
///
/// Durations are milliseconds so they map directly onto config files and
/// environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_max")]
    pub max: usize,
    #[serde(default)]
    pub min: usize,
    #[serde(default = "default_eviction_run_interval_ms")]
    pub eviction_run_interval_ms: u64,
    #[serde(default = "default_idle_timeout_ms")]
    pub soft_idle_timeout_ms: u64,
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    #[serde(default = "default_evictions_per_run")]
    pub evictions_per_run: usize,
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

fn default_max() -> usize {
    20
}

fn default_eviction_run_interval_ms() -> u64 {
    10_000
}

fn default_idle_timeout_ms() -> u64 {
    9_000
}

fn default_acquire_timeout_ms() -> u64 {
    10_000
}

fn default_evictions_per_run() -> usize {
    3
}

fn default_drain_timeout_ms() -> u64 {
    30_000
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max: default_max(),
            min: 0,
            eviction_run_interval_ms: default_eviction_run_interval_ms(),
            soft_idle_timeout_ms: default_idle_timeout_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
            evictions_per_run: default_evictions_per_run(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ImpalaError> {
        if self.max == 0 {
            return Err(ImpalaError::Config("pool.max must be at least 1".to_string()));
        }
        if self.min > self.max {
            return Err(ImpalaError::Config(format!(
                "pool.min ({}) cannot exceed pool.max ({})",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn soft_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.soft_idle_timeout_ms)
    }

    pub fn eviction_run_interval(&self) -> Duration {
        Duration::from_millis(self.eviction_run_interval_ms)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}
