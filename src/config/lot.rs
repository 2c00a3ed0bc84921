//! Parking lot configuration.

use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::AppResult;

/// Environment variable holding the number of slots.
pub const ENV_MAX_SLOT: &str = "PARKING_MAX_SLOT";
/// Environment variable holding the number of entry gates.
pub const ENV_ENTRY_COUNT: &str = "PARKING_ENTRY_COUNT";
/// Environment variable holding the number of exit gates.
pub const ENV_EXIT_COUNT: &str = "PARKING_EXIT_COUNT";
/// Optional override for the per-notification sink budget.
pub const ENV_SINK_TIMEOUT_MS: &str = "PARKING_SINK_TIMEOUT_MS";
/// Optional override for the default shutdown budget.
pub const ENV_SHUTDOWN_TIMEOUT_SECS: &str = "PARKING_SHUTDOWN_TIMEOUT_SECS";

const DEFAULT_SINK_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = DEFAULT_SHUTDOWN_TIMEOUT_SECS * 1_000;
const DEFAULT_STACK_SIZE: usize = 256 * 1024;

/// Allocator configuration, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotConfig {
    /// Number of slots.
    pub capacity: usize,
    /// Number of entry gates.
    pub entry_count: usize,
    /// Number of exit gates.
    pub exit_count: usize,
    /// Budget for one sink notification, in milliseconds.
    #[serde(default = "default_sink_timeout_ms")]
    pub sink_timeout_ms: u64,
    /// Default budget for [`LotAllocator::shutdown_default`](crate::core::LotAllocator::shutdown_default),
    /// in milliseconds.
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
    /// Stack size for gate worker threads, in bytes.
    #[serde(default = "default_stack_size")]
    pub thread_stack_size: usize,
}

const fn default_sink_timeout_ms() -> u64 {
    DEFAULT_SINK_TIMEOUT_MS
}

const fn default_shutdown_timeout_ms() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_MS
}

const fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE
}

fn saturating_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

impl Default for LotConfig {
    fn default() -> Self {
        Self {
            capacity: 1,
            entry_count: 1,
            exit_count: 1,
            sink_timeout_ms: DEFAULT_SINK_TIMEOUT_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
            thread_stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl LotConfig {
    /// A one-slot, one-gate-each configuration to build on.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of slots.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the number of entry gates.
    #[must_use]
    pub const fn with_entry_count(mut self, entry_count: usize) -> Self {
        self.entry_count = entry_count;
        self
    }

    /// Set the number of exit gates.
    #[must_use]
    pub const fn with_exit_count(mut self, exit_count: usize) -> Self {
        self.exit_count = exit_count;
        self
    }

    /// Set the sink notification budget.
    #[must_use]
    pub fn with_sink_timeout(mut self, timeout: Duration) -> Self {
        self.sink_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Set the default shutdown budget. `Duration::MAX` waits indefinitely.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout_ms = saturating_millis(timeout);
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_thread_stack_size(mut self, bytes: usize) -> Self {
        self.thread_stack_size = bytes;
        self
    }

    /// Sink notification budget as a `Duration`.
    #[must_use]
    pub const fn sink_timeout(&self) -> Duration {
        Duration::from_millis(self.sink_timeout_ms)
    }

    /// Default shutdown budget as a `Duration`.
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Total number of gates, both directions.
    #[must_use]
    pub const fn gate_count(&self) -> usize {
        self.entry_count + self.exit_count
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Describes the first offending field.
    pub fn validate(&self) -> Result<(), String> {
        if self.capacity == 0 {
            return Err("capacity must be greater than 0".into());
        }
        if self.entry_count == 0 {
            return Err("entry_count must be at least 1".into());
        }
        if self.exit_count == 0 {
            return Err("exit_count must be at least 1".into());
        }
        if self.sink_timeout_ms == 0 {
            return Err("sink_timeout_ms must be greater than 0".into());
        }
        if self.shutdown_timeout_ms == 0 {
            return Err("shutdown_timeout_ms must be greater than 0".into());
        }
        if self.thread_stack_size < 16 * 1024 {
            return Err("thread_stack_size must be at least 16 KiB".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Parse failures and validation failures, as text.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, after merging any
    /// `.env` file found in the working directory or its parents.
    ///
    /// # Errors
    ///
    /// A required variable is missing, a value is not a number, or the
    /// result fails validation.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env file is normal; real variables still apply.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup using the
    /// `PARKING_*` variable names.
    ///
    /// # Errors
    ///
    /// Same as [`LotConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> AppResult<usize> {
            let raw = lookup(key).with_context(|| format!("{key} is not set"))?;
            raw.trim()
                .parse()
                .with_context(|| format!("{key}={raw:?} is not a non-negative integer"))
        };
        let optional = |key: &str, default: u64| -> AppResult<u64> {
            lookup(key).map_or(Ok(default), |raw| {
                raw.trim()
                    .parse()
                    .with_context(|| format!("{key}={raw:?} is not a non-negative integer"))
            })
        };

        let cfg = Self {
            capacity: required(ENV_MAX_SLOT)?,
            entry_count: required(ENV_ENTRY_COUNT)?,
            exit_count: required(ENV_EXIT_COUNT)?,
            sink_timeout_ms: optional(ENV_SINK_TIMEOUT_MS, DEFAULT_SINK_TIMEOUT_MS)?,
            shutdown_timeout_ms: optional(ENV_SHUTDOWN_TIMEOUT_SECS, DEFAULT_SHUTDOWN_TIMEOUT_SECS)?
                .saturating_mul(1_000),
            thread_stack_size: DEFAULT_STACK_SIZE,
        };
        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}
