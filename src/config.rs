//! # Global runtime configuration.
//!
//! Provides [`Config`], the settings fixed once at startup and shared by the
//! channel registry, the logger and the supervisor.
//!
//! Config is used in three ways:
//! 1. **Channel construction**: `Runtime::new(config)` sizes the events channel
//! 2. **Logging switches**: `Logger::from_config(&config)`
//! 3. **Supervision**: restart/backoff defaults and stack buffer size
//!
//! ## Sentinel values
//! - `stack_buffer = 0` → [`DEFAULT_STACK_BUFFER`]
//! - `bus_capacity = 0` → clamped to 1
//! - `events_capacity = 0` → rejected by [`Config::validate`]

use crate::error::RuntimeError;
use crate::policies::{BackoffPolicy, RestartPolicy};
use crate::stacktrace::DEFAULT_STACK_BUFFER;

/// Number of events the events channel buffers before senders block.
pub const DEFAULT_EVENTS_CAPACITY: usize = 10;

/// Environment variable enabling [`Config::verbose`] in [`Config::from_env`].
pub const VERBOSE_ENV: &str = "HOSTLOOP_VERBOSE";

/// Environment variable enabling [`Config::debug`] in [`Config::from_env`].
pub const DEBUG_ENV: &str = "HOSTLOOP_DEBUG";

/// Global configuration for the hostloop runtime.
///
/// ## Field semantics
/// - `events_capacity`: Events channel buffer (must be > 0)
/// - `stack_buffer`: Initial stack capture buffer in bytes (`0` = default)
/// - `bus_capacity`: Supervision bus ring buffer size (min 1)
/// - `verbose`/`debug`: Logging switches, off by default
/// - `restart`: What the supervisor does after a failure batch
/// - `backoff`: Delay between relaunches
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the outbound events channel.
    ///
    /// Sends complete immediately while fewer than `events_capacity` events are
    /// pending and block afterwards until a receiver drains one.
    pub events_capacity: usize,

    /// Initial size of the stack capture buffer, doubled until the dump fits.
    pub stack_buffer: usize,

    /// Capacity of the supervision event bus.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` events skip
    /// the oldest ones.
    pub bus_capacity: usize,

    /// Enables `logf` output.
    pub verbose: bool,

    /// Enables `debugf` output.
    pub debug: bool,

    /// Decision policy applied after each control-loop termination.
    ///
    /// Defaults to [`RestartPolicy::Never`]: the supervisor gives up after the
    /// first failure batch.
    pub restart: RestartPolicy,

    /// Delay policy between relaunches.
    pub backoff: BackoffPolicy,
}

impl Config {
    /// Returns the default config with logging switches read from the environment.
    ///
    /// `HOSTLOOP_VERBOSE` and `HOSTLOOP_DEBUG` accept `1`, `true`, `yes`, `on`
    /// (case-insensitive); anything else leaves the switch off.
    pub fn from_env() -> Self {
        Self {
            verbose: env_flag(VERBOSE_ENV),
            debug: env_flag(DEBUG_ENV),
            ..Self::default()
        }
    }

    /// Checks values that cannot be clamped to something meaningful.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.events_capacity == 0 {
            return Err(RuntimeError::InvalidConfig {
                reason: "events_capacity must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the initial stack buffer size, falling back to the default for `0`.
    #[inline]
    pub fn stack_buffer_or_default(&self) -> usize {
        if self.stack_buffer == 0 {
            DEFAULT_STACK_BUFFER
        } else {
            self.stack_buffer
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `events_capacity = 10`
    /// - `stack_buffer = 10_000`
    /// - `bus_capacity = 1024`
    /// - `verbose = false`, `debug = false`
    /// - `restart = RestartPolicy::Never`
    /// - `backoff = BackoffPolicy::default()`
    fn default() -> Self {
        Self {
            events_capacity: DEFAULT_EVENTS_CAPACITY,
            stack_buffer: DEFAULT_STACK_BUFFER,
            bus_capacity: 1024,
            verbose: false,
            debug: false,
            restart: RestartPolicy::default(),
            backoff: BackoffPolicy::default(),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| parse_flag(&v)).unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_runtime_contract() {
        let cfg = Config::default();
        assert_eq!(cfg.events_capacity, 10);
        assert_eq!(cfg.stack_buffer_or_default(), 10_000);
        assert!(!cfg.verbose);
        assert!(!cfg.debug);
        assert!(matches!(cfg.restart, RestartPolicy::Never));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_events_capacity_is_rejected() {
        let cfg = Config {
            events_capacity: 0,
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.as_label(), "runtime_invalid_config");
    }

    #[test]
    fn sentinels_are_clamped() {
        let cfg = Config {
            stack_buffer: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.stack_buffer_or_default(), DEFAULT_STACK_BUFFER);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn flag_parsing() {
        for on in ["1", "true", "TRUE", " yes ", "On"] {
            assert!(parse_flag(on), "{on:?} should enable");
        }
        for off in ["", "0", "false", "nope"] {
            assert!(!parse_flag(off), "{off:?} should not enable");
        }
    }
}
