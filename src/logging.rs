//! # Conditional logging and tracing setup.
//!
//! [`Logger`] carries the two process-wide switches (`verbose`, `debug`) fixed
//! at startup and routes formatted messages through [`tracing`]:
//!
//! | call        | emitted when | level   |
//! |-------------|--------------|---------|
//! | `logf`      | `verbose`    | `INFO`  |
//! | `debugf`    | `debug`      | `DEBUG` |
//! | `fatalf`    | always       | `ERROR`, then `exit(1)` |
//!
//! The [`logf!`](crate::logf), [`debugf!`](crate::debugf) and
//! [`fatalf!`](crate::fatalf) macros take `format!`-style arguments and only
//! format when the switch is on.
//!
//! [`init_tracing`] installs a subscriber once per process for binaries that
//! do not bring their own.

use std::fmt;
use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, fmt as tfmt, prelude::*};

use crate::config::Config;

/// Environment variable selecting JSON output in [`init_tracing`].
pub const LOG_FORMAT_ENV: &str = "HOSTLOOP_LOG_FORMAT";

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Conditional logger with switches fixed at construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Logger {
    verbose: bool,
    debug: bool,
}

impl Logger {
    /// Creates a logger with explicit switches.
    pub const fn new(verbose: bool, debug: bool) -> Self {
        Self { verbose, debug }
    }

    /// Creates a logger from the switches in `cfg`.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.verbose, cfg.debug)
    }

    /// True if `logf` emits.
    #[inline]
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// True if `debugf` emits.
    #[inline]
    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Emits `args` at info level when verbose is on.
    pub fn logf(&self, args: fmt::Arguments<'_>) {
        if self.verbose {
            tracing::info!(target: "hostloop", "{}", args);
        }
    }

    /// Emits `args` at debug level when debug is on.
    pub fn debugf(&self, args: fmt::Arguments<'_>) {
        if self.debug {
            tracing::debug!(target: "hostloop", "{}", args);
        }
    }

    /// Emits `args` at error level and terminates the process with status 1.
    ///
    /// Falls back to stderr when no subscriber is installed, since startup
    /// failures can happen before [`init_tracing`].
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        if has_subscriber() {
            tracing::error!(target: "hostloop", "{}", args);
        } else {
            eprintln!("[hostloop] fatal: {args}");
        }
        std::process::exit(1)
    }
}

/// True when the current dispatcher records events.
fn has_subscriber() -> bool {
    tracing::dispatcher::get_default(|d| !d.is::<tracing::subscriber::NoSubscriber>())
}

/// `format!`-style call to [`Logger::logf`].
///
/// ```
/// use hostloop::{Logger, logf};
///
/// let log = Logger::new(true, false);
/// logf!(log, "activity {} created", 7);
/// ```
#[macro_export]
macro_rules! logf {
    ($logger:expr, $($arg:tt)+) => {{
        let logger: &$crate::Logger = &$logger;
        if logger.is_verbose() {
            logger.logf(format_args!($($arg)+));
        }
    }};
}

/// `format!`-style call to [`Logger::debugf`].
#[macro_export]
macro_rules! debugf {
    ($logger:expr, $($arg:tt)+) => {{
        let logger: &$crate::Logger = &$logger;
        if logger.is_debug() {
            logger.debugf(format_args!($($arg)+));
        }
    }};
}

/// `format!`-style call to [`Logger::fatalf`]; never returns.
#[macro_export]
macro_rules! fatalf {
    ($logger:expr, $($arg:tt)+) => {{
        let logger: &$crate::Logger = &$logger;
        logger.fatalf(format_args!($($arg)+))
    }};
}

/// Initializes a tracing subscriber once for the process.
///
/// Filter defaults to `info` if `RUST_LOG` is unset. Output is compact text,
/// or JSON with `HOSTLOOP_LOG_FORMAT=json`.
pub fn init_tracing() {
    TRACING_INIT.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let json = std::env::var(LOG_FORMAT_ENV)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let result = if json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tfmt::layer().json())
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tfmt::layer().compact())
                .try_init()
        };

        if let Err(err) = result {
            eprintln!("tracing init skipped: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn fatal_output_goes_to_stderr_only_without_a_subscriber() {
        let none = tracing::Dispatch::none();
        assert!(!tracing::dispatcher::with_default(&none, has_subscriber));

        let registry = tracing::Dispatch::new(tracing_subscriber::registry());
        assert!(tracing::dispatcher::with_default(&registry, has_subscriber));
    }

    #[traced_test]
    #[test]
    fn logf_is_silent_when_verbose_is_off() {
        let log = Logger::new(false, true);
        for i in 0..5 {
            log.logf(format_args!("quiet-marker-{i}"));
            crate::logf!(log, "macro-quiet-{}", i);
        }
        assert!(!logs_contain("quiet-marker"));
        assert!(!logs_contain("macro-quiet"));
    }

    #[traced_test]
    #[test]
    fn logf_emits_every_call_when_verbose_is_on() {
        let log = Logger::new(true, false);
        for i in 0..5 {
            crate::logf!(log, "loud-marker-{}", i);
        }
        for i in 0..5 {
            assert!(logs_contain(&format!("loud-marker-{i}")));
        }
    }

    #[traced_test]
    #[test]
    fn debugf_follows_debug_switch() {
        Logger::new(true, false).debugf(format_args!("dbg-off"));
        Logger::new(false, true).debugf(format_args!("dbg-on"));
        assert!(!logs_contain("dbg-off"));
        assert!(logs_contain("dbg-on"));
    }

    #[test]
    fn from_config_copies_switches() {
        let cfg = Config {
            verbose: true,
            ..Config::default()
        };
        let log = Logger::from_config(&cfg);
        assert!(log.is_verbose());
        assert!(!log.is_debug());
    }
}
