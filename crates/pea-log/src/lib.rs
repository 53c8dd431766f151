//! Leveled logging and nested tracing for the Pea toolchain.
//!
//! Two facilities live here:
//!
//! - A process-wide logger with a minimum [`Level`], driven by the
//!   [`error!`], [`warn!`], [`info!`], [`debug!`] and [`trace!`] macros.
//!   Records go to standard error, tagged with the module path of the
//!   call site, so they never mix with a tool's regular output.
//! - A [`Tracer`]: an indenting trace printer that the checker threads
//!   through its recursive passes. It is switched on per session rather
//!   than by level, and each nested [`Tracer::enter`] indents the lines
//!   below it until the returned guard drops.
//!
//! # Example
//!
//! ```
//! use pea_log::{debug, info, Level};
//!
//! pea_log::set_level(Level::Debug);
//!
//! let module = "list";
//! info!("checking {}", module);
//! debug!("{} definitions", 12);
//! ```

mod tracer;

pub use tracer::{TraceGuard, Tracer};

use std::fmt::Arguments;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable consulted by [`init_from_env`].
pub const ENV_VAR: &str = "PEA_LOG";

/// Severity of a log record, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl Level {
    const ALL: [Level; 5] = [
        Level::Error,
        Level::Warn,
        Level::Info,
        Level::Debug,
        Level::Trace,
    ];

    const fn color_code(self) -> &'static str {
        match self {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[32m",
            Level::Debug => "\x1b[36m",
            Level::Trace => "\x1b[35m",
        }
    }

    /// Upper-case name of the level, as printed in log records.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    const fn from_u8(raw: u8) -> Level {
        match raw {
            0 => Level::Error,
            1 => Level::Warn,
            3 => Level::Debug,
            4 => Level::Trace,
            _ => Level::Info,
        }
    }

    /// Parses a level name, ignoring case.
    ///
    /// # Example
    ///
    /// ```
    /// use pea_log::Level;
    ///
    /// assert_eq!(Level::from_str("debug"), Ok(Level::Debug));
    /// assert!(Level::from_str("loud").is_err());
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, String> {
        Level::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("invalid log level: {s}"))
    }
}

/// The process-wide logger; obtain it with [`get_logger`].
pub struct Logger {
    level: AtomicU8,
}

impl Logger {
    const fn new(level: Level) -> Self {
        Logger {
            level: AtomicU8::new(level as u8),
        }
    }

    pub fn set_level(&self, level: Level) {
        self.level.store(level as u8, Ordering::SeqCst);
    }

    #[must_use]
    pub fn level(&self) -> Level {
        Level::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Reports whether a record at `level` passes the current filter.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        level as u8 <= self.level.load(Ordering::Relaxed)
    }
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

/// Returns the global logger, creating it at [`Level::Warn`] on first use.
pub fn get_logger() -> &'static Logger {
    LOGGER.get_or_init(|| Logger::new(Level::Warn))
}

/// Sets the minimum level of the global logger.
pub fn set_level(level: Level) {
    get_logger().set_level(level);
}

/// Sets the minimum level from a level name.
///
/// # Example
///
/// ```
/// pea_log::set_level_from_str("trace").unwrap();
/// assert!(pea_log::get_logger().enabled(pea_log::Level::Trace));
/// ```
pub fn set_level_from_str(s: &str) -> Result<(), String> {
    set_level(Level::from_str(s)?);
    Ok(())
}

/// Reads [`ENV_VAR`] and applies it if it names a level.
///
/// Returns the level that was applied, if any.
pub fn init_from_env() -> Option<Level> {
    let value = std::env::var(ENV_VAR).ok()?;
    let level = Level::from_str(&value).ok()?;
    set_level(level);
    Some(level)
}

#[doc(hidden)]
pub fn __log_with_target(level: Level, target: &str, args: Arguments<'_>) {
    if get_logger().enabled(level) {
        __write(level, target, args);
    }
}

/// Writes a record without consulting the level filter.
#[doc(hidden)]
pub fn __write(level: Level, target: &str, args: Arguments<'_>) {
    const RESET: &str = "\x1b[0m";
    let color = level.color_code();
    let name = level.as_str();
    eprintln!("{color}[{name}]{RESET} {target}: {args}");
}

/// Logs at an explicit level.
///
/// ```
/// use pea_log::{log, Level};
///
/// log!(level: Level::Info, "{} modules cached", 3);
/// ```
#[macro_export]
macro_rules! log {
    (level: $level:expr, $($arg:tt)*) => {{
        let level = $level;
        if $crate::get_logger().enabled(level) {
            $crate::__log_with_target(level, module_path!(), format_args!($($arg)*));
        }
    }};
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Error, $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Warn, $($arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Debug, $($arg)*)
    };
}

#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        $crate::log!(level: $crate::Level::Trace, $($arg)*)
    };
}
