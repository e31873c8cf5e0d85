//! Utilities: logging (dynamic level, stderr only) and monotonic timing.
//!
//! Key items:
//!   init_logging / derive_level
//!   log_error! / log_info! / log_debug! / log_trace!
//!   monotonic_ms

use std::sync::OnceLock;
use std::time::Instant;

/// Levelled logging for the `charm` binary.
///
/// Everything is written to stderr; stdout is reserved for rendered output
/// so `charm show ... --format json | jq` keeps working with `-vv`.
pub mod logging {
    use chrono::Local;
    use std::sync::atomic::{AtomicU8, Ordering};

    #[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
    pub enum LogLevel {
        Error = 0,
        Info = 1,
        Debug = 2,
        Trace = 3,
    }

    impl LogLevel {
        fn label(self) -> &'static str {
            match self {
                LogLevel::Error => "ERROR",
                LogLevel::Info => "INFO",
                LogLevel::Debug => "DEBUG",
                LogLevel::Trace => "TRACE",
            }
        }
    }

    // Info until `init_logging` runs.
    static MAX_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);

    /// Set the most verbose level that is still printed.
    pub fn init_logging(level: LogLevel) {
        MAX_LEVEL.store(level as u8, Ordering::Relaxed);
    }

    /// `-q` wins over any number of `-v`.
    pub fn derive_level(verbose: u8, quiet: bool) -> LogLevel {
        match (quiet, verbose) {
            (true, _) => LogLevel::Error,
            (false, 0) => LogLevel::Info,
            (false, 1) => LogLevel::Debug,
            (false, _) => LogLevel::Trace,
        }
    }

    pub fn enabled(level: LogLevel) -> bool {
        level as u8 <= MAX_LEVEL.load(Ordering::Relaxed)
    }

    pub fn log(level: LogLevel, msg: impl AsRef<str>) {
        if enabled(level) {
            let at = Local::now().format("%H:%M:%S%.3f");
            eprintln!("[{}][{at}] {}", level.label(), msg.as_ref());
        }
    }

    #[macro_export]
    macro_rules! log_error {
        ($($t:tt)*) => {
            $crate::utils::logging::log($crate::utils::logging::LogLevel::Error, format!($($t)*))
        };
    }
    #[macro_export]
    macro_rules! log_info {
        ($($t:tt)*) => {
            $crate::utils::logging::log($crate::utils::logging::LogLevel::Info, format!($($t)*))
        };
    }
    #[macro_export]
    macro_rules! log_debug {
        ($($t:tt)*) => {
            $crate::utils::logging::log($crate::utils::logging::LogLevel::Debug, format!($($t)*))
        };
    }
    #[macro_export]
    macro_rules! log_trace {
        ($($t:tt)*) => {
            $crate::utils::logging::log($crate::utils::logging::LogLevel::Trace, format!($($t)*))
        };
    }
}

pub use logging::{derive_level, init_logging};

/// Milliseconds since the first call (monotonic, not wall clock).
pub fn monotonic_ms() -> u128 {
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_millis()
}
