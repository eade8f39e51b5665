use log::{LevelFilter, Log, Metadata, Record};

/// Log levels, from quietest to noisiest
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Nothing = 0,
    User = 1,
    Error = 2,
    Warning = 3,
    Info = 4,
    Debug = 5,
    All = 6,
}

impl LogLevel {
    /// Create a LogLevel from an integer
    pub fn from_i32(level: i32) -> Self {
        match level {
            0 => LogLevel::Nothing,
            1 => LogLevel::User,
            2 => LogLevel::Error,
            3 => LogLevel::Warning,
            4 => LogLevel::Info,
            5 => LogLevel::Debug,
            6 => LogLevel::All,
            _ => LogLevel::Info,
        }
    }

    /// Parse a level name or number, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i32>() {
            return (0..=6).contains(&n).then(|| Self::from_i32(n));
        }
        match s.to_ascii_lowercase().as_str() {
            "nothing" | "off" | "none" => Some(LogLevel::Nothing),
            "user" => Some(LogLevel::User),
            "error" => Some(LogLevel::Error),
            "warning" | "warn" => Some(LogLevel::Warning),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "all" | "trace" => Some(LogLevel::All),
            _ => None,
        }
    }

    /// Matching filter for the `log` facade
    ///
    /// `User` messages are always shown, so it maps to `Error`.
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Nothing => LevelFilter::Off,
            LogLevel::User | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::All => LevelFilter::Trace,
        }
    }
}

/// Writes every enabled record to stderr
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Initialize the logging system
///
/// Installs the stderr logger on first use; later calls only change the
/// level.
pub fn init(level: LogLevel) {
    // Err: a logger is already installed
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level.to_level_filter());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_log_level_from_i32() {
        assert_eq!(LogLevel::from_i32(0), LogLevel::Nothing);
        assert_eq!(LogLevel::from_i32(1), LogLevel::User);
        assert_eq!(LogLevel::from_i32(2), LogLevel::Error);
        assert_eq!(LogLevel::from_i32(3), LogLevel::Warning);
        assert_eq!(LogLevel::from_i32(4), LogLevel::Info);
        assert_eq!(LogLevel::from_i32(5), LogLevel::Debug);
        assert_eq!(LogLevel::from_i32(6), LogLevel::All);
    }

    #[test]
    fn test_log_level_invalid() {
        // Invalid values should default to Info
        assert_eq!(LogLevel::from_i32(100), LogLevel::Info);
        assert_eq!(LogLevel::from_i32(-1), LogLevel::Info);
    }

    #[rstest]
    #[case("debug", Some(LogLevel::Debug))]
    #[case("WARN", Some(LogLevel::Warning))]
    #[case(" Error ", Some(LogLevel::Error))]
    #[case("off", Some(LogLevel::Nothing))]
    #[case("5", Some(LogLevel::Debug))]
    #[case("9", None)]
    #[case("loud", None)]
    fn test_log_level_parse(#[case] input: &str, #[case] expected: Option<LogLevel>) {
        assert_eq!(LogLevel::parse(input), expected);
    }

    #[rstest]
    #[case(LogLevel::Nothing, LevelFilter::Off)]
    #[case(LogLevel::User, LevelFilter::Error)]
    #[case(LogLevel::Warning, LevelFilter::Warn)]
    #[case(LogLevel::Debug, LevelFilter::Debug)]
    #[case(LogLevel::All, LevelFilter::Trace)]
    fn test_level_filter(#[case] level: LogLevel, #[case] expected: LevelFilter) {
        assert_eq!(level.to_level_filter(), expected);
    }

    #[test]
    fn test_init_is_idempotent() {
        init(LogLevel::Debug);
        init(LogLevel::Warning);
        log::debug!("suppressed");
        log::warn!("shown");
    }
}
