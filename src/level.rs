use {
    crate::LoggerError,
    std::{fmt, str::FromStr},
};

/// Severity of a log message.
///
/// Levels are ordered `Debug < Info < Warning < Error`. A sink accepts a
/// message when the message level is greater than or equal to the sink's
/// threshold.
///
/// # Examples
/// ```
/// use rotalog::Level;
///
/// assert!(Level::Warning >= Level::Info);
/// assert_eq!(Level::Error.rank(), 3);
/// assert_eq!("warning".parse::<Level>().unwrap(), Level::Warning);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    /// Diagnostic detail, rank 0.
    #[default]
    Debug,
    /// Normal operation, rank 1.
    Info,
    /// Something unexpected that the program recovered from, rank 2.
    Warning,
    /// A failure, rank 3.
    Error,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Level; 4] = [Level::Debug, Level::Info, Level::Warning, Level::Error];

    /// Integer rank of the level, 0 to 3.
    pub fn rank(self) -> u8 {
        self as u8
    }

    /// Label substituted for `%level%`.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
        }
    }

    /// Whether a message at this level passes a sink threshold.
    pub fn passes(self, threshold: Level) -> bool {
        self >= threshold
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Level::Debug),
            "INFO" => Ok(Level::Info),
            "WARN" | "WARNING" => Ok(Level::Warning),
            "ERROR" => Ok(Level::Error),
            _ => Err(LoggerError::InvalidLevel(s.to_string())),
        }
    }
}
