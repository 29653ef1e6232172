use std::path::PathBuf;

/// Errors that can occur when configuring or writing through the logger.
///
/// Configuration errors (`Invalid*`) are returned by constructors and
/// setters and leave the previous configuration untouched. Storage errors
/// are returned by the rotation engine; the [`Logger`](crate::Logger) facade
/// reports them on stderr instead of propagating them.
#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("Invalid filename '{0}': expected letters, digits or '_' followed by .log or .txt")]
    InvalidFilename(String),
    #[error("Invalid path folder '{0}'")]
    InvalidFolder(String),
    #[error("Invalid max_entries: must be greater than zero")]
    InvalidMaxEntries,
    #[error("Invalid log format '{0}': the format must contain at least one of %timestamp%, %level%, %message%")]
    InvalidFormat(String),
    #[error("Invalid log level '{0}'")]
    InvalidLevel(String),
    #[error("Failed to create directory '{0}': {1}")]
    CreateDirectoryFailed(PathBuf, String),
    #[error("Failed to create file '{0}': {1}")]
    CreateFileFailed(PathBuf, String),
    #[error("Failed to remove log file '{0}': {1}")]
    RemoveFileFailed(PathBuf, String),
    #[error("Failed to compress log file '{path}': {error}")]
    CompressFailed { path: PathBuf, error: String },
    #[error("Failed to set file permissions for '{path}': {error}")]
    SetFilePermissionsError { path: PathBuf, error: String },
    #[error("No log file is open")]
    NoFileOpen,
    #[error("Log file has been closed")]
    Closed,
    #[error("Global logger is already initialized")]
    AlreadyInitialized,
    #[error("File IO error: {0}")]
    FileIOError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(String),
}
