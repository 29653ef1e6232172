//! # rotalog
//!
//! rotalog is a leveled logger that writes to the console and to a bounded
//! set of numbered log files. Files are named `#<index><filename>`, for
//! example `#0app.log`, `#1app.log`. **When the active file holds the
//! configured number of entries, the next entry goes to a fresh file at the
//! next index, and once the configured number of files is exceeded the
//! oldest one is deleted.** Files left behind by an earlier run are picked up
//! on start, so restarts continue where the previous process stopped.
//!
//! The console and the file sink each have their own level threshold and
//! can be switched off independently. Lines are rendered from a template
//! containing `%timestamp%`, `%level%` and `%message%` placeholders.
//!
//!
//! ## Example
//!
//! ```rust,no_run
//! use rotalog::{Level, LoggerBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!    let mut logger = LoggerBuilder::new("./logs", "app.log")
//!        .max_entries(1000) // Rotate after 1000 entries
//!        .max_files(5) // Keep at most 5 files
//!        .file_level(Level::Warning)
//!        .format("[%timestamp%] %level%: %message%")
//!        .build()?;
//!
//!    logger.info("This is an info message");
//!    logger.warning("This is a warning message");
//!    logger.error("This is an error message");
//!
//!    Ok(())
//! }
//! ```
//!
//! The rotation engine on its own is an [`std::io::Write`] appender and can
//! sit behind `tracing_appender::non_blocking`; see
//! [`LoggerBuilder::build_appender`].
mod error;
mod format;
pub mod global;
mod level;
mod logger;
mod roller;
pub mod validate;

pub use {
    error::LoggerError,
    format::{format_timestamp, Template, TimeZone, DEFAULT_FORMAT, LEVEL_TOKEN, MESSAGE_TOKEN, TIMESTAMP_TOKEN},
    level::Level,
    logger::{Logger, LoggerBuilder, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_FILES},
    roller::{Compression, RotatingFile},
};
