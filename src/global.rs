//! A process-wide default [`Logger`].
//!
//! The core types never touch this module; it only exists for applications
//! that want free logging functions instead of passing a `Logger` around.
//! Calls made before [`init`] are ignored.
//!
//! ```no_run
//! use rotalog::{global, LoggerBuilder};
//!
//! global::init_or_exit(LoggerBuilder::new("logs", "service.log").max_files(3));
//! global::info("service started");
//! ```
use {
    crate::{Level, Logger, LoggerBuilder, LoggerError},
    std::sync::{Mutex, OnceLock, PoisonError},
};

static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

/// Build and install the global logger.
pub fn init(builder: LoggerBuilder) -> Result<(), LoggerError> {
    if LOGGER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }
    let logger = builder.build()?;
    LOGGER
        .set(Mutex::new(logger))
        .map_err(|_| LoggerError::AlreadyInitialized)
}

/// Like [`init`], but a configuration error terminates the process with
/// exit code 1. Meant for `main`.
pub fn init_or_exit(builder: LoggerBuilder) {
    if let Err(err) = init(builder) {
        eprintln!("Failed to initialize logger: {}", err);
        std::process::exit(1);
    }
}

pub fn is_initialized() -> bool {
    LOGGER.get().is_some()
}

/// Run `f` against the global logger, `None` when it is not initialized.
pub fn with<R>(f: impl FnOnce(&mut Logger) -> R) -> Option<R> {
    LOGGER
        .get()
        .map(|logger| f(&mut logger.lock().unwrap_or_else(PoisonError::into_inner)))
}

pub fn log(level: Level, message: &str) {
    with(|logger| logger.log(level, message));
}

pub fn debug(message: &str) {
    log(Level::Debug, message)
}

pub fn info(message: &str) {
    log(Level::Info, message)
}

pub fn warning(message: &str) {
    log(Level::Warning, message)
}

pub fn error(message: &str) {
    log(Level::Error, message)
}
