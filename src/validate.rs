//! Input validation for file names and folders.
use {
    crate::LoggerError,
    regex::Regex,
    std::path::Path,
};

const FILENAME_PATTERN: &str = r"^[A-Za-z0-9_]+\.(log|txt)$";
// Printable ASCII only, with at least one word character somewhere.
const FOLDER_PATTERN: &str = r"^[\x20-\x7E]*[A-Za-z0-9_][\x20-\x7E]*$";

/// Check that `filename` is a bare stem such as `app.log` or `trace_01.txt`.
pub fn check_filename(filename: &str) -> Result<(), LoggerError> {
    let pattern = Regex::new(FILENAME_PATTERN).map_err(|err| LoggerError::InternalError(err.to_string()))?;
    if pattern.is_match(filename) {
        Ok(())
    } else {
        Err(LoggerError::InvalidFilename(filename.to_string()))
    }
}

/// Check a log folder. An empty folder means the current directory.
pub fn check_folder(folder: &str) -> Result<(), LoggerError> {
    if folder.is_empty() {
        return Ok(());
    }
    let pattern = Regex::new(FOLDER_PATTERN).map_err(|err| LoggerError::InternalError(err.to_string()))?;
    if !folder.trim().is_empty() && pattern.is_match(folder) {
        Ok(())
    } else {
        Err(LoggerError::InvalidFolder(folder.to_string()))
    }
}

/// View a folder path as text for validation. Non UTF-8 paths are rejected.
pub fn folder_str(folder: &Path) -> Result<&str, LoggerError> {
    folder
        .to_str()
        .ok_or_else(|| LoggerError::InvalidFolder(folder.to_string_lossy().to_string()))
}

/// Validate the `(filename, folder, max_entries)` triple used by
/// constructors and [`Logger::set_filename`](crate::Logger::set_filename).
pub fn check_target(filename: &str, folder: &str, max_entries: u64) -> Result<(), LoggerError> {
    check_filename(filename)?;
    check_folder(folder)?;
    if max_entries == 0 {
        return Err(LoggerError::InvalidMaxEntries);
    }
    Ok(())
}
