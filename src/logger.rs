use {
    crate::{
        format::DEFAULT_FORMAT,
        roller::RollerMeta,
        validate,
        Compression,
        Level,
        LoggerError,
        RotatingFile,
        Template,
        TimeZone,
    },
    std::{
        io::{self, Write as _},
        path::{Path, PathBuf},
    },
};

/// Entries per file used by [`LoggerBuilder`] unless configured.
pub const DEFAULT_MAX_ENTRIES: u64 = 1000;
/// Files kept by [`LoggerBuilder`] unless configured.
pub const DEFAULT_MAX_FILES: u64 = 5;

/// A leveled logger writing to the console and to a set of rotating files.
///
/// Each sink (console, file) has its own on/off switch and its own level
/// threshold. The file sink writes through a [`RotatingFile`], which rolls
/// over to `#<n+1><filename>` once a file holds `max_entries` entries and
/// deletes the oldest file once more than `max_files` files exist.
///
/// Storage problems never surface from the logging calls: they are reported
/// on stderr and the call returns.
///
/// # Examples
/// ```no_run
/// use rotalog::{Level, Logger};
///
/// let mut logger = Logger::new("app.log", "logs", 500, 3).unwrap();
/// logger.set_file_level(Level::Warning);
/// logger.info("console only");
/// logger.error("console and file");
/// logger.close();
/// ```
#[derive(Debug)]
pub struct Logger {
    roller: RotatingFile,
    console_level: Level,
    file_level: Level,
    template: Template,
    console: bool,
    file: bool,
    time_zone: TimeZone,
}

impl Logger {
    /// Create a logger writing `#<n><filename>` files into `folder`.
    ///
    /// An empty `folder` means the current directory. The folder is created
    /// when missing. `max_entries` must be positive; `max_files == 0` keeps
    /// every file.
    pub fn new<P: AsRef<Path>>(filename: &str, folder: P, max_entries: u64, max_files: u64) -> Result<Self, LoggerError> {
        LoggerBuilder::new(folder.as_ref(), Path::new(filename))
            .max_entries(max_entries)
            .max_files(max_files)
            .build()
    }

    /// Start configuring a logger.
    pub fn builder<P: AsRef<Path>>(folder: P, filename: P) -> LoggerBuilder {
        LoggerBuilder::new(folder, filename)
    }

    /// Record `message` at `level` on every enabled sink whose threshold it
    /// meets.
    pub fn log(&mut self, level: Level, message: &str) {
        if !self.file && !self.console {
            eprintln!("No log destination in use");
            return;
        }

        let to_file = self.file && level.passes(self.file_level);
        let to_console = self.console && level.passes(self.console_level);
        if !to_file && !to_console {
            return;
        }

        let line = self.template.render(&self.time_zone.timestamp(), level, message);
        if to_file {
            self.write_file(&line);
        }
        if to_console {
            write_console(&line);
        }
    }

    /// Record `message` at [`Level::Debug`].
    pub fn debug(&mut self, message: &str) {
        self.log(Level::Debug, message)
    }

    /// Record `message` at [`Level::Info`].
    pub fn info(&mut self, message: &str) {
        self.log(Level::Info, message)
    }

    /// Record `message` at [`Level::Warning`].
    pub fn warning(&mut self, message: &str) {
        self.log(Level::Warning, message)
    }

    /// Record `message` at [`Level::Error`].
    pub fn error(&mut self, message: &str) {
        self.log(Level::Error, message)
    }

    fn write_file(&mut self, line: &str) {
        match self.roller.append_line(line) {
            // Writes after close() are dropped quietly.
            Ok(()) | Err(LoggerError::Closed) => {}
            Err(err) => eprintln!("Error writing to file: {}", err),
        }
    }

    /// Set the threshold of both sinks.
    pub fn set_level(&mut self, level: Level) {
        self.console_level = level;
        self.file_level = level;
    }

    /// Set the lowest level printed to the console.
    pub fn set_console_level(&mut self, level: Level) {
        self.console_level = level;
    }

    /// Set the lowest level written to the log files.
    pub fn set_file_level(&mut self, level: Level) {
        self.file_level = level;
    }

    /// Replace the output template. A template with none of `%timestamp%`,
    /// `%level%` or `%message%` is rejected and the current one is kept.
    pub fn set_format(&mut self, format: &str) -> Result<(), LoggerError> {
        self.template = Template::new(format)?;
        Ok(())
    }

    /// Switch console output on or off.
    pub fn set_console_enabled(&mut self, enabled: bool) {
        self.console = enabled;
    }

    /// Switch file output on or off. The log file stays open either way.
    pub fn set_file_enabled(&mut self, enabled: bool) {
        self.file = enabled;
    }

    /// Set the time zone of the `%timestamp%` token.
    pub fn set_time_zone(&mut self, time_zone: TimeZone) {
        self.time_zone = time_zone;
    }

    /// Move logging to `folder/#<n><filename>` with a new entry limit.
    ///
    /// The inputs are validated first; on error nothing changes. Otherwise
    /// every file the logger currently tracks is deleted and logging starts
    /// over at `#0<filename>` in the new location. Numbered files already
    /// there are queued oldest first and evicted as usual. This also reopens
    /// a closed logger.
    ///
    /// # Arguments
    /// * `filename` - The new file name, such as `app.log`.
    /// * `folder` - The new folder, created when missing.
    /// * `max_entries` - The new per-file entry limit, must be positive.
    pub fn set_filename<P: AsRef<Path>>(&mut self, filename: &str, folder: P, max_entries: u64) -> Result<(), LoggerError> {
        let folder = folder.as_ref();
        validate::check_target(filename, validate::folder_str(folder)?, max_entries)?;

        let meta = RollerMeta {
            folder: folder.to_path_buf(),
            stem: filename.to_string(),
            max_entries,
            ..self.roller.meta().clone()
        };
        meta.create_folder()?;

        self.roller.remove_all();
        self.roller = RotatingFile::open_from_start(meta)?;
        Ok(())
    }

    /// Change the per-file entry limit; 0 turns rotation off. If the active
    /// file already holds that many entries, logging continues in a fresh
    /// file.
    pub fn set_max_entries(&mut self, max_entries: u64) {
        if let Err(err) = self.roller.set_max_entries(max_entries) {
            eprintln!("Error opening file: {}", err);
        }
    }

    /// Change how many files are kept; 0 keeps all of them. Applied the
    /// next time a file is added.
    pub fn set_max_files(&mut self, max_files: u64) {
        self.roller.set_max_files(max_files);
    }

    /// Release the log file. Later file writes are dropped; console output
    /// keeps working.
    pub fn close(&mut self) {
        if let Err(err) = self.roller.close() {
            eprintln!("{}", err);
        }
    }

    /// Get the console threshold.
    pub fn console_level(&self) -> Level {
        self.console_level
    }

    /// Get the file threshold.
    pub fn file_level(&self) -> Level {
        self.file_level
    }

    /// Get the active output template.
    pub fn format(&self) -> &str {
        self.template.as_str()
    }

    /// Whether console output is on.
    pub fn console_enabled(&self) -> bool {
        self.console
    }

    /// Whether file output is on.
    pub fn file_enabled(&self) -> bool {
        self.file
    }

    /// Get the time zone used for timestamps.
    pub fn time_zone(&self) -> TimeZone {
        self.time_zone
    }

    /// The rotation engine behind the file sink.
    pub fn rotating_file(&self) -> &RotatingFile {
        &self.roller
    }

    /// Get the file name shared by all numbered files.
    pub fn filename(&self) -> &str {
        self.roller.stem()
    }

    /// Get the folder holding the log files.
    pub fn folder(&self) -> &Path {
        self.roller.folder()
    }

    /// Get the per-file entry limit, 0 when rotation is off.
    pub fn max_entries(&self) -> u64 {
        self.roller.max_entries()
    }

    /// Get the number of files kept, 0 when unbounded.
    pub fn max_files(&self) -> u64 {
        self.roller.max_files()
    }

    /// Entries that still fit in the active file, `None` when rotation is
    /// off.
    pub fn remaining_capacity(&self) -> Option<u64> {
        self.roller.remaining_capacity()
    }

    /// Get the index `n` of the active file `#<n><filename>`.
    pub fn active_index(&self) -> u64 {
        self.roller.active_index()
    }

    /// Get the path of the active file.
    pub fn active_path(&self) -> PathBuf {
        self.roller.active_path()
    }

    /// Log files currently tracked, oldest first.
    pub fn queued_files(&self) -> Vec<PathBuf> {
        self.roller.queued_files().map(Path::to_path_buf).collect()
    }
}

fn write_console(line: &str) {
    let mut stdout = io::stdout().lock();
    if let Err(err) = writeln!(stdout, "{line}") {
        eprintln!("Error writing to console: {}", err);
    }
}

/// Provides a fluent interface for configuring [`Logger`] instances.
///
/// # Default Configuration
///
/// * 1000 entries per file, 5 files kept
/// * Console and file output enabled
/// * Console threshold `Debug`, file threshold `Info`
/// * Template `[%timestamp%] [%level%] %message%`
/// * Local time zone, no compression, default file permissions
///
/// # Examples
///
/// ```no_run
/// use rotalog::{Compression, Level, LoggerBuilder, TimeZone};
///
/// let logger = LoggerBuilder::new("./logs", "app.log")
///     .max_entries(10_000)
///     .max_files(7)
///     .file_level(Level::Warning)
///     .format("%timestamp% %level% | %message%")
///     .time_zone(TimeZone::UTC)
///     .compression(Compression::Gzip)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct LoggerBuilder {
    folder: PathBuf,
    filename: PathBuf,
    max_entries: u64,
    max_files: u64,
    console_level: Level,
    file_level: Level,
    format: String,
    console: bool,
    file: bool,
    time_zone: TimeZone,
    compression: Option<Compression>,
    file_mode: Option<u32>,
}

impl LoggerBuilder {
    /// Create a new logger builder.
    /// # Arguments
    /// * `folder` - The directory where the log files are stored. Empty means
    ///   the current directory.
    /// * `filename` - The name shared by all numbered log files, e.g. `app.log`.
    pub fn new<P: AsRef<Path>>(folder: P, filename: P) -> Self {
        LoggerBuilder {
            folder: folder.as_ref().to_path_buf(),
            filename: filename.as_ref().to_path_buf(),
            max_entries: DEFAULT_MAX_ENTRIES,
            max_files: DEFAULT_MAX_FILES,
            console_level: Level::Debug,
            file_level: Level::Info,
            format: DEFAULT_FORMAT.to_string(),
            console: true,
            file: true,
            time_zone: TimeZone::Local,
            compression: None,
            file_mode: None,
        }
    }

    /// Set the number of entries a file holds before rotation.
    pub fn max_entries(self, max_entries: u64) -> Self {
        Self { max_entries, ..self }
    }

    /// Set the maximum number of log files to keep. 0 keeps all of them.
    pub fn max_files(self, max_files: u64) -> Self {
        Self { max_files, ..self }
    }

    /// Set the threshold of both sinks.
    pub fn level(self, level: Level) -> Self {
        Self {
            console_level: level,
            file_level: level,
            ..self
        }
    }

    pub fn console_level(self, console_level: Level) -> Self {
        Self { console_level, ..self }
    }

    pub fn file_level(self, file_level: Level) -> Self {
        Self { file_level, ..self }
    }

    /// Set the output template. Validated by [`build`](Self::build).
    pub fn format<S: Into<String>>(self, format: S) -> Self {
        Self {
            format: format.into(),
            ..self
        }
    }

    pub fn console(self, console: bool) -> Self {
        Self { console, ..self }
    }

    pub fn file(self, file: bool) -> Self {
        Self { file, ..self }
    }

    /// Set the time zone used for `%timestamp%`.
    pub fn time_zone(self, time_zone: TimeZone) -> Self {
        Self { time_zone, ..self }
    }

    /// Compress files once they are rotated out.
    pub fn compression(self, compression: Compression) -> Self {
        Self {
            compression: Some(compression),
            ..self
        }
    }

    /// Set the file permissions for log files (Unix-like systems only).
    /// For example, 0o640 for rw-r----- permissions.
    pub fn file_mode(self, mode: u32) -> Self {
        Self {
            file_mode: Some(mode),
            ..self
        }
    }

    fn to_meta(&self) -> Result<RollerMeta, LoggerError> {
        let filename = self
            .filename
            .to_str()
            .ok_or_else(|| LoggerError::InvalidFilename(self.filename.to_string_lossy().to_string()))?;
        validate::check_target(filename, validate::folder_str(&self.folder)?, self.max_entries)?;
        Ok(RollerMeta {
            folder: self.folder.clone(),
            stem: filename.to_string(),
            max_entries: self.max_entries,
            max_files: self.max_files,
            compression: self.compression,
            file_mode: self.file_mode,
        })
    }

    /// Build the logger: validate, create the folder and open the first
    /// log file.
    pub fn build(self) -> Result<Logger, LoggerError> {
        let meta = self.to_meta()?;
        let template = Template::new(self.format)?;
        Ok(Logger {
            roller: RotatingFile::open(meta)?,
            console_level: self.console_level,
            file_level: self.file_level,
            template,
            console: self.console,
            file: self.file,
            time_zone: self.time_zone,
        })
    }

    /// Build only the rotation engine, for use as a plain appender. Level,
    /// format and console settings are ignored.
    pub fn build_appender(self) -> Result<RotatingFile, LoggerError> {
        RotatingFile::open(self.to_meta()?)
    }
}
