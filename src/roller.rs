use {
    crate::{validate, LoggerError},
    flate2::write::GzEncoder,
    regex::Regex,
    std::{
        collections::VecDeque,
        fs::{self, Permissions},
        io::{self, BufRead as _, Write as _},
        mem,
        path::{Path, PathBuf},
        time::SystemTime,
    },
};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Specifies the compression algorithm applied to a log file once it has
/// been rotated out.
///
/// The archive replaces the rotated file in the file queue, so it counts
/// against `max_files` and is evicted in the same order the plain file
/// would have been.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Gzip compression. Archives get the `.gz` extension.
    Gzip,
    /// XZ (LZMA2) compression. Slower, usually smaller. Archives get the
    /// `.xz` extension.
    XZ,
}

impl Compression {
    /// Get the extension for the compressed log file.
    fn get_extension(&self) -> &'static str {
        match self {
            Compression::Gzip => "gz",
            Compression::XZ => "xz",
        }
    }
}

/// Metadata for the rotating file.
/// Everything here is configuration; runtime bookkeeping lives in
/// [`RollerState`].
#[derive(Debug, Clone)]
pub(crate) struct RollerMeta {
    /// The directory where the log files are stored. Empty means the
    /// current directory.
    pub(crate) folder: PathBuf,
    /// The validated file name shared by all numbered files.
    pub(crate) stem: String,
    /// Entries allowed per file before rotation. 0 disables rotation.
    pub(crate) max_entries: u64,
    /// Number of files kept on disk. 0 keeps every file.
    pub(crate) max_files: u64,
    /// Compression applied to rotated-out files.
    pub(crate) compression: Option<Compression>,
    /// The file permissions to set on newly created log files (Unix-like
    /// systems only), in octal notation such as 0o644.
    pub(crate) file_mode: Option<u32>,
}

/// Handle of the active log file.
#[derive(Debug)]
enum FileState {
    /// Nothing open yet, or the last open failed.
    Unopened,
    Open(fs::File),
    /// Released by [`RotatingFile::close`]; writes are refused.
    Closed,
}

/// State for the rotating file.
#[derive(Debug)]
struct RollerState {
    /// Index of the active file, `#<index><stem>`.
    index: u64,
    /// Known log files, oldest first. The active file is the tail.
    queue: VecDeque<PathBuf>,
    /// Entries in the active file, including lines found when it was
    /// opened.
    entries: u64,
    /// The last write ended without a newline. The next write continues
    /// that entry in the same file.
    mid_line: bool,
    file: FileState,
}

/// The rotation engine: a set of numbered log files `#0app.log`,
/// `#1app.log`, ... where one file receives writes at a time.
///
/// Once the active file holds `max_entries` entries the next write rotates
/// to the next index. Before a file is added, the oldest queued files are
/// deleted until at most `max_files` remain.
///
/// `RotatingFile` implements [`io::Write`], so it can be used directly as an
/// appender. Each line is one entry: it is counted when its first byte is
/// written, however many `write` calls it takes, and rotation only happens
/// between lines.
///
/// # Examples
/// ```no_run
/// use rotalog::LoggerBuilder;
/// use std::io::Write;
///
/// let mut appender = LoggerBuilder::new("./logs", "raw.log")
///     .max_entries(1000)
///     .max_files(5)
///     .build_appender()
///     .unwrap();
/// for i in 0..3 {
///     writeln!(appender, "entry {i}").unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct RotatingFile {
    meta: RollerMeta,
    state: RollerState,
}

impl RollerMeta {
    /// Path of the file with the given index.
    pub(crate) fn log_path(&self, index: u64) -> PathBuf {
        self.folder.join(format!("#{index}{}", self.stem))
    }

    /// Index that follows `index`, wrapping at `max_files`.
    fn next_index(&self, index: u64) -> u64 {
        if self.max_files > 0 && index.saturating_add(1) >= self.max_files {
            0
        } else {
            index.saturating_add(1)
        }
    }

    /// Create the log folder if it does not exist. Only the last path
    /// component is created.
    pub(crate) fn create_folder(&self) -> Result<(), LoggerError> {
        if self.folder.as_os_str().is_empty() || self.folder.is_dir() {
            return Ok(());
        }
        fs::create_dir(&self.folder).map_err(|err| LoggerError::CreateDirectoryFailed(self.folder.clone(), err.to_string()))
    }

    /// Open a log file for appending, creating it when missing.
    fn create_log_file(&self, log_path: &Path) -> Result<fs::File, LoggerError> {
        let log_file = fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(log_path)
            .map_err(|err| LoggerError::CreateFileFailed(log_path.to_path_buf(), err.to_string()))?;

        self.set_permissions(log_path)?;

        Ok(log_file)
    }

    /// Set the permissions for a file based on the configured file mode.
    ///
    /// Does nothing when no mode is configured. On non-Unix systems a
    /// warning is printed instead, since the Unix permission model does not
    /// apply there.
    fn set_permissions(&self, path: &Path) -> Result<(), LoggerError> {
        if let Some(mode) = self.file_mode {
            #[cfg(unix)]
            {
                let perms = Permissions::from_mode(mode);
                fs::set_permissions(path, perms).map_err(|err| LoggerError::SetFilePermissionsError {
                    path: path.to_path_buf(),
                    error: err.to_string(),
                })?
            }
            #[cfg(not(unix))]
            {
                let _ = (mode, path);
                eprintln!("Warning: Setting file permissions is not supported on non-Unix platforms");
            }
        }
        Ok(())
    }

    /// List the numbered log files in the folder, oldest first.
    ///
    /// Matches `#<digits><stem>` with an optional compression extension.
    /// Files are ordered by modification time. Files sharing a timestamp are
    /// ordered the way rotation visits them; see [`order_same_time`].
    fn list_all_files(&self) -> Result<Vec<(u64, PathBuf)>, LoggerError> {
        let file_pattern = Regex::new(&format!(r"^#(\d+){}(\.gz|\.xz)?$", regex::escape(&self.stem)))
            .map_err(|err| LoggerError::InternalError(err.to_string()))?;

        let directory = if self.folder.as_os_str().is_empty() {
            Path::new(".")
        } else {
            self.folder.as_path()
        };
        let files = fs::read_dir(directory).map_err(|err| LoggerError::InternalError(err.to_string()))?;

        let mut all_log_files = Vec::new();
        for file in files.flatten() {
            let metadata = match file.metadata() {
                Ok(metadata) if metadata.is_file() => metadata,
                _ => continue,
            };
            let Some(file_name) = file.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let Some(index) = file_pattern
                .captures(&file_name)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
            else {
                continue;
            };
            all_log_files.push(FoundFile {
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                index,
                len: metadata.len(),
                path: self.folder.join(file_name),
            });
        }

        all_log_files.sort_by_key(|found| (found.modified, found.index));

        let mut start = 0;
        while start < all_log_files.len() {
            let modified = all_log_files[start].modified;
            let end = all_log_files[start..]
                .iter()
                .position(|found| found.modified != modified)
                .map_or(all_log_files.len(), |len| start + len);
            order_same_time(&mut all_log_files[start..end], self.max_files);
            start = end;
        }

        Ok(all_log_files
            .into_iter()
            .map(|found| (found.index, found.path))
            .collect())
    }

    /// Compress a rotated log file and remove the original.
    /// Returns the path of the archive.
    fn compress(&self, compression: Compression, log_path: &Path) -> Result<PathBuf, LoggerError> {
        let compressed_path = PathBuf::from(format!(
            "{}.{}",
            log_path.to_string_lossy(),
            compression.get_extension()
        ));
        let failed = |err: io::Error| LoggerError::CompressFailed {
            path: log_path.to_path_buf(),
            error: err.to_string(),
        };

        let infile = fs::File::open(log_path).map_err(failed)?;
        let mut reader = io::BufReader::new(infile);
        let outfile = fs::File::create(&compressed_path).map_err(failed)?;
        let mut writer = io::BufWriter::new(outfile);

        match compression {
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(writer, flate2::Compression::default());
                io::copy(&mut reader, &mut encoder).map_err(failed)?;
                encoder.finish().map_err(failed)?.flush().map_err(failed)?;
            }
            Compression::XZ => {
                lzma_rs::xz_compress(&mut reader, &mut writer).map_err(failed)?;
                writer.flush().map_err(failed)?;
            }
        }
        // Ensures compressed file has correct permissions.
        self.set_permissions(&compressed_path)?;

        fs::remove_file(log_path).map_err(failed)?;
        Ok(compressed_path)
    }
}

/// A numbered log file found in the folder.
#[derive(Debug)]
struct FoundFile {
    modified: SystemTime,
    index: u64,
    len: u64,
    path: PathBuf,
}

/// Order files that share a modification time, already sorted by index.
///
/// Rotation visits indices in a cycle of `max_files`, so the files written
/// within one timestamp form a run along that cycle and the oldest one
/// follows the widest gap between neighbouring indices. When several gaps
/// are equally wide, as on a full cycle, the newest file is taken to be the
/// shortest one, since only the newest file can be partly filled. Without a
/// ceiling indices never wrap and plain index order is kept.
///
/// # Arguments
/// * `files` - Files sharing one modification time, sorted by index.
/// * `max_files` - The file ceiling, 0 when unbounded.
fn order_same_time(files: &mut [FoundFile], max_files: u64) {
    if max_files == 0 || files.len() < 2 {
        return;
    }
    let count = files.len();
    let highest = files[count - 1].index;
    let cycle = max_files.max(highest.saturating_add(1));

    // gaps[i] is the distance from the previous file to files[i]; the
    // previous file of files[0] wraps around from the last one.
    let gaps: Vec<u64> = (0..count)
        .map(|i| match i {
            0 => cycle - highest + files[0].index,
            _ => files[i].index - files[i - 1].index,
        })
        .collect();
    let widest = gaps.iter().copied().max().unwrap_or(0);

    // Each candidate start makes the file before it the newest. Prefer the
    // shortest newest file, then the highest index.
    let start = (0..count)
        .filter(|&i| gaps[i] == widest)
        .min_by_key(|&i| {
            let newest = &files[(i + count - 1) % count];
            (newest.len, u64::MAX - newest.index)
        })
        .unwrap_or(0);
    files.rotate_left(start);
}

/// Count the lines already in a log file. A missing or unreadable file
/// counts as empty.
fn count_lines(log_path: &Path) -> u64 {
    match fs::File::open(log_path) {
        Ok(file) => io::BufReader::new(file)
            .split(b'\n')
            .map_while(Result::ok)
            .count() as u64,
        Err(_) => 0,
    }
}

/// Delete a file from storage. A file that is already gone is not an error.
fn remove_log_file(path: &Path) -> Result<(), LoggerError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(LoggerError::RemoveFileFailed(path.to_path_buf(), err.to_string())),
    }
}

impl RotatingFile {
    /// Open a rotating file in `folder` named `#<index><filename>`.
    ///
    /// `filename` must look like `app.log` or `app.txt`, `max_entries` must
    /// be positive. `max_files == 0` keeps every file.
    pub fn new<P: AsRef<Path>>(folder: P, filename: &str, max_entries: u64, max_files: u64) -> Result<Self, LoggerError> {
        let folder = folder.as_ref();
        validate::check_target(filename, validate::folder_str(folder)?, max_entries)?;
        Self::open(RollerMeta {
            folder: folder.to_path_buf(),
            stem: filename.to_string(),
            max_entries,
            max_files,
            compression: None,
            file_mode: None,
        })
    }

    /// Create the folder, pick up existing files and continue in the newest
    /// one.
    ///
    /// Only folder creation is fatal. Scan and open failures are reported
    /// and leave the engine without an open file; the next write retries.
    pub(crate) fn open(meta: RollerMeta) -> Result<Self, LoggerError> {
        Self::open_at(meta, true)
    }

    /// Like [`RotatingFile::open`], but logging starts over at `#0`. Files
    /// already in the folder are still queued for eviction.
    pub(crate) fn open_from_start(meta: RollerMeta) -> Result<Self, LoggerError> {
        Self::open_at(meta, false)
    }

    fn open_at(meta: RollerMeta, resume: bool) -> Result<Self, LoggerError> {
        meta.create_folder()?;

        let existing = meta.list_all_files().unwrap_or_else(|err| {
            eprintln!("Failed to read log files in '{}': {}", meta.folder.display(), err);
            Vec::new()
        });

        // Continue from the newest file. An archive is never appended to,
        // so resume right after it.
        let index = match existing.last() {
            Some((index, path)) if resume && meta.log_path(*index) == *path => *index,
            Some((index, _)) if resume => meta.next_index(*index),
            _ => 0,
        };
        let index = if meta.max_files > 0 && index >= meta.max_files { 0 } else { index };

        let mut roller = RotatingFile {
            state: RollerState {
                index,
                queue: existing.into_iter().map(|(_, path)| path).collect(),
                entries: 0,
                mid_line: false,
                file: FileState::Unopened,
            },
            meta,
        };
        if let Err(err) = roller.open_active(false) {
            eprintln!("Error opening file: {}", err);
        }
        Ok(roller)
    }

    /// Open the file at the current index.
    ///
    /// With `fresh` the file starts empty: a leftover file at that path is
    /// removed first. Otherwise it is appended to and its existing lines
    /// count against `max_entries`.
    fn open_active(&mut self, fresh: bool) -> Result<(), LoggerError> {
        let path = self.meta.log_path(self.state.index);

        let queued = self.state.queue.iter().position(|queued| *queued == path);
        if let Some(position) = queued {
            self.state.queue.remove(position);
        }
        if fresh {
            if let Err(err) = remove_log_file(&path) {
                eprintln!("Error deleting file: {}", err);
            }
        }

        if self.meta.max_files > 0 {
            while self.state.queue.len() as u64 >= self.meta.max_files {
                self.evict_oldest();
            }
        }
        self.state.queue.push_back(path.clone());

        self.state.entries = if fresh { 0 } else { count_lines(&path) };
        self.state.mid_line = false;
        self.state.file = FileState::Open(self.meta.create_log_file(&path)?);
        Ok(())
    }

    /// Delete the head of the queue. A failed delete is reported and the
    /// file is dropped from the queue anyway.
    fn evict_oldest(&mut self) {
        if let Some(path) = self.state.queue.pop_front() {
            if let Err(err) = remove_log_file(&path) {
                eprintln!("Error deleting file: {}", err);
            }
        }
    }

    /// Close the active file and continue in a fresh file at the next index.
    fn rotate(&mut self) -> Result<(), LoggerError> {
        let rotated_path = self.meta.log_path(self.state.index);
        if let FileState::Open(mut file) = mem::replace(&mut self.state.file, FileState::Unopened) {
            if let Err(err) = file.flush() {
                eprintln!("Failed to flush writer for '{}': {}", rotated_path.display(), err);
            }
        }

        if let Some(compression) = self.meta.compression {
            self.compress_rotated(compression, &rotated_path);
        }

        self.state.index = self.meta.next_index(self.state.index);
        self.state.entries = 0;
        self.open_active(true)
    }

    /// Replace a rotated file by its archive, keeping its queue position.
    fn compress_rotated(&mut self, compression: Compression, rotated_path: &Path) {
        let Some(position) = self.state.queue.iter().position(|queued| queued == rotated_path) else {
            return;
        };
        match self.meta.compress(compression, rotated_path) {
            Ok(archive) => {
                self.state.queue[position] = archive.clone();
                // An archive left over from an earlier cycle was overwritten.
                let mut seen = false;
                self.state.queue.retain(|queued| {
                    if *queued != archive {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            Err(err) => eprintln!("Failed to compress rotated log file: {}", err),
        }
    }

    /// Write a piece of at most one line.
    ///
    /// A piece that starts a line counts as a new entry and rotates first
    /// when the active file is full. A piece continuing a line goes to the
    /// same file uncounted.
    ///
    /// # Arguments
    /// * `piece` - Bytes with no newline except possibly the last one.
    fn write_piece(&mut self, piece: &[u8]) -> Result<(), LoggerError> {
        match self.state.file {
            FileState::Closed => return Err(LoggerError::Closed),
            FileState::Unopened => self.open_active(false)?,
            FileState::Open(_) => {}
        }

        let starts_entry = !self.state.mid_line;
        if starts_entry && self.remaining_capacity() == Some(0) {
            self.rotate()?;
        }

        let FileState::Open(file) = &mut self.state.file else {
            return Err(LoggerError::NoFileOpen);
        };
        file.write_all(piece)?;
        if starts_entry {
            self.state.entries += 1;
        }
        self.state.mid_line = !piece.ends_with(b"\n");
        Ok(())
    }

    /// Append `line` followed by a newline as one entry.
    ///
    /// # Arguments
    /// * `line` - The entry text, expected to hold no newline.
    pub fn append_line(&mut self, line: &str) -> Result<(), LoggerError> {
        let mut entry = String::with_capacity(line.len() + 1);
        entry.push_str(line);
        entry.push('\n');
        self.write_piece(entry.as_bytes())
    }

    /// Flush and release the active file. Later writes fail with
    /// [`LoggerError::Closed`].
    pub fn close(&mut self) -> Result<(), LoggerError> {
        if let FileState::Open(mut file) = mem::replace(&mut self.state.file, FileState::Closed) {
            file.flush()?;
        }
        Ok(())
    }

    /// Close the active file and delete every queued file.
    pub(crate) fn remove_all(&mut self) {
        if let Err(err) = self.close() {
            eprintln!("Failed to flush writer for '{}': {}", self.active_path().display(), err);
        }
        while !self.state.queue.is_empty() {
            self.evict_oldest();
        }
    }

    /// Change the per-file entry limit. 0 disables rotation.
    ///
    /// When the active file already holds at least `max_entries` entries the
    /// engine moves on to a fresh file right away, unless a line is still
    /// being written; that line ends in the current file and the next one
    /// rotates.
    pub fn set_max_entries(&mut self, max_entries: u64) -> Result<(), LoggerError> {
        self.meta.max_entries = max_entries;
        if max_entries > 0 && self.state.entries >= max_entries && self.is_open() && !self.state.mid_line {
            self.rotate()?;
        }
        Ok(())
    }

    /// Change the number of files kept. Applied at the next rotation.
    pub fn set_max_files(&mut self, max_files: u64) {
        self.meta.max_files = max_files;
    }

    pub(crate) fn meta(&self) -> &RollerMeta {
        &self.meta
    }

    /// Get the folder holding the log files.
    pub fn folder(&self) -> &Path {
        &self.meta.folder
    }

    /// Get the file name shared by all numbered files, without the
    /// `#<index>` prefix.
    pub fn stem(&self) -> &str {
        &self.meta.stem
    }

    /// Get the per-file entry limit, 0 when rotation is disabled.
    pub fn max_entries(&self) -> u64 {
        self.meta.max_entries
    }

    /// Get the number of files kept, 0 when unbounded.
    pub fn max_files(&self) -> u64 {
        self.meta.max_files
    }

    /// Get the compression applied to rotated files.
    pub fn compression(&self) -> Option<Compression> {
        self.meta.compression
    }

    /// Entries that still fit in the active file, `None` when rotation is
    /// disabled.
    pub fn remaining_capacity(&self) -> Option<u64> {
        (self.meta.max_entries > 0).then(|| self.meta.max_entries.saturating_sub(self.state.entries))
    }

    /// Entries written to the active file so far.
    pub fn entries(&self) -> u64 {
        self.state.entries
    }

    /// Get the index of the active file.
    pub fn active_index(&self) -> u64 {
        self.state.index
    }

    /// Get the path of the active file, `<folder>/#<index><stem>`.
    pub fn active_path(&self) -> PathBuf {
        self.meta.log_path(self.state.index)
    }

    /// Log files currently tracked, oldest first.
    pub fn queued_files(&self) -> impl Iterator<Item = &Path> {
        self.state.queue.iter().map(PathBuf::as_path)
    }

    /// Whether a log file is currently open for writing.
    pub fn is_open(&self) -> bool {
        matches!(self.state.file, FileState::Open(_))
    }

    /// Whether [`RotatingFile::close`] was called. Writes are refused until
    /// the logger is pointed at a new file.
    pub fn is_closed(&self) -> bool {
        matches!(self.state.file, FileState::Closed)
    }
}

#[allow(clippy::io_other_error)]
impl io::Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for piece in buf.split_inclusive(|byte| *byte == b'\n') {
            self.write_piece(piece).map_err(|err| match err {
                LoggerError::FileIOError(err) => err,
                err => io::Error::new(io::ErrorKind::Other, err.to_string()),
            })?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.state.file {
            FileState::Open(file) => file.flush(),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::io::{Read as _, Write as _},
        tempfile::tempdir,
    };

    fn meta(folder: &Path, max_entries: u64, max_files: u64) -> RollerMeta {
        RollerMeta {
            folder: folder.to_path_buf(),
            stem: "test.log".to_string(),
            max_entries,
            max_files,
            compression: None,
            file_mode: None,
        }
    }

    fn names(roller: &RotatingFile) -> Vec<String> {
        roller
            .queued_files()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_new_file_creation() {
        let temp_dir = tempdir().unwrap();
        let roller = RotatingFile::open(meta(temp_dir.path(), 100, 3)).unwrap();

        assert!(roller.is_open());
        assert_eq!(names(&roller), vec!["#0test.log"]);
        assert_eq!(roller.remaining_capacity(), Some(100));
        assert!(temp_dir.path().join("#0test.log").exists());
    }

    #[test]
    fn test_new_validates_input() {
        let temp_dir = tempdir().unwrap();
        assert!(matches!(
            RotatingFile::new(temp_dir.path(), "test/log", 10, 3),
            Err(LoggerError::InvalidFilename(_))
        ));
        assert!(matches!(
            RotatingFile::new(temp_dir.path(), "test.log", 0, 3),
            Err(LoggerError::InvalidMaxEntries)
        ));

        let roller = RotatingFile::new(temp_dir.path().join("sub"), "test.log", 10, 3).unwrap();
        assert!(temp_dir.path().join("sub").is_dir());
        assert_eq!(roller.stem(), "test.log");
        assert_eq!(roller.folder(), temp_dir.path().join("sub"));
        assert_eq!((roller.max_entries(), roller.max_files()), (10, 3));
        assert_eq!(roller.compression(), None);
    }

    #[test]
    fn test_missing_parent_folder_is_an_error() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        assert!(matches!(
            RotatingFile::new(&nested, "test.log", 10, 3),
            Err(LoggerError::CreateDirectoryFailed(..))
        ));
    }

    #[test]
    fn test_existing_file_is_appended() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("#0test.log"), "a\nb\nc\n").unwrap();

        let mut roller = RotatingFile::open(meta(temp_dir.path(), 10, 3)).unwrap();
        assert_eq!(names(&roller), vec!["#0test.log"]);
        assert_eq!(roller.entries(), 3);
        assert_eq!(roller.remaining_capacity(), Some(7));

        roller.append_line("d").unwrap();
        let content = fs::read_to_string(temp_dir.path().join("#0test.log")).unwrap();
        assert_eq!(content, "a\nb\nc\nd\n");
    }

    #[test]
    fn test_unrelated_files_are_ignored() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("other.log"), "x\n").unwrap();
        fs::write(temp_dir.path().join("#1other.log"), "x\n").unwrap();
        fs::write(temp_dir.path().join("#xtest.log"), "x\n").unwrap();
        fs::write(temp_dir.path().join("test.log"), "x\n").unwrap();

        let roller = RotatingFile::open(meta(temp_dir.path(), 10, 3)).unwrap();
        assert_eq!(names(&roller), vec!["#0test.log"]);
    }

    #[test]
    fn test_rotation_after_capacity() {
        let temp_dir = tempdir().unwrap();
        let mut roller = RotatingFile::open(meta(temp_dir.path(), 2, 0)).unwrap();

        for i in 0..5 {
            roller.append_line(&format!("entry {i}")).unwrap();
        }

        assert_eq!(roller.active_index(), 2);
        assert_eq!(names(&roller), vec!["#0test.log", "#1test.log", "#2test.log"]);
        assert_eq!(fs::read_to_string(temp_dir.path().join("#0test.log")).unwrap(), "entry 0\nentry 1\n");
        assert_eq!(fs::read_to_string(temp_dir.path().join("#1test.log")).unwrap(), "entry 2\nentry 3\n");
        assert_eq!(fs::read_to_string(temp_dir.path().join("#2test.log")).unwrap(), "entry 4\n");
    }

    #[test]
    fn test_max_files_reached_on_open() {
        let temp_dir = tempdir().unwrap();
        for i in 0..3 {
            let mut f = fs::File::create(temp_dir.path().join(format!("#{i}test.log"))).unwrap();
            for _ in 0..10 {
                f.write_all(b"Test log entry\n").unwrap();
            }
        }

        let mut roller = RotatingFile::open(meta(temp_dir.path(), 10, 2)).unwrap();
        assert!(roller.is_open());
        assert!(roller.queued_files().count() <= 2);
        assert_eq!(roller.remaining_capacity(), Some(0));

        roller.append_line("next").unwrap();
        assert!(roller.queued_files().count() <= 2);
        assert_eq!(fs::read_to_string(roller.active_path()).unwrap(), "next\n");
    }

    #[test]
    fn test_ceiling_of_one_keeps_single_file() {
        let temp_dir = tempdir().unwrap();
        let mut roller = RotatingFile::open(meta(temp_dir.path(), 2, 1)).unwrap();
        for i in 0..5 {
            roller.append_line(&format!("entry {i}")).unwrap();
        }
        assert_eq!(names(&roller), vec!["#0test.log"]);
        assert_eq!(fs::read_to_string(temp_dir.path().join("#0test.log")).unwrap(), "entry 4\n");
    }

    #[test]
    fn test_remove_all() {
        let temp_dir = tempdir().unwrap();
        let mut roller = RotatingFile::open(meta(temp_dir.path(), 1, 0)).unwrap();
        for i in 0..3 {
            roller.append_line(&format!("entry {i}")).unwrap();
        }
        roller.state.queue.push_back(temp_dir.path().join("nonexistent.log"));

        roller.remove_all();
        assert_eq!(roller.queued_files().count(), 0);
        assert!(roller.is_closed());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_set_max_entries_starts_fresh_file() {
        let temp_dir = tempdir().unwrap();
        let mut roller = RotatingFile::open(meta(temp_dir.path(), 10, 5)).unwrap();
        for i in 0..4 {
            roller.append_line(&format!("entry {i}")).unwrap();
        }

        roller.set_max_entries(6).unwrap();
        assert_eq!(roller.active_index(), 0);
        assert_eq!(roller.remaining_capacity(), Some(2));

        roller.set_max_entries(3).unwrap();
        assert_eq!(roller.active_index(), 1);
        assert_eq!(roller.remaining_capacity(), Some(3));

        roller.set_max_entries(0).unwrap();
        assert_eq!(roller.remaining_capacity(), None);
    }

    #[test]
    fn test_close_refuses_writes() {
        let temp_dir = tempdir().unwrap();
        let mut roller = RotatingFile::open(meta(temp_dir.path(), 10, 5)).unwrap();
        roller.append_line("before").unwrap();
        roller.close().unwrap();

        assert!(matches!(roller.append_line("after"), Err(LoggerError::Closed)));
        assert_eq!(fs::read_to_string(temp_dir.path().join("#0test.log")).unwrap(), "before\n");
    }

    #[test]
    fn test_io_write_counts_lines() {
        let temp_dir = tempdir().unwrap();
        let mut roller = RotatingFile::open(meta(temp_dir.path(), 2, 0)).unwrap();
        roller.write_all(b"one\ntwo\nthree\n").unwrap();
        roller.flush().unwrap();

        assert_eq!(fs::read_to_string(temp_dir.path().join("#0test.log")).unwrap(), "one\ntwo\n");
        assert_eq!(fs::read_to_string(temp_dir.path().join("#1test.log")).unwrap(), "three\n");
    }

    #[test]
    fn test_formatted_writes_count_one_entry_per_line() {
        let temp_dir = tempdir().unwrap();
        let mut roller = RotatingFile::open(meta(temp_dir.path(), 2, 0)).unwrap();
        for i in 0..5 {
            writeln!(roller, "entry {i}").unwrap();
        }

        assert_eq!(names(&roller), vec!["#0test.log", "#1test.log", "#2test.log"]);
        assert_eq!(fs::read_to_string(temp_dir.path().join("#0test.log")).unwrap(), "entry 0\nentry 1\n");
        assert_eq!(fs::read_to_string(temp_dir.path().join("#1test.log")).unwrap(), "entry 2\nentry 3\n");
        assert_eq!(fs::read_to_string(temp_dir.path().join("#2test.log")).unwrap(), "entry 4\n");
        assert_eq!(roller.entries(), 1);
    }

    #[test]
    fn test_line_split_across_writes_stays_in_one_file() {
        let temp_dir = tempdir().unwrap();
        let mut roller = RotatingFile::open(meta(temp_dir.path(), 1, 0)).unwrap();
        roller.write_all(b"first").unwrap();
        roller.flush().unwrap();
        roller.write_all(b" half\nsec").unwrap();
        assert_eq!(roller.active_index(), 1);

        // A lower limit does not cut the open line.
        roller.set_max_entries(1).unwrap();
        assert_eq!(roller.active_index(), 1);
        roller.write_all(b"ond\n").unwrap();

        assert_eq!(fs::read_to_string(temp_dir.path().join("#0test.log")).unwrap(), "first half\n");
        assert_eq!(fs::read_to_string(temp_dir.path().join("#1test.log")).unwrap(), "second\n");
        assert_eq!(roller.entries(), 1);
    }

    #[test]
    fn test_failed_eviction_is_skipped() {
        let temp_dir = tempdir().unwrap();
        let blocked = temp_dir.path().join("#9test.log");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), "x").unwrap();

        let mut roller = RotatingFile::open(meta(temp_dir.path(), 1, 2)).unwrap();
        roller.state.queue.push_front(blocked.clone());
        roller.append_line("entry 0").unwrap();
        roller.append_line("entry 1").unwrap();

        // The directory cannot be deleted but still leaves the queue.
        assert!(blocked.is_dir());
        assert_eq!(names(&roller), vec!["#0test.log", "#1test.log"]);
        assert_eq!(fs::read_to_string(temp_dir.path().join("#1test.log")).unwrap(), "entry 1\n");

        roller.append_line("entry 2").unwrap();
        assert_eq!(names(&roller), vec!["#1test.log", "#0test.log"]);
        assert_eq!(fs::read_to_string(temp_dir.path().join("#0test.log")).unwrap(), "entry 2\n");
    }

    fn found(index: u64, len: u64) -> FoundFile {
        FoundFile {
            modified: SystemTime::UNIX_EPOCH,
            index,
            len,
            path: PathBuf::from(format!("#{index}test.log")),
        }
    }

    fn same_time_order(mut files: Vec<FoundFile>, max_files: u64) -> Vec<u64> {
        order_same_time(&mut files, max_files);
        files.iter().map(|found| found.index).collect()
    }

    #[test]
    fn test_same_time_files_follow_rotation_order() {
        // Wrapped cycle: #0 is the partly filled newest file.
        assert_eq!(same_time_order(vec![found(0, 8), found(1, 40), found(2, 40)], 3), vec![1, 2, 0]);
        // A gap in the cycle marks the oldest file.
        assert_eq!(same_time_order(vec![found(0, 40), found(3, 40), found(4, 40)], 5), vec![3, 4, 0]);
        // No wrap yet.
        assert_eq!(same_time_order(vec![found(0, 40), found(1, 40), found(2, 8)], 5), vec![0, 1, 2]);
        // Nothing to tell apart, index order.
        assert_eq!(same_time_order(vec![found(0, 40), found(1, 40), found(2, 40)], 3), vec![0, 1, 2]);
        // Unbounded ceiling never wraps.
        assert_eq!(same_time_order(vec![found(0, 8), found(1, 40)], 0), vec![0, 1]);
    }

    #[test]
    fn test_open_from_start_ignores_newest_file() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("#2test.log"), "old\n").unwrap();

        let roller = RotatingFile::open_from_start(meta(temp_dir.path(), 5, 3)).unwrap();
        assert_eq!(roller.active_index(), 0);
        assert_eq!(roller.entries(), 0);
        assert_eq!(names(&roller), vec!["#2test.log", "#0test.log"]);
    }

    #[test]
    fn test_gzip_rotated_files() {
        let temp_dir = tempdir().unwrap();
        let mut roller = RotatingFile::open(RollerMeta {
            compression: Some(Compression::Gzip),
            ..meta(temp_dir.path(), 2, 3)
        })
        .unwrap();
        for i in 0..3 {
            roller.append_line(&format!("entry {i}")).unwrap();
        }

        assert_eq!(names(&roller), vec!["#0test.log.gz", "#1test.log"]);
        assert!(!temp_dir.path().join("#0test.log").exists());

        let archive = fs::File::open(temp_dir.path().join("#0test.log.gz")).unwrap();
        let mut decoded = String::new();
        flate2::read::GzDecoder::new(archive).read_to_string(&mut decoded).unwrap();
        assert_eq!(decoded, "entry 0\nentry 1\n");

        // Archives are evicted like plain files.
        for i in 3..7 {
            roller.append_line(&format!("entry {i}")).unwrap();
        }
        assert_eq!(names(&roller), vec!["#1test.log.gz", "#2test.log.gz", "#0test.log"]);
        assert!(!temp_dir.path().join("#0test.log.gz").exists());
    }

    #[test]
    fn test_xz_rotated_files() {
        let temp_dir = tempdir().unwrap();
        let mut roller = RotatingFile::open(RollerMeta {
            compression: Some(Compression::XZ),
            ..meta(temp_dir.path(), 1, 0)
        })
        .unwrap();
        roller.append_line("entry 0").unwrap();
        roller.append_line("entry 1").unwrap();

        let mut reader = io::BufReader::new(fs::File::open(temp_dir.path().join("#0test.log.xz")).unwrap());
        let mut decoded = Vec::new();
        lzma_rs::xz_decompress(&mut reader, &mut decoded).unwrap();
        assert_eq!(decoded, b"entry 0\n");
    }

    #[test]
    fn test_resume_after_archive() {
        let temp_dir = tempdir().unwrap();
        fs::write(temp_dir.path().join("#0test.log.gz"), b"").unwrap();

        let roller = RotatingFile::open(meta(temp_dir.path(), 5, 3)).unwrap();
        assert_eq!(roller.active_index(), 1);
        assert_eq!(names(&roller), vec!["#0test.log.gz", "#1test.log"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_mode() {
        let temp_dir = tempdir().unwrap();
        let roller = RotatingFile::open(RollerMeta {
            file_mode: Some(0o640),
            ..meta(temp_dir.path(), 5, 3)
        })
        .unwrap();
        let mode = fs::metadata(roller.active_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}
