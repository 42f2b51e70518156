//! Rolling Logger
//!
//! Installs a `tracing` subscriber that writes to `<dir>/<app>.log`, rotates the
//! file once it grows past a size limit and keeps the most recent lines in memory.
//! `log` records are captured as well, so library crates can stay on the `log` facade.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::MakeWriter;

/// Default size at which the active log file is rotated (1 MiB)
pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024;
/// Default number of rotated files kept next to the active one
pub const DEFAULT_MAX_FILES: usize = 3;
/// Default number of lines kept in the in-memory ring buffer
pub const DEFAULT_RECENT_LINES: usize = 500;

static GLOBAL_WRITER: OnceLock<RollingWriter> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Logger not initialized")]
    NotInitialized,
}

/// Options for a rolling writer
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub log_dir: PathBuf,
    pub app_name: String,
    pub max_bytes: u64,
    pub max_files: usize,
    pub recent_lines: usize,
}

impl LoggerOptions {
    pub fn new(log_dir: impl Into<PathBuf>, app_name: &str) -> Self {
        Self {
            log_dir: log_dir.into(),
            app_name: app_name.to_string(),
            max_bytes: DEFAULT_MAX_BYTES,
            max_files: DEFAULT_MAX_FILES,
            recent_lines: DEFAULT_RECENT_LINES,
        }
    }
}

struct RollingState {
    options: LoggerOptions,
    file: Option<File>,
    written: u64,
    recent: VecDeque<String>,
    partial: String,
}

impl RollingState {
    fn active_path(&self) -> PathBuf {
        self.options.log_dir.join(format!("{}.log", self.options.app_name))
    }

    fn rotated_path(&self, n: usize) -> PathBuf {
        self.options
            .log_dir
            .join(format!("{}.log.{}", self.options.app_name, n))
    }

    fn open(&mut self) -> io::Result<()> {
        fs::create_dir_all(&self.options.log_dir)?;
        let path = self.active_path();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        self.written = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        if self.options.max_files == 0 {
            remove_if_exists(&self.active_path())?;
            return self.open();
        }

        remove_if_exists(&self.rotated_path(self.options.max_files))?;
        for n in (1..self.options.max_files).rev() {
            let from = self.rotated_path(n);
            if from.exists() {
                fs::rename(&from, self.rotated_path(n + 1))?;
            }
        }
        let active = self.active_path();
        if active.exists() {
            fs::rename(&active, self.rotated_path(1))?;
        }
        self.open()
    }

    fn remember(&mut self, buf: &[u8]) {
        if self.options.recent_lines == 0 {
            return;
        }
        self.partial.push_str(&String::from_utf8_lossy(buf));
        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            let line = line.trim_end().to_string();
            if line.is_empty() {
                continue;
            }
            if self.recent.len() == self.options.recent_lines {
                self.recent.pop_front();
            }
            self.recent.push_back(line);
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.file.is_none() {
            self.open()?;
        }
        if self.written > 0 && self.written + buf.len() as u64 > self.options.max_bytes {
            self.rotate()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file not open"))?;
        file.write_all(buf)?;
        self.written += buf.len() as u64;
        self.remember(buf);
        Ok(buf.len())
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Size-rotated file writer with a ring buffer of recent lines.
///
/// Cheap to clone; all clones share the same file and buffer.
#[derive(Clone)]
pub struct RollingWriter {
    state: Arc<Mutex<RollingState>>,
}

impl RollingWriter {
    pub fn new(options: LoggerOptions) -> Result<Self, LoggerError> {
        let mut state = RollingState {
            recent: VecDeque::with_capacity(options.recent_lines.min(DEFAULT_RECENT_LINES)),
            options,
            file: None,
            written: 0,
            partial: String::new(),
        };
        state.open()?;
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Lines written so far, oldest first
    pub fn recent_lines(&self) -> Vec<String> {
        match self.state.lock() {
            Ok(state) => state.recent.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn active_path(&self) -> Option<PathBuf> {
        self.state.lock().ok().map(|s| s.active_path())
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer poisoned"))?;
        state.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer poisoned"))?;
        match state.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for RollingWriter {
    type Writer = RollingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Local wall-clock timestamps, same shape as the app's console output
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Initialize the global logger writing into `log_dir`
pub fn init_logger(log_dir: impl Into<PathBuf>, app_name: &str) -> Result<(), LoggerError> {
    init_with(LoggerOptions::new(log_dir, app_name))
}

/// Initialize the global logger with explicit options
pub fn init_with(options: LoggerOptions) -> Result<(), LoggerError> {
    if GLOBAL_WRITER.get().is_some() {
        return Err(LoggerError::AlreadyInitialized);
    }
    let writer = RollingWriter::new(options)?;

    tracing_subscriber::fmt()
        .with_writer(writer.clone())
        .with_ansi(false)
        .with_target(true)
        .with_timer(LocalTimer)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    let path = writer.active_path();
    GLOBAL_WRITER
        .set(writer)
        .map_err(|_| LoggerError::AlreadyInitialized)?;

    // `log` records reach the same writer through the subscriber's bridge
    if let Some(path) = path {
        log::info!("logging to {}", path.display());
    }
    Ok(())
}

fn ensure_initialized() -> Result<(), LoggerError> {
    GLOBAL_WRITER
        .get()
        .map(|_| ())
        .ok_or(LoggerError::NotInitialized)
}

pub fn info(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::info!("{}", msg);
    Ok(())
}

pub fn warn(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::warn!("{}", msg);
    Ok(())
}

pub fn error(msg: &str) -> Result<(), LoggerError> {
    ensure_initialized()?;
    tracing::error!("{}", msg);
    Ok(())
}

/// Recent lines of the global logger (empty before init)
pub fn recent_lines() -> Vec<String> {
    GLOBAL_WRITER
        .get()
        .map(|w| w.recent_lines())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dir: &Path) -> LoggerOptions {
        LoggerOptions {
            log_dir: dir.to_path_buf(),
            app_name: "Test".to_string(),
            max_bytes: 64,
            max_files: 2,
            recent_lines: 3,
        }
    }

    #[test]
    fn test_writes_to_active_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RollingWriter::new(options(dir.path())).unwrap();

        writer.write_all(b"hello\n").unwrap();
        writer.flush().unwrap();

        let content = fs::read_to_string(dir.path().join("Test.log")).unwrap();
        assert_eq!(content, "hello\n");
    }

    #[test]
    fn test_rotates_past_size_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RollingWriter::new(options(dir.path())).unwrap();

        let line = [b'a'; 40];
        for _ in 0..4 {
            writer.write_all(&line).unwrap();
            writer.write_all(b"\n").unwrap();
        }
        writer.flush().unwrap();

        assert!(dir.path().join("Test.log").exists());
        assert!(dir.path().join("Test.log.1").exists());
        assert!(dir.path().join("Test.log.2").exists());
        assert!(!dir.path().join("Test.log.3").exists());
    }

    #[test]
    fn test_ring_buffer_keeps_latest_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RollingWriter::new(options(dir.path())).unwrap();

        for i in 0..5 {
            writer.write_all(format!("line {}\n", i).as_bytes()).unwrap();
        }

        assert_eq!(writer.recent_lines(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_partial_lines_wait_for_newline() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = RollingWriter::new(options(dir.path())).unwrap();

        writer.write_all(b"par").unwrap();
        assert!(writer.recent_lines().is_empty());
        writer.write_all(b"tial\n").unwrap();
        assert_eq!(writer.recent_lines(), vec!["partial"]);
    }

    #[test]
    fn test_helpers_require_init() {
        if GLOBAL_WRITER.get().is_none() {
            assert!(matches!(info("x"), Err(LoggerError::NotInitialized)));
        }
    }
}
