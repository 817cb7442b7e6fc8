//! Process logger: `env_logger` filtering (RUST_LOG, default `info`) with
//! every accepted record kept in a bounded in-memory ring (served on
//! `/api/logs`), mirrored to stderr and appended to
//! `<config_dir>/slidegist/logs/backend.log`.
use env_logger::{Logger, Target};
use log::{Log, Metadata, Record, SetLoggerError};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};

const MAX_LOG_ENTRIES: usize = 2000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendLogEntry {
    pub timestamp_ms: u64,
    pub level: String,
    pub target: String,
    pub message: String,
}

struct LogRing {
    entries: Mutex<VecDeque<BackendLogEntry>>,
}

impl LogRing {
    fn push(&self, entry: BackendLogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push_back(entry);
            while entries.len() > MAX_LOG_ENTRIES {
                entries.pop_front();
            }
        }
    }

    fn recent_entries(&self) -> Vec<BackendLogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }
}

static LOG_RING: LazyLock<LogRing> = LazyLock::new(|| LogRing {
    entries: Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES)),
});

struct LogFile {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl LogFile {
    fn new() -> Self {
        let path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slidegist")
            .join("logs")
            .join("backend.log");
        let file = Self::open(&path).ok();
        Self {
            path,
            file: Mutex::new(file),
        }
    }

    fn open(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn append_line(&self, line: &str) {
        let Ok(mut guard) = self.file.lock() else {
            return;
        };
        if guard.is_none() {
            *guard = Self::open(&self.path).ok();
        }
        if let Some(file) = guard.as_mut() {
            let _ = writeln!(file, "{}", line);
            let _ = file.flush();
        }
    }
}

static LOG_FILE: LazyLock<LogFile> = LazyLock::new(LogFile::new);

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn format_log_line(entry: &BackendLogEntry) -> String {
    format!(
        "{} [{}] [{}] {}",
        entry.timestamp_ms,
        entry.level.to_uppercase(),
        entry.target,
        entry.message.replace('\n', "\\n")
    )
}

fn emit(entry: BackendLogEntry) {
    let line = format_log_line(&entry);
    eprintln!("{}", line);
    LOG_FILE.append_line(&line);
    LOG_RING.push(entry);
}

struct BridgeLogger {
    inner: Logger,
}

impl Log for BridgeLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        emit(BackendLogEntry {
            timestamp_ms: now_ms(),
            level: record.level().to_string().to_lowercase(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        });
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn init() -> Result<(), SetLoggerError> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.target(Target::Pipe(Box::new(io::sink())));
    let inner = builder.build();
    let max_level = inner.filter();
    let logger = Box::leak(Box::new(BridgeLogger { inner }));
    log::set_logger(logger)?;
    log::set_max_level(max_level);
    Ok(())
}

pub fn recent_entries() -> Vec<BackendLogEntry> {
    LOG_RING.recent_entries()
}

pub fn log_file_path() -> String {
    LOG_FILE.path.display().to_string()
}

/// Record a line even when the logger could not be installed.
pub fn write_fallback_line(message: &str) {
    emit(BackendLogEntry {
        timestamp_ms: now_ms(),
        level: "error".to_string(),
        target: "slidegist.log_bridge".to_string(),
        message: message.to_string(),
    });
}
