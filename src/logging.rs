use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Shared, line-atomic sink for job output and status lines.
///
/// Passed explicitly to the exporter and the aggregator instead of living
/// in process-global logging state. A sink write failure is absorbed inside
/// the implementation so one bad append never takes down the run.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, line: &str);

    fn info(&self, line: &str) {
        self.log(LogLevel::Info, line);
    }

    fn error(&self, line: &str) {
        self.log(LogLevel::Error, line);
    }
}

/// Production sink: appends a timestamped leveled line to the log file and
/// mirrors the raw line to the console, matching what the extractor's own
/// operators expect to tail.
pub struct FileSink {
    file: Mutex<File>,
}

impl FileSink {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl LogSink for FileSink {
    fn log(&self, level: LogLevel, line: &str) {
        match level {
            LogLevel::Info => println!("{line}"),
            LogLevel::Error => eprintln!("{line}"),
        }

        let stamped = format!(
            "{} - {} - {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            line
        );
        // The mutex keeps concurrent appends from interleaving mid-line.
        if let Ok(mut file) = self.file.lock() {
            if let Err(e) = file.write_all(stamped.as_bytes()) {
                tracing::warn!("failed to append to log file: {e}");
            }
        }
    }
}

/// In-memory sink for tests.
#[derive(Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn lines_at(&self, level: LogLevel) -> Vec<String> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|(_, line)| line.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: LogLevel, line: &str) {
        self.lines.lock().unwrap().push((level, line.to_string()));
    }
}
