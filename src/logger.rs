//! Levelled logger shared between the session and background cache tasks
//!
//! Messages go to stderr so that command output on stdout stays clean.
//! Entries can also be captured in memory, which tests use to observe
//! background behavior (e.g. a failed refresh that is otherwise silent).

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

/// Verbosity level for log output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// No output
    Silent = 0,
    /// Failures and final results only
    Minimal = 1,
    /// Progress of loading, parsing and export (default)
    #[default]
    Normal = 2,
    /// Every step, including background cache checks
    Verbose = 3,
}

/// Output format for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputFormat {
    /// Human-readable text output (default)
    #[default]
    Text,
    /// Machine-readable JSON output (one object per line)
    Json,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stderr (default)
    #[default]
    Stderr,
    /// Capture only to in-memory buffer
    Memory,
    /// Both stderr and in-memory buffer
    Both,
}

/// A captured log entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// e.g. "cache", "parse", "export", "fix"
    pub category: Option<String>,
}

/// Thread-safe logger
#[derive(Debug, Default)]
pub struct Logger {
    verbosity: VerbosityLevel,
    output_format: OutputFormat,
    output_mode: OutputMode,
    log_buffer: Mutex<Vec<LogEntry>>,
}

impl Logger {
    /// Create a new logger with default verbosity (Normal)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        Logger {
            verbosity,
            ..Self::default()
        }
    }

    /// Logger that keeps everything in memory and prints nothing
    pub fn capturing() -> Self {
        Logger {
            verbosity: VerbosityLevel::Verbose,
            output_mode: OutputMode::Memory,
            ..Self::default()
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Log at Minimal level
    pub fn minimal(&self, category: &str, message: &str) {
        self.log(VerbosityLevel::Minimal, category, message);
    }

    /// Log at Normal level
    pub fn normal(&self, category: &str, message: &str) {
        self.log(VerbosityLevel::Normal, category, message);
    }

    /// Log at Verbose level
    pub fn verbose(&self, category: &str, message: &str) {
        self.log(VerbosityLevel::Verbose, category, message);
    }

    pub fn log(&self, level: VerbosityLevel, category: &str, message: &str) {
        if level == VerbosityLevel::Silent || level > self.verbosity {
            return;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            category: Some(category.to_string()),
        };

        if matches!(self.output_mode, OutputMode::Stderr | OutputMode::Both) {
            self.write_stderr(&entry);
        }
        if matches!(self.output_mode, OutputMode::Memory | OutputMode::Both) {
            self.buffer().push(entry);
        }
    }

    fn write_stderr(&self, entry: &LogEntry) {
        match self.output_format {
            OutputFormat::Text => {
                let category = entry.category.as_deref().unwrap_or("-");
                eprintln!("[{category}] {}", entry.message);
            }
            OutputFormat::Json => match serde_json::to_string(entry) {
                Ok(line) => eprintln!("{line}"),
                Err(_) => eprintln!("{}", entry.message),
            },
        }
    }

    /// Captured log entries (cloned)
    pub fn logs(&self) -> Vec<LogEntry> {
        self.buffer().clone()
    }

    /// Whether any captured message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.buffer().iter().any(|e| e.message.contains(needle))
    }

    pub fn clear_logs(&self) {
        self.buffer().clear();
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.log_buffer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
