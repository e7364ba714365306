//! Console progress logging.
//!
//! Pipelines report progress through a process-global sink so that the
//! library and the CLI share one output channel. Entries go to stderr,
//! either as prefixed text or as one JSON object per line.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

/// Log level for console display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Render as a human-readable line.
    pub fn render(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(self.indent as usize);
        format!("{}{} {}", indent, prefix, self.message)
    }
}

/// How the sink renders entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
    Quiet,
}

impl LogFormat {
    fn to_u8(self) -> u8 {
        match self {
            LogFormat::Text => 0,
            LogFormat::Json => 1,
            LogFormat::Quiet => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => LogFormat::Json,
            2 => LogFormat::Quiet,
            _ => LogFormat::Text,
        }
    }
}

/// Global log sink
pub static LOG_SINK: Lazy<LogSink> = Lazy::new(LogSink::new);

/// Writes log entries to stderr in the configured format
pub struct LogSink {
    format: AtomicU8,
}

impl LogSink {
    pub fn new() -> Self {
        Self { format: AtomicU8::new(LogFormat::Text.to_u8()) }
    }

    pub fn set_format(&self, format: LogFormat) {
        self.format.store(format.to_u8(), Ordering::Relaxed);
    }

    pub fn format(&self) -> LogFormat {
        LogFormat::from_u8(self.format.load(Ordering::Relaxed))
    }

    /// The line written for `entry`, if any. Quiet keeps errors only.
    pub fn line(&self, entry: &LogEntry) -> Option<String> {
        match self.format() {
            LogFormat::Quiet if entry.level != LogLevel::Error => None,
            LogFormat::Json => Some(serde_json::to_string(entry).unwrap_or_else(|_| entry.render())),
            LogFormat::Text | LogFormat::Quiet => Some(entry.render()),
        }
    }

    /// Write a log entry
    pub fn log(&self, entry: LogEntry) {
        if let Some(line) = self.line(&entry) {
            // a closed stderr drops the entry
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
        }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenient logging functions
pub fn log_info(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::info(msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::success(msg));
}

pub fn log_warning(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::warning(msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_SINK.log(LogEntry::error(msg));
}

pub fn log_info_indent(msg: impl Into<String>, indent: u8) {
    LOG_SINK.log(LogEntry::info(msg).with_indent(indent));
}
