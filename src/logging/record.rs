//! Log Record Module
//!
//! A single diagnostic event and its on-disk line format.

use chrono::{DateTime, Local};

/// ctime-style timestamp, e.g. `Thu Oct 15 23:19:04 2026`
const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

// == Log Record ==
/// Diagnostic event captured at the moment it was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Emitting component
    pub tag: String,
    /// Free-form message
    pub message: String,
    /// Time of the event (not of the write)
    pub timestamp: DateTime<Local>,
}

impl LogRecord {
    // == Constructor ==
    /// Creates a record stamped with the current local time.
    pub fn new(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::at(tag, message, Local::now())
    }

    /// Creates a record with an explicit timestamp.
    pub fn at(tag: impl Into<String>, message: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            tag: tag.into(),
            message: message.into(),
            timestamp,
        }
    }

    // == Format ==
    /// Renders `"<timestamp> [<tag>]: <message>"` into a fresh string.
    pub fn format(&self) -> String {
        format!(
            "{} [{}]: {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.tag,
            self.message
        )
    }
}
