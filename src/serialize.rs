//! Wire representation of a log event.
//!
//! Provides an intermediate struct that borrows from the original event to
//! avoid allocations for string fields during serialization. The JSON field
//! set is the collector's contract: `level`, `name`, `message`, `lineno`,
//! `pathname`, `project`, `identifier`, `timestamp` (float epoch seconds),
//! `datetime` (human-readable local time), `thread_id`, `thread_name`,
//! `process_id`, and `process_name`.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::record::LogEvent;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Borrowed view of a [`LogEvent`] matching the collector's field names.
#[derive(Serialize)]
struct WireEvent<'a> {
    level: &'static str,
    name: &'a str,
    message: &'a str,
    lineno: u32,
    pathname: &'a str,
    project: Option<&'a str>,
    identifier: Option<&'a str>,
    timestamp: f64,
    datetime: String,
    thread_id: u64,
    thread_name: &'a str,
    process_id: u32,
    process_name: &'a str,
}

impl<'a> From<&'a LogEvent> for WireEvent<'a> {
    fn from(event: &'a LogEvent) -> Self {
        let metadata = &event.metadata;
        Self {
            level: event.level.as_str(),
            name: &event.name,
            message: &event.message,
            lineno: metadata.lineno,
            pathname: &metadata.pathname,
            project: event.project.as_deref(),
            identifier: event.identifier.as_deref(),
            timestamp: epoch_seconds(metadata.timestamp),
            datetime: DateTime::<Local>::from(metadata.timestamp)
                .format(DATETIME_FORMAT)
                .to_string(),
            thread_id: metadata.thread_id,
            thread_name: metadata.thread_name.as_deref().unwrap_or(""),
            process_id: metadata.process_id,
            process_name: metadata.process_name,
        }
    }
}

fn epoch_seconds(timestamp: SystemTime) -> f64 {
    timestamp
        .duration_since(UNIX_EPOCH)
        .map(|dur| dur.as_secs_f64())
        .unwrap_or_default()
}

/// Serialize an event to its JSON wire form.
pub(crate) fn serialize_event(event: &LogEvent) -> serde_json::Result<String> {
    serde_json::to_string(&WireEvent::from(event))
}
