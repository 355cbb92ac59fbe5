//! Log event representation for the shipping pipeline.
//!
//! This module defines the `LogEvent` struct that captures one application
//! log line along with its contextual metadata such as timestamps, source
//! location, and thread/process identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::SystemTime;

use once_cell::sync::Lazy;

use crate::level::Level;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

static PROCESS_NAME: Lazy<String> = Lazy::new(|| {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .unwrap_or_else(|| String::from("unknown"))
});

/// Process-local identifier of the current thread.
///
/// `std::thread::ThreadId` exposes no stable integer, and the wire format
/// carries thread identity as an int, so threads are numbered from an
/// atomic counter on first use. Identifiers are stable for the thread's
/// lifetime and unique within the process.
fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// File name of the current executable, resolved once per process.
fn process_name() -> &'static str {
    PROCESS_NAME.as_str()
}

/// Additional context associated with a log event.
#[derive(Clone, Debug)]
pub struct EventMetadata {
    /// Source file the log call originated from.
    pub pathname: String,
    /// Line number in the source file.
    pub lineno: u32,
    /// Time the event was created.
    pub timestamp: SystemTime,
    /// Identifier of the thread that created the event.
    pub thread_id: u64,
    /// Name of the thread that created the event (if any).
    pub thread_name: Option<String>,
    /// Identifier of the emitting process.
    pub process_id: u32,
    /// Executable name of the emitting process.
    pub process_name: &'static str,
}

impl EventMetadata {
    /// Capture timestamp and thread info from the current execution context.
    fn capture_runtime() -> (SystemTime, u64, Option<String>) {
        let current = thread::current();
        (
            SystemTime::now(),
            current_thread_id(),
            current.name().map(ToString::to_string),
        )
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        let (timestamp, thread_id, thread_name) = Self::capture_runtime();
        Self {
            pathname: String::new(),
            lineno: 0,
            timestamp,
            thread_id,
            thread_name,
            process_id: std::process::id(),
            process_name: process_name(),
        }
    }
}

/// One structured record representing a single application log line plus
/// context metadata.
///
/// Immutable once enqueued: ownership moves into the dispatch queue at
/// enqueue time and the worker owns the event exclusively from dequeue to
/// delivery completion.
#[derive(Clone, Debug)]
pub struct LogEvent {
    /// Severity of the event.
    pub level: Level,
    /// Name of the logger that created this event. The handler may replace
    /// it with a configured display name when shaping the event.
    pub name: String,
    /// The fully rendered message.
    pub message: String,
    /// Project label stamped by the handler at emission; `None` until then.
    pub project: Option<String>,
    /// Instance identifier stamped by the handler at emission; `None` until
    /// then.
    pub identifier: Option<String>,
    /// Contextual metadata for the event.
    pub metadata: EventMetadata,
}

impl LogEvent {
    /// Construct a new event from logger `name`, `level`, and `message`.
    pub fn new(name: &str, level: Level, message: &str) -> Self {
        Self {
            level,
            name: name.to_owned(),
            message: message.to_owned(),
            project: None,
            identifier: None,
            metadata: EventMetadata::default(),
        }
    }

    /// Construct an event with explicit source location.
    ///
    /// Runtime context (timestamp, thread, process) is re-captured so the
    /// event reflects the emitting thread, not wherever `metadata` was
    /// assembled.
    pub fn with_metadata(name: &str, level: Level, message: &str, mut metadata: EventMetadata) -> Self {
        let (timestamp, thread_id, thread_name) = EventMetadata::capture_runtime();
        metadata.timestamp = timestamp;
        metadata.thread_id = thread_id;
        metadata.thread_name = thread_name;
        Self {
            level,
            name: name.to_owned(),
            message: message.to_owned(),
            project: None,
            identifier: None,
            metadata,
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.level, self.message)
    }
}
