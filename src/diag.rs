//! Diagnostic sink for the crate's own failures.
//!
//! Everything here writes to stderr instead of the `log` facade: when
//! [`LogAdapter`](crate::log_bridge::LogAdapter) is installed as the global
//! logger, a record emitted through `log` from inside this crate would
//! re-enter the dispatch pipeline it is reporting on.

use std::fmt;
use std::io::Write;

/// Report an internal failure on stderr.
///
/// Write errors are ignored; diagnostics must never propagate a failure
/// into the host application.
pub(crate) fn warn(args: fmt::Arguments<'_>) {
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    let _ = writeln!(out, "logship: {args}");
}
