//! Public handler type exported by the crate.

use std::{thread, time::Duration};

use parking_lot::Mutex;
use thiserror::Error;

use crate::{
    builder::HandlerBuildError,
    config::HttpHandlerConfig,
    diag,
    rate_limited_warner::RateLimitedWarner,
    record::LogEvent,
    suppress::TransportNoiseFilter,
    worker::{Command, enqueue_event, flush_queue, spawn_worker},
};

/// Errors surfaced by the emission path.
///
/// Visible to direct API callers only; the `log::Log` adapter swallows them
/// after the diagnostic sink has been notified. Either way the event has
/// already been dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The dispatch queue is at capacity; the event was dropped.
    #[error("dispatch queue is full")]
    QueueFull,
    /// The handler has been closed; the event was dropped.
    #[error("handler is closed")]
    Closed,
}

/// Handler forwarding log events to an HTTP collector.
///
/// Each instance owns its dispatch queue, its worker thread, and its
/// suppression pattern set; nothing is shared between handlers. Enqueueing
/// never blocks the emitting thread: events are handed to the worker through
/// a bounded channel and dropped with a rate-limited warning when it is
/// full. The worker retries transient delivery failures up to the configured
/// attempt budget and reports exhaustion to the diagnostic sink only.
pub struct HttpHandler {
    tx: Option<crossbeam_channel::Sender<Command>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    filter: TransportNoiseFilter,
    project_name: Option<String>,
    identifier: Option<String>,
    display_name: Option<String>,
    warner: RateLimitedWarner,
    /// Timeout for flush and shutdown acknowledgments.
    ///
    /// Derived from `request_timeout` in the configuration: a flush or
    /// graceful shutdown should complete within the same time bounds as a
    /// single HTTP request.
    flush_timeout: Duration,
}

impl HttpHandler {
    /// Construct the handler from a configuration object.
    ///
    /// Normalizes the base URL (trailing slashes stripped), compiles the
    /// suppression pattern set, and spawns the worker thread.
    ///
    /// # Errors
    ///
    /// [`HandlerBuildError::InvalidConfig`] when the base URL is malformed,
    /// the endpoint does not start with a slash, or the capacity is zero.
    /// Failing here is deliberate: a handler without its pattern set would
    /// leave the self-noise feedback loop unguarded.
    pub fn with_config(mut config: HttpHandlerConfig) -> Result<Self, HandlerBuildError> {
        config.base_url = config.base_url.trim_end_matches('/').to_owned();
        if !config.log_endpoint.starts_with('/') {
            return Err(HandlerBuildError::InvalidConfig(format!(
                "log_endpoint must start with a slash, got {:?}",
                config.log_endpoint
            )));
        }
        if config.capacity == 0 {
            return Err(HandlerBuildError::InvalidConfig(
                "capacity must be greater than zero".into(),
            ));
        }
        let filter = TransportNoiseFilter::from_config(&config)?;
        let warner = RateLimitedWarner::new(config.warn_interval);
        let flush_timeout = config.request_timeout;
        let project_name = config.project_name.take();
        let identifier = config.identifier.take();
        let display_name = config.display_name.take();
        let (tx, handle) = spawn_worker(config);
        Ok(Self {
            tx: Some(tx),
            handle: Mutex::new(Some(handle)),
            filter,
            project_name,
            identifier,
            display_name,
            warner,
            flush_timeout,
        })
    }

    /// Handle one event.
    ///
    /// Drops transport self-noise about this handler's collector, stamps the
    /// configured labels, and enqueues the event without blocking. Invoked
    /// synchronously on the emitting thread; performs no network I/O.
    pub fn handle(&self, event: LogEvent) -> Result<(), HandlerError> {
        if self.filter.should_suppress(&event.name, &event.message) {
            return Ok(());
        }
        let Some(tx) = self.tx.as_ref() else {
            self.warner.record_drop();
            self.warner.warn_if_due(|count| {
                diag::warn(format_args!("handler closed; dropped {count} events"));
            });
            return Err(HandlerError::Closed);
        };
        enqueue_event(tx, self.shape(event), &self.warner)
    }

    /// Wait until every previously enqueued event has been processed.
    ///
    /// Returns `true` if the worker acknowledged within the flush timeout,
    /// `false` after close or on timeout.
    pub fn flush(&self) -> bool {
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        self.warner.flush(|count| {
            diag::warn(format_args!("queue full; dropped {count} events"));
        });
        flush_queue(tx, self.flush_timeout)
    }

    /// Close the handler and wait for the worker to exit.
    ///
    /// The worker drains pending events before exiting. Idempotent; events
    /// handed in afterwards are dropped with [`HandlerError::Closed`].
    pub fn close(&mut self) {
        self.request_shutdown();
        self.join_worker();
    }

    /// Number of commands queued for the worker, pending events included.
    pub fn queue_depth(&self) -> usize {
        self.tx.as_ref().map_or(0, crossbeam_channel::Sender::len)
    }

    /// Events dropped on the emission path since the handler was created.
    ///
    /// Counts enqueue-side drops (queue full, handler closed); delivery
    /// failures are reported through the diagnostic sink instead.
    pub fn dropped_count(&self) -> u64 {
        self.warner.total_dropped()
    }

    /// Apply the configured display name and labels to an outgoing event.
    fn shape(&self, mut event: LogEvent) -> LogEvent {
        if let Some(name) = &self.display_name {
            event.name.clone_from(name);
        }
        event.project = self.project_name.clone();
        event.identifier = self.identifier.clone();
        event
    }

    fn request_shutdown(&mut self) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
        if tx.send(Command::Shutdown(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.recv_timeout(self.flush_timeout);
    }

    fn join_worker(&mut self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            diag::warn(format_args!("worker thread panicked"));
        }
    }
}

impl Drop for HttpHandler {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for HttpHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHandler")
            .field("display_name", &self.display_name)
            .field("flush_timeout", &self.flush_timeout)
            .finish()
    }
}
