//! Worker thread driving HTTP delivery.
//!
//! The worker owns a ureq `Agent` for connection pooling and retries
//! transient failures up to a fixed per-event attempt budget. Individual
//! delivery failures never terminate the loop; only `Shutdown` or a
//! disconnected channel do.

use std::{
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};
use ureq::{Agent, AgentBuilder};

use crate::{
    config::HttpHandlerConfig, diag, handler::HandlerError,
    rate_limited_warner::RateLimitedWarner, record::LogEvent, serialize::serialize_event,
};

/// Commands processed by the worker thread.
#[derive(Debug)]
pub(crate) enum Command {
    Event(LogEvent),
    Flush(Sender<()>),
    Shutdown(Sender<()>),
}

/// Classification of an HTTP response for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResponseClass {
    /// 2xx responses - the collector accepted the event.
    Success,
    /// 5xx or 429 - transient failure, worth another attempt.
    Retryable,
    /// Other statuses - the collector made a definitive decision, do not retry.
    Permanent,
}

/// Spawns a background worker thread to deliver queued events.
///
/// Creates the bounded dispatch queue and moves its consumer side into a
/// dedicated thread together with the HTTP client. Returns the producer side
/// and the thread's join handle.
pub(crate) fn spawn_worker(config: HttpHandlerConfig) -> (Sender<Command>, thread::JoinHandle<()>) {
    let (tx, rx) = bounded(config.capacity);
    let handle = thread::spawn(move || Worker::new(config).run(rx));
    (tx, handle)
}

struct Worker {
    agent: Agent,
    url: String,
    max_attempts: usize,
    retry_delay: Duration,
    warner: RateLimitedWarner,
}

impl Worker {
    fn new(config: HttpHandlerConfig) -> Self {
        let agent = AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout(config.request_timeout)
            .build();
        let warner = RateLimitedWarner::new(config.warn_interval);
        Self {
            agent,
            url: config.target_url(),
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay,
            warner,
        }
    }

    fn run(self, rx: Receiver<Command>) {
        loop {
            match rx.recv() {
                Ok(Command::Event(event)) => self.handle_event_command(event),
                Ok(Command::Flush(ack)) => self.handle_flush_command(ack),
                Ok(Command::Shutdown(ack)) => {
                    self.drain_pending(&rx);
                    self.handle_flush_command(ack);
                    break;
                }
                Err(_) => {
                    self.drain_pending(&rx);
                    break;
                }
            }
        }
        self.warner.flush(|count| {
            diag::warn(format_args!("dropped {count} events in the delivery path"));
        });
    }

    fn drain_pending(&self, rx: &Receiver<Command>) {
        loop {
            match rx.try_recv() {
                Ok(Command::Event(event)) => self.handle_event_command(event),
                Ok(Command::Flush(ack)) => self.handle_flush_command(ack),
                Ok(Command::Shutdown(ack)) => {
                    let _ = ack.send(());
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }

    fn handle_event_command(&self, event: LogEvent) {
        let payload = match serialize_event(&event) {
            Ok(payload) => payload,
            Err(err) => {
                diag::warn(format_args!("serialization failed, dropping event: {err}"));
                self.count_drop();
                return;
            }
        };
        self.send_request(&payload);
    }

    /// Deliver one payload, retrying transient failures until the attempt
    /// budget is spent.
    ///
    /// A completed exchange ends the attempts: 2xx is success, any
    /// non-retryable status is a definitive rejection. Transport errors and
    /// retryable statuses (429, 5xx) consume attempts, separated by
    /// `retry_delay`.
    fn send_request(&self, payload: &str) {
        let mut reason = String::new();
        for attempt in 1..=self.max_attempts {
            match self.execute_request(payload) {
                Ok(status) => match classify_status(status) {
                    ResponseClass::Success => return,
                    ResponseClass::Permanent => {
                        diag::warn(format_args!(
                            "collector rejected event with status {status}, dropping it"
                        ));
                        self.count_drop();
                        return;
                    }
                    ResponseClass::Retryable => {
                        reason = format!("collector returned status {status}");
                    }
                },
                Err(err) => reason = err,
            }
            if attempt < self.max_attempts {
                thread::sleep(self.retry_delay);
            }
        }
        diag::warn(format_args!(
            "giving up on event after {} attempts: {reason}",
            self.max_attempts
        ));
        self.count_drop();
    }

    /// Perform one POST and report the response status, or the transport
    /// error if no HTTP exchange completed.
    fn execute_request(&self, payload: &str) -> Result<u16, String> {
        let result = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .send_string(payload);
        match result {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(ureq::Error::Transport(transport)) => Err(transport.to_string()),
        }
    }

    /// Acknowledge a flush.
    ///
    /// Events are processed serially, so by the time the worker dequeues the
    /// flush command every event enqueued before it has completed delivery,
    /// retries included. The ack confirms processing, not delivery outcome.
    fn handle_flush_command(&self, ack: Sender<()>) {
        // Ignore send error: if the receiver has dropped, there's nothing to do.
        let _ = ack.send(());
    }

    fn count_drop(&self) {
        self.warner.record_drop();
        self.warner.warn_if_due(|count| {
            diag::warn(format_args!("dropped {count} events in the delivery path"));
        });
    }
}

/// Classifies an HTTP status code for retry decisions.
///
/// 2xx is [`ResponseClass::Success`], 429 and 5xx are
/// [`ResponseClass::Retryable`], everything else is
/// [`ResponseClass::Permanent`].
pub(crate) fn classify_status(status: u16) -> ResponseClass {
    match status {
        200..=299 => ResponseClass::Success,
        429 => ResponseClass::Retryable,
        500..=599 => ResponseClass::Retryable,
        _ => ResponseClass::Permanent,
    }
}

/// Enqueues a log event for delivery by the worker.
///
/// Non-blocking: if the queue is full the event is dropped and a
/// rate-limited warning goes to the diagnostic sink.
///
/// # Errors
///
/// * [`HandlerError::QueueFull`] - the queue is at capacity; event dropped
/// * [`HandlerError::Closed`] - the worker has shut down; event dropped
pub(crate) fn enqueue_event(
    tx: &Sender<Command>,
    event: LogEvent,
    warner: &RateLimitedWarner,
) -> Result<(), HandlerError> {
    match tx.try_send(Command::Event(event)) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => {
            warner.record_drop();
            warner.warn_if_due(|count| {
                diag::warn(format_args!("queue full; dropped {count} events"));
            });
            Err(HandlerError::QueueFull)
        }
        Err(TrySendError::Disconnected(_)) => {
            warner.record_drop();
            warner.warn_if_due(|count| {
                diag::warn(format_args!("worker gone; dropped {count} events"));
            });
            Err(HandlerError::Closed)
        }
    }
}

/// Sends a flush command to the worker and waits for acknowledgment.
///
/// Uses a deadline so the total wait, sending included, does not exceed
/// `timeout`. Returns `true` if the worker acknowledged in time.
pub(crate) fn flush_queue(tx: &Sender<Command>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    let (ack_tx, ack_rx) = bounded(1);
    if tx.send_timeout(Command::Flush(ack_tx), timeout).is_err() {
        return false;
    }
    let remaining = deadline.saturating_duration_since(Instant::now());
    ack_rx.recv_timeout(remaining).is_ok()
}
