//! Bridge between the `log` facade and the shipping handler.
//!
//! This module provides `LogAdapter`, an implementation of `log::Log` that
//! forwards records into the asynchronous delivery pipeline. The host
//! application installs it once with [`LogAdapter::install`]; from then on
//! the ordinary `log::info!` family of macros feeds the handler.

use std::borrow::Cow;

use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::handler::HttpHandler;
use crate::level::Level;
use crate::record::{EventMetadata, LogEvent};

/// Adapter implementing the Rust `log::Log` trait.
///
/// The adapter converts each enabled record to a [`LogEvent`] and hands it
/// to its [`HttpHandler`], which screens transport self-noise and enqueues
/// without blocking. Emission failures never propagate to the logging call
/// site; the handler reports drops through its diagnostic sink.
pub struct LogAdapter {
    handler: HttpHandler,
    max_level: LevelFilter,
}

/// Rewrite Rust module path targets into dotted logger names.
fn normalize_target(target: &str) -> Cow<'_, str> {
    if target.contains("::") {
        Cow::Owned(target.replace("::", "."))
    } else {
        Cow::Borrowed(target)
    }
}

impl LogAdapter {
    /// Wrap a handler, forwarding records at all levels.
    pub fn new(handler: HttpHandler) -> Self {
        Self {
            handler,
            max_level: LevelFilter::Trace,
        }
    }

    /// Limit forwarding to records at `level` or above.
    #[must_use]
    pub fn with_max_level(mut self, level: LevelFilter) -> Self {
        self.max_level = level;
        self
    }

    /// Install this adapter as the global logger for the `log` facade.
    ///
    /// Raises the facade's max level to the adapter's threshold so the
    /// logging macros hand over every record the adapter would forward.
    ///
    /// # Errors
    ///
    /// Returns [`SetLoggerError`] when a different global logger is already
    /// installed.
    pub fn install(self) -> Result<(), SetLoggerError> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }

    fn to_event(&self, record: &Record<'_>) -> LogEvent {
        let metadata = EventMetadata {
            pathname: record.file().unwrap_or_default().to_owned(),
            lineno: record.line().unwrap_or(0),
            ..Default::default()
        };
        LogEvent::with_metadata(
            normalize_target(record.target()).as_ref(),
            Level::from(record.level()),
            &record.args().to_string(),
            metadata,
        )
    }
}

impl log::Log for LogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Drops are already reported through the diagnostic sink.
        let _ = self.handler.handle(self.to_event(record));
    }

    fn flush(&self) {
        self.handler.flush();
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the `log` crate bridge.

    use std::net::TcpListener;
    use std::time::Duration;

    use rstest::rstest;

    use super::*;
    use crate::builder::HttpHandlerBuilder;
    use crate::tests::{ServerReply, base_url_for, spawn_collector, tcp_listener};

    fn shipping_adapter(base_url: &str) -> LogAdapter {
        let handler = HttpHandlerBuilder::new()
            .with_base_url(base_url)
            .with_connect_timeout_ms(1_000)
            .with_request_timeout_ms(2_000)
            .with_retry_delay_ms(10)
            .build()
            .expect("handler builds");
        LogAdapter::new(handler)
    }

    #[rstest]
    #[case("app", "app")]
    #[case("app::server::http", "app.server.http")]
    #[case("already.dotted", "already.dotted")]
    fn targets_become_dotted_names(#[case] target: &str, #[case] expected: &str) {
        assert_eq!(normalize_target(target), expected);
    }

    #[rstest]
    fn records_flow_into_delivery(tcp_listener: TcpListener) {
        let base_url = base_url_for(&tcp_listener);
        let requests = spawn_collector(tcp_listener, vec![ServerReply::Status(200)]);
        let adapter = shipping_adapter(&base_url);

        let record = log::Record::builder()
            .args(format_args!("bridge says hello"))
            .level(log::Level::Warn)
            .target("app::server")
            .file(Some("src/server.rs"))
            .line(Some(88))
            .build();
        log::Log::log(&adapter, &record);

        let request = requests
            .recv_timeout(Duration::from_secs(5))
            .expect("collector receives the record");
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/api/logs/");
        let body: serde_json::Value = serde_json::from_str(&request.body).expect("JSON body");
        assert_eq!(body["name"], "app.server");
        assert_eq!(body["level"], "WARN");
        assert_eq!(body["message"], "bridge says hello");
        assert_eq!(body["pathname"], "src/server.rs");
        assert_eq!(body["lineno"], 88);
    }

    #[rstest]
    fn threshold_filters_quiet_records(tcp_listener: TcpListener) {
        let base_url = base_url_for(&tcp_listener);
        let requests = spawn_collector(tcp_listener, vec![ServerReply::Status(200)]);
        let adapter = shipping_adapter(&base_url).with_max_level(LevelFilter::Warn);

        let quiet = log::Metadata::builder()
            .level(log::Level::Info)
            .target("app")
            .build();
        assert!(!log::Log::enabled(&adapter, &quiet));

        log::Log::log(
            &adapter,
            &log::Record::builder()
                .args(format_args!("too quiet"))
                .level(log::Level::Info)
                .target("app")
                .build(),
        );
        log::Log::log(
            &adapter,
            &log::Record::builder()
                .args(format_args!("loud enough"))
                .level(log::Level::Warn)
                .target("app")
                .build(),
        );

        let request = requests
            .recv_timeout(Duration::from_secs(5))
            .expect("collector receives the warning");
        let body: serde_json::Value = serde_json::from_str(&request.body).expect("JSON body");
        assert_eq!(body["message"], "loud enough");
    }

    #[rstest]
    fn transport_noise_never_loops_back(tcp_listener: TcpListener) {
        let base_url = base_url_for(&tcp_listener);
        let host = base_url.trim_start_matches("http://").to_owned();
        let requests = spawn_collector(
            tcp_listener,
            vec![ServerReply::Status(200), ServerReply::Status(200)],
        );
        let adapter = shipping_adapter(&base_url);

        // Self-noise about this adapter's own collector is suppressed.
        log::Log::log(
            &adapter,
            &log::Record::builder()
                .args(format_args!("connecting to {host}"))
                .level(log::Level::Debug)
                .target("ureq::stream")
                .build(),
        );
        // Transport chatter about unrelated hosts still flows.
        log::Log::log(
            &adapter,
            &log::Record::builder()
                .args(format_args!("connecting to elsewhere.example:9999"))
                .level(log::Level::Debug)
                .target("ureq::stream")
                .build(),
        );
        log::Log::log(
            &adapter,
            &log::Record::builder()
                .args(format_args!("real traffic"))
                .level(log::Level::Info)
                .target("app")
                .build(),
        );

        let first = requests
            .recv_timeout(Duration::from_secs(5))
            .expect("unrelated transport chatter is delivered");
        let body: serde_json::Value = serde_json::from_str(&first.body).expect("JSON body");
        assert_eq!(body["name"], "ureq.stream");
        assert_eq!(body["message"], "connecting to elsewhere.example:9999");

        let second = requests
            .recv_timeout(Duration::from_secs(5))
            .expect("application records are delivered");
        let body: serde_json::Value = serde_json::from_str(&second.body).expect("JSON body");
        assert_eq!(body["message"], "real traffic");
    }
}
