//! Self-noise suppression for the HTTP transport.
//!
//! The handler ships events over ureq, and ureq reports its own traffic
//! through the `log` facade. Without a guard, shipping a log line makes the
//! transport emit a log line describing that shipment, which would itself be
//! shipped, and so on. [`TransportNoiseFilter`] breaks the loop by dropping
//! transport events that describe traffic to this handler's own collector.
//!
//! Three message shapes are recognized, each compiled once at handler
//! construction from the configured destination:
//!
//! 1. request line: `POST {base_url}{log_endpoint}`
//! 2. connection open: `connecting to {host}`
//! 3. connection reset: `connection to {host} (reset|closed)`
//!
//! Matching is destination-scoped on purpose: transport chatter about any
//! other host passes through, trading missed self-noise for never dropping
//! legitimate records.

use regex::Regex;

use crate::builder::HandlerBuildError;
use crate::config::HttpHandlerConfig;

/// Logger-name prefix identifying the HTTP transport's own diagnostics.
pub(crate) const TRANSPORT_LOGGER_PREFIX: &str = "ureq";

/// Extract the authority (`host[:port]`) from a base URL.
///
/// Only `http` and `https` schemes are accepted; anything else is a
/// configuration error surfaced at handler construction.
pub(crate) fn host_authority(base_url: &str) -> Result<&str, HandlerBuildError> {
    let rest = base_url
        .strip_prefix("http://")
        .or_else(|| base_url.strip_prefix("https://"))
        .ok_or_else(|| {
            HandlerBuildError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got {base_url:?}"
            ))
        })?;
    let host = match rest.find('/') {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    if host.is_empty() {
        return Err(HandlerBuildError::InvalidConfig(format!(
            "base_url has no host: {base_url:?}"
        )));
    }
    Ok(host)
}

/// Read-only pattern set deciding whether a log event is transport
/// self-noise about this handler's collector.
#[derive(Debug)]
pub(crate) struct TransportNoiseFilter {
    patterns: Vec<Regex>,
}

impl TransportNoiseFilter {
    /// Compile the suppression pattern set from a normalized configuration.
    ///
    /// Expects `config.base_url` to already have trailing slashes stripped.
    pub(crate) fn from_config(config: &HttpHandlerConfig) -> Result<Self, HandlerBuildError> {
        let host = regex::escape(host_authority(&config.base_url)?);
        let sources = [
            regex::escape(&format!("POST {}", config.target_url())),
            format!(r"connecting to {host}\b"),
            format!("connection to {host} (?:reset|closed)"),
        ];
        let patterns = sources
            .iter()
            .map(|source| {
                Regex::new(source).map_err(|err| {
                    HandlerBuildError::InvalidConfig(format!(
                        "cannot compile suppression pattern {source:?}: {err}"
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Return `true` if the event is the transport describing its own
    /// traffic to this handler's destination.
    pub(crate) fn should_suppress(&self, logger_name: &str, message: &str) -> bool {
        if !logger_name.starts_with(TRANSPORT_LOGGER_PREFIX) {
            return false;
        }
        self.patterns.iter().any(|pattern| pattern.is_match(message))
    }
}
