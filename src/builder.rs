//! Builder for [`HttpHandler`].
//!
//! Exposes destination configuration (base URL and endpoint path), event
//! labels, queue capacity, timeouts, and the delivery attempt budget.
//! Validation happens in [`HttpHandlerBuilder::build`] so a misconfigured
//! destination surfaces at construction instead of event by event in the
//! worker.

use std::time::Duration;

use thiserror::Error;

use crate::config::HttpHandlerConfig;
use crate::handler::HttpHandler;

/// Error produced when handler construction fails.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerBuildError {
    /// The supplied configuration was rejected.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(HandlerBuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`HttpHandler`] instances.
#[derive(Clone, Debug, Default)]
pub struct HttpHandlerBuilder {
    base_url: Option<String>,
    log_endpoint: Option<String>,
    project_name: Option<String>,
    identifier: Option<String>,
    display_name: Option<String>,
    capacity: Option<usize>,
    connect_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    max_attempts: Option<usize>,
    retry_delay_ms: Option<u64>,
}

impl HttpHandlerBuilder {
    /// Create a new builder using the default destination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collector base URL, scheme and authority included.
    ///
    /// Defaults to `http://localhost:8000`; a trailing slash is stripped at
    /// build time.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the collector endpoint path. Defaults to `/api/logs/` and must
    /// start with a slash.
    pub fn with_log_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.log_endpoint = Some(endpoint.into());
        self
    }

    /// Label outgoing events with a project name.
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = Some(name.into());
        self
    }

    /// Label outgoing events with an instance identifier.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Replace the logger name on outgoing events with a fixed display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    option_setter!(
        #[doc = "Set the bounded queue capacity."]
        with_capacity,
        capacity,
        usize
    );
    option_setter!(
        #[doc = "Set the connect timeout in milliseconds."]
        with_connect_timeout_ms,
        connect_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the request timeout in milliseconds."]
        with_request_timeout_ms,
        request_timeout_ms,
        u64
    );
    option_setter!(
        #[doc = "Set the delivery attempt budget per event, first try included."]
        with_max_attempts,
        max_attempts,
        usize
    );
    option_setter!(
        #[doc = "Set the pause between delivery attempts in milliseconds."]
        with_retry_delay_ms,
        retry_delay_ms,
        u64
    );

    fn validate(&self) -> Result<(), HandlerBuildError> {
        self.validate_destination()?;
        self.validate_capacity()?;
        self.validate_timeouts()?;
        self.validate_attempts()?;
        Ok(())
    }

    fn validate_destination(&self) -> Result<(), HandlerBuildError> {
        if let Some(url) = &self.base_url
            && url.trim().is_empty()
        {
            return Err(HandlerBuildError::InvalidConfig(
                "base_url must not be empty".into(),
            ));
        }
        if let Some(endpoint) = &self.log_endpoint
            && !endpoint.starts_with('/')
        {
            return Err(HandlerBuildError::InvalidConfig(format!(
                "log_endpoint must start with a slash, got {endpoint:?}"
            )));
        }
        Ok(())
    }

    fn validate_capacity(&self) -> Result<(), HandlerBuildError> {
        if let Some(capacity) = self.capacity {
            ensure_positive!(capacity, "capacity")?;
        }
        Ok(())
    }

    fn validate_timeouts(&self) -> Result<(), HandlerBuildError> {
        if let Some(timeout) = self.connect_timeout_ms {
            ensure_positive!(timeout, "connect_timeout_ms")?;
        }
        if let Some(timeout) = self.request_timeout_ms {
            ensure_positive!(timeout, "request_timeout_ms")?;
        }
        Ok(())
    }

    // retry_delay_ms may be zero: retrying immediately is valid.
    fn validate_attempts(&self) -> Result<(), HandlerBuildError> {
        if let Some(attempts) = self.max_attempts {
            ensure_positive!(attempts, "max_attempts")?;
        }
        Ok(())
    }

    fn build_config(&self) -> Result<HttpHandlerConfig, HandlerBuildError> {
        self.validate()?;

        let defaults = HttpHandlerConfig::default();
        Ok(HttpHandlerConfig {
            base_url: self.base_url.clone().unwrap_or(defaults.base_url),
            log_endpoint: self.log_endpoint.clone().unwrap_or(defaults.log_endpoint),
            project_name: self.project_name.clone(),
            identifier: self.identifier.clone(),
            display_name: self.display_name.clone(),
            capacity: self.capacity.unwrap_or(defaults.capacity),
            connect_timeout: self
                .connect_timeout_ms
                .map_or(defaults.connect_timeout, Duration::from_millis),
            request_timeout: self
                .request_timeout_ms
                .map_or(defaults.request_timeout, Duration::from_millis),
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            retry_delay: self
                .retry_delay_ms
                .map_or(defaults.retry_delay, Duration::from_millis),
            warn_interval: defaults.warn_interval,
        })
    }

    /// Build the handler, spawning its worker thread.
    ///
    /// # Errors
    ///
    /// [`HandlerBuildError::InvalidConfig`] when a setting fails validation
    /// or the destination URL cannot anchor the suppression patterns.
    pub fn build(&self) -> Result<HttpHandler, HandlerBuildError> {
        let config = self.build_config()?;
        HttpHandler::with_config(config)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn build_config(builder: HttpHandlerBuilder) -> Result<HttpHandlerConfig, HandlerBuildError> {
        builder.build_config()
    }

    #[test]
    fn defaults_fill_unset_fields() {
        let config = build_config(HttpHandlerBuilder::new()).expect("default config");
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.log_endpoint, "/api/logs/");
        assert_eq!(config.max_attempts, 3);
        assert!(config.project_name.is_none());
        assert!(config.display_name.is_none());
    }

    #[test]
    fn setters_override_defaults() {
        let config = build_config(
            HttpHandlerBuilder::new()
                .with_base_url("http://collector:9000")
                .with_log_endpoint("/ingest/")
                .with_project_name("billing")
                .with_identifier("eu-west-1")
                .with_display_name("billing-api")
                .with_capacity(8)
                .with_connect_timeout_ms(250)
                .with_request_timeout_ms(500)
                .with_max_attempts(5)
                .with_retry_delay_ms(10),
        )
        .expect("explicit config");
        assert_eq!(config.target_url(), "http://collector:9000/ingest/");
        assert_eq!(config.project_name.as_deref(), Some("billing"));
        assert_eq!(config.identifier.as_deref(), Some("eu-west-1"));
        assert_eq!(config.display_name.as_deref(), Some("billing-api"));
        assert_eq!(config.capacity, 8);
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_millis(500));
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_delay, Duration::from_millis(10));
    }

    #[rstest]
    #[case::empty_base_url(HttpHandlerBuilder::new().with_base_url("  "))]
    #[case::relative_endpoint(HttpHandlerBuilder::new().with_log_endpoint("api/logs/"))]
    #[case::zero_capacity(HttpHandlerBuilder::new().with_capacity(0))]
    #[case::zero_connect_timeout(HttpHandlerBuilder::new().with_connect_timeout_ms(0))]
    #[case::zero_request_timeout(HttpHandlerBuilder::new().with_request_timeout_ms(0))]
    #[case::zero_attempts(HttpHandlerBuilder::new().with_max_attempts(0))]
    fn rejects_invalid_settings(#[case] builder: HttpHandlerBuilder) {
        let err = build_config(builder).expect_err("validation should fail");
        let HandlerBuildError::InvalidConfig(_) = err;
    }

    #[test]
    fn zero_retry_delay_is_allowed() {
        let config = build_config(HttpHandlerBuilder::new().with_retry_delay_ms(0))
            .expect("immediate retry config");
        assert_eq!(config.retry_delay, Duration::ZERO);
    }

    #[test]
    fn build_rejects_malformed_destinations() {
        let err = HttpHandlerBuilder::new()
            .with_base_url("not-a-url")
            .build()
            .expect_err("missing scheme should fail");
        assert!(err.to_string().contains("invalid handler configuration"));
    }
}
