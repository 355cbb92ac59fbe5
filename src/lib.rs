//! Asynchronous shipping of application logs to an HTTP collector.
//!
//! The crate hangs off the standard `log` facade: install a [`LogAdapter`]
//! and every enabled record is converted to a [`LogEvent`], screened for
//! transport self-noise, and queued for a background worker that delivers
//! it as JSON over HTTP. Logging call sites never block on the network and
//! never observe delivery failures; the worker retries transient errors and
//! reports drops through a diagnostic sink that cannot feed back into the
//! pipeline.
//!
//! ```no_run
//! use logship::{HttpHandlerBuilder, LogAdapter};
//!
//! let handler = HttpHandlerBuilder::new()
//!     .with_base_url("http://localhost:8000")
//!     .with_project_name("billing")
//!     .build()?;
//! LogAdapter::new(handler).install()?;
//! log::info!("shipped without blocking");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod config;
mod diag;
pub mod handler;
pub mod level;
pub mod log_bridge;
mod rate_limited_warner;
pub mod record;
mod serialize;
mod suppress;
mod worker;


pub use builder::{HandlerBuildError, HttpHandlerBuilder};
pub use config::HttpHandlerConfig;
pub use handler::{HandlerError, HttpHandler};
pub use level::Level;
pub use log_bridge::LogAdapter;
pub use record::{EventMetadata, LogEvent};
