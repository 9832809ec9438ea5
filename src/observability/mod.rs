//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Startup and validation:
//!     → tracing events (advisories, load summary)
//!
//! Proxy engine requests:
//!     → logging::access_log_layer (span per request with client address)
//!
//! Consumers:
//!     → fmt layer on stdout, filtered by RUST_LOG
//! ```

pub mod logging;
