//! OAuth2/OIDC gateway configuration library.
//!
//! Decodes and validates gateway configuration and produces the handoff
//! bundle a proxy engine is started with.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod security;

pub use config::{ConfigError, ConfigFlags, Options, ValidatedConfig};
pub use lifecycle::Handoff;
pub use security::EmailAuthorizer;
