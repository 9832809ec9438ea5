//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON)            command-line flags
//!     → canonical.rs (Value tree)   → flags.rs (overlay mapping)
//!     → overlay: flags replace file keys
//!     → decode.rs + coerce.rs (Options, schema defaults first)
//!     → validation/ (every check runs, violations aggregated)
//!     → ValidatedConfig (Options + Capabilities, immutable)
//!     → shared via Arc with the proxy engine
//! ```
//!
//! # Design Decisions
//! - Config is immutable once validated
//! - All fields have defaults to allow minimal configs
//! - Decoding separates structural errors (fatal, single cause) from
//!   semantic violations (collected, reported together)
//! - Derived values live in a separate type only validation can build

pub mod canonical;
pub mod capabilities;
pub mod coerce;
pub mod de;
pub mod decode;
pub mod duration;
pub mod flags;
pub mod loader;
pub mod schema;
pub mod validation;

pub use capabilities::{Capabilities, ValidatedConfig};
pub use flags::ConfigFlags;
pub use loader::{load_config, ConfigError};
pub use schema::{CookieOptions, Options, Provider, ProviderType, SessionOptions};
pub use validation::{validate, ValidationError};
