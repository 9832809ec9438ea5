//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build email authorizer → Handoff
//!
//! Handoff:
//!     Arc<ValidatedConfig> + Arc<EmailAuthorizer> → proxy engine
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then collaborators
//! - No partial start: any failure aborts before the handoff exists

pub mod startup;

pub use startup::{prepare, Handoff};
