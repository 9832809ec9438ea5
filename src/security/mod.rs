//! Security subsystem.
//!
//! # Design Decisions
//! - Fail closed: an empty address is never authorized
//! - Matching is case-insensitive; lists are lowercased once at startup

pub mod access_control;

pub use access_control::EmailAuthorizer;
