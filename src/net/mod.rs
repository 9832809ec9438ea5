//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound (startup):
//!     provider CA files → tls.rs (trust decision + HTTP client)
//!
//! Inbound (per request, in the proxy engine):
//!     peer address + trusted header → client_ip.rs (client address)
//! ```
//!
//! # Design Decisions
//! - Proxy headers are ignored unless a reverse proxy is trusted
//! - The outbound client is a value, never a process-wide default

pub mod client_ip;
pub mod tls;
