//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the collaborators the proxy engine needs
//! - Produce the handoff bundle
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in order, never concurrently
//! - Everything handed off is immutable and shared via Arc

use std::path::Path;
use std::sync::Arc;

use crate::config::capabilities::ValidatedConfig;
use crate::config::flags::ConfigFlags;
use crate::config::loader::{load_config, ConfigError};
use crate::net::tls::TlsTrust;
use crate::security::EmailAuthorizer;

/// Everything the proxy engine is started with.
#[derive(Debug, Clone)]
pub struct Handoff {
    pub config: Arc<ValidatedConfig>,
    pub authorizer: Arc<EmailAuthorizer>,
}

/// Load, validate and build the email authorizer.
pub fn prepare(path: &Path, flags: &ConfigFlags) -> Result<Handoff, ConfigError> {
    let config = load_config(path, flags)?;
    let options = config.options();
    let authorizer = EmailAuthorizer::new(&options.email_domains, &options.authenticated_emails_file)?;

    let handoff = Handoff {
        config: Arc::new(config),
        authorizer: Arc::new(authorizer),
    };
    log_summary(&handoff);
    Ok(handoff)
}

fn log_summary(handoff: &Handoff) {
    let options = handoff.config.options();
    let capabilities = handoff.config.capabilities();
    let trust = match capabilities.outbound().trust() {
        TlsTrust::SystemDefault => "system",
        TlsTrust::InsecureSkipVerify => "insecure",
        TlsTrust::CustomRoots { .. } => "custom",
    };

    tracing::info!(
        proxy_prefix = %options.proxy_prefix,
        providers = options.providers.len(),
        redirect_url = %capabilities.redirect_url().as_str(),
        reverse_proxy = options.reverse_proxy,
        tls_trust = trust,
        oidc_verifier = capabilities.oidc_verifier().is_some(),
        "Configuration validated"
    );
    tracing::info!(
        domains = options.email_domains.len(),
        emails = handoff.authorizer.email_count(),
        allow_all = handoff.authorizer.allows_all(),
        "Email authorization ready"
    );
}
