//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (decoding handles structure)
//! - Derive the values the gateway needs at runtime: redirect URL,
//!   signature data, token verifier settings, client address resolver,
//!   outbound TLS trust
//! - Aggregate every violation into one report
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Checks run in a fixed order: cookie, session, providers, signature key,
//!   email authorization, redirect URL, TLS trust, reverse proxy
//! - Advisories are logged and never block startup

mod cookie;
mod provider;
mod redirect;
mod signature;

use thiserror::Error;

use crate::config::capabilities::{
    Capabilities, RedirectUrl, SignatureData, TokenVerifierSettings, ValidatedConfig,
};
use crate::config::schema::Options;
use crate::net::client_ip::{ClientAddressResolver, RealClientIpParser};
use crate::net::tls::OutboundTls;

const EMAIL_VALIDATION_MESSAGE: &str = "missing setting for email validation: email-domain or authenticated-emails-file required.\n      use email-domain=* to authorize all email addresses";

/// Aggregated validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration:\n  {}", .violations.join("\n  "))]
pub struct ValidationError {
    violations: Vec<String>,
}

impl ValidationError {
    pub fn violations(&self) -> &[String] {
        &self.violations
    }
}

/// Values derived by the checks that succeeded.
#[derive(Debug, Default)]
pub struct Derived {
    pub redirect_url: RedirectUrl,
    pub signature: Option<SignatureData>,
    pub oidc_verifier: Option<TokenVerifierSettings>,
    pub real_client_ip_parser: Option<RealClientIpParser>,
    pub outbound: Option<OutboundTls>,
}

/// Outcome of running every check.
#[derive(Debug)]
pub struct Validation {
    violations: Vec<String>,
    derived: Derived,
}

impl Validation {
    /// Violations in check order.
    pub fn violations(&self) -> &[String] {
        &self.violations
    }

    pub fn derived(&self) -> &Derived {
        &self.derived
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Join `options` with the derived capabilities, or fail with every violation.
    pub fn into_result(self, options: Options) -> Result<ValidatedConfig, ValidationError> {
        let Derived {
            redirect_url,
            signature,
            oidc_verifier,
            real_client_ip_parser,
            outbound,
        } = self.derived;
        // `outbound` is only absent when its own violation was recorded
        let outbound = match outbound {
            Some(outbound) if self.violations.is_empty() => outbound,
            _ => {
                return Err(ValidationError {
                    violations: self.violations,
                })
            }
        };
        let client_address = match real_client_ip_parser {
            Some(parser) => ClientAddressResolver::trusting(parser),
            None => ClientAddressResolver::direct(),
        };

        let capabilities = Capabilities {
            redirect_url,
            signature,
            oidc_verifier,
            client_address,
            outbound,
        };
        Ok(ValidatedConfig::new(options, capabilities))
    }
}

/// Run every check against `options`.
pub fn check(options: &Options) -> Validation {
    let mut violations = Vec::new();
    let mut derived = Derived::default();

    cookie::validate_cookie(&options.cookie, &mut violations);
    cookie::validate_session(&options.session, &options.cookie, &mut violations);
    derived.oidc_verifier = provider::validate_providers(&options.providers, &mut violations);
    derived.signature = signature::parse_signature_key(&options.signature_key, &mut violations);

    if options.authenticated_emails_file.is_empty() && options.email_domains.is_empty() {
        violations.push(EMAIL_VALIDATION_MESSAGE.to_string());
    }

    derived.redirect_url = redirect::parse_redirect_url(&options.raw_redirect_url, &mut violations);
    if options.raw_redirect_url.is_empty() && !options.cookie.secure && !options.reverse_proxy {
        tracing::warn!("no explicit redirect URL: redirects will default to insecure HTTP");
    }

    derived.outbound = configure_outbound(options)
        .map_err(|violation| violations.push(violation))
        .ok();

    if options.reverse_proxy {
        match RealClientIpParser::for_header(&options.real_client_ip_header) {
            Ok(parser) => derived.real_client_ip_parser = Some(parser),
            Err(err) => violations.push(format!(
                "real_client_ip_header ({}) not accepted parameter value: {err}",
                options.real_client_ip_header
            )),
        }
    }

    tracing::debug!(violations = violations.len(), "Configuration checks finished");
    Validation {
        violations,
        derived,
    }
}

/// Validate `options`, producing the configuration handed to the gateway.
pub fn validate(options: Options) -> Result<ValidatedConfig, ValidationError> {
    check(&options).into_result(options)
}

fn configure_outbound(options: &Options) -> Result<OutboundTls, String> {
    let primary = options.providers.first();
    let ca_files = primary.map(|p| p.ca_files.as_slice()).unwrap_or_default();
    let use_system_trust_store = primary.is_some_and(|p| p.use_system_trust_store);

    if options.ssl_insecure_skip_verify {
        tracing::warn!("TLS certificate verification is disabled for provider connections");
    }

    OutboundTls::configure(options.ssl_insecure_skip_verify, ca_files, use_system_trust_store)
        .map_err(|err| format!("unable to load provider CA file(s): {err}"))
}
