//! Provider checks and derivation of the primary token verifier settings.

use std::collections::HashSet;
use std::path::Path;

use url::Url;

use crate::config::capabilities::TokenVerifierSettings;
use crate::config::schema::{Provider, ProviderType};

/// Check every provider and derive verifier settings for the first
/// OIDC-based one, provided that provider itself is valid.
pub(super) fn validate_providers(
    providers: &[Provider],
    violations: &mut Vec<String>,
) -> Option<TokenVerifierSettings> {
    if providers.is_empty() {
        violations.push("at least one provider has to be defined".to_string());
        return None;
    }

    let mut seen_ids = HashSet::new();
    let mut verifier = None;
    let mut primary_seen = false;

    for (index, provider) in providers.iter().enumerate() {
        let before = violations.len();
        let label = format!("providers[{index}]");

        let id = provider.effective_id();
        if !seen_ids.insert(id.clone()) {
            violations.push(format!(
                "{label}: multiple providers found with id {id}: provider ids must be unique"
            ));
        }
        validate_credentials(provider, &label, violations);

        let urls = if provider.provider_type.is_oidc_based() {
            validate_oidc(provider, &label, violations)
        } else {
            None
        };

        if provider.provider_type.is_oidc_based() && !primary_seen {
            primary_seen = true;
            if violations.len() == before {
                verifier = urls.map(|(issuer_url, jwks_url)| verifier_settings(provider, issuer_url, jwks_url));
            }
        }
    }
    verifier
}

fn validate_credentials(provider: &Provider, label: &str, violations: &mut Vec<String>) {
    if provider.client_id.is_empty() {
        violations.push(format!("{label}: missing setting: client-id"));
    }

    if let ProviderType::Unsupported(name) = &provider.provider_type {
        let supported = ProviderType::SUPPORTED
            .iter()
            .map(ProviderType::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        violations.push(format!(
            "{label}: unsupported provider type {name:?}: must be one of {supported}"
        ));
    }

    // login.gov signs a JWT instead of presenting a client secret
    if provider.provider_type == ProviderType::LoginGov || !provider.client_secret.is_empty() {
        return;
    }
    if provider.client_secret_file.is_empty() {
        violations.push(format!("{label}: missing setting: client-secret or client-secret-file"));
    } else if std::fs::read(Path::new(&provider.client_secret_file)).is_err() {
        violations.push(format!(
            "{label}: could not read client secret file: {}",
            provider.client_secret_file
        ));
    }
}

/// Returns the parsed issuer and JWKS URLs when the OIDC settings are complete.
fn validate_oidc(
    provider: &Provider,
    label: &str,
    violations: &mut Vec<String>,
) -> Option<(Option<Url>, Option<Url>)> {
    let oidc = &provider.oidc;
    let before = violations.len();

    if oidc.skip_discovery {
        for (value, setting) in [
            (&oidc.jwks_url, "oidc-jwks-url"),
            (&provider.login_url, "login-url"),
            (&provider.redeem_url, "redeem-url"),
        ] {
            if value.is_empty() {
                violations.push(format!("{label}: missing setting: {setting}"));
            }
        }
    } else if oidc.issuer_url.is_empty() {
        violations.push(format!("{label}: missing setting: oidc-issuer-url"));
    }

    let issuer_url = parse_optional_url(&oidc.issuer_url, "oidc-issuer-url", label, violations);
    let jwks_url = parse_optional_url(&oidc.jwks_url, "oidc-jwks-url", label, violations);

    (violations.len() == before).then_some((issuer_url, jwks_url))
}

fn parse_optional_url(
    raw: &str,
    setting: &str,
    label: &str,
    violations: &mut Vec<String>,
) -> Option<Url> {
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(url) => Some(url),
        Err(err) => {
            violations.push(format!("{label}: error parsing {setting}={raw:?} {err}"));
            None
        }
    }
}

fn verifier_settings(
    provider: &Provider,
    issuer_url: Option<Url>,
    jwks_url: Option<Url>,
) -> TokenVerifierSettings {
    let oidc = &provider.oidc;
    let mut audiences = vec![provider.client_id.clone()];
    audiences.extend(oidc.extra_audiences.iter().cloned());

    TokenVerifierSettings {
        provider_id: provider.effective_id(),
        client_id: provider.client_id.clone(),
        issuer_url,
        jwks_url,
        skip_discovery: oidc.skip_discovery,
        audiences,
        audience_claims: oidc.audience_claims.clone(),
        email_claim: oidc.email_claim.clone(),
        groups_claim: oidc.groups_claim.clone(),
        user_id_claim: oidc.user_id_claim.clone(),
        skip_issuer_verification: oidc.insecure_skip_issuer_verification,
        skip_nonce: oidc.insecure_skip_nonce,
        allow_unverified_email: oidc.insecure_allow_unverified_email,
    }
}
