//! Decode a canonical mapping into [`Options`].
//!
//! Top-level keys are flat snake_case names. Each key is looked up in a
//! field table that names the target field and the coercion applied to it.
//! Missing keys keep the schema default; unknown keys are ignored.

use serde::de::DeserializeOwned;

use crate::config::canonical::{Mapping, Value};
use crate::config::coerce;
use crate::config::de::{from_value, DecodeError};
use crate::config::schema::{self, Options};

/// Decode `mapping` on top of [`Options::default`].
///
/// The first field that fails to decode aborts the whole decode.
pub fn decode_options(mapping: Mapping) -> Result<Options, DecodeError> {
    let mut options = Options::default();
    for (key, value) in mapping {
        // explicit nulls behave like absent keys
        if value.is_null() {
            continue;
        }
        apply(&mut options, &key, value).map_err(|err| err.at_key(&key))?;
    }
    Ok(options)
}

fn apply(options: &mut Options, key: &str, value: Value) -> Result<(), DecodeError> {
    let cookie = &mut options.cookie;
    let session = &mut options.session;

    match key {
        "proxy_prefix" => options.proxy_prefix = plain(value)?,
        "reverse_proxy" => options.reverse_proxy = plain(value)?,
        "real_client_ip_header" => options.real_client_ip_header = plain(value)?,
        "redirect_url" => options.raw_redirect_url = plain(value)?,
        "relative_redirect_url" => options.relative_redirect_url = plain(value)?,
        "authenticated_emails_file" => options.authenticated_emails_file = plain(value)?,
        "email_domains" => options.email_domains = coerce::string_list(value)?,
        "whitelist_domains" => options.whitelist_domains = coerce::string_list(value)?,

        "cookie_name" => cookie.name = plain(value)?,
        "cookie_secret" => cookie.secret = plain(value)?,
        "cookie_domains" => cookie.domains = coerce::string_list(value)?,
        "cookie_path" => cookie.path = plain(value)?,
        "cookie_expire" => cookie.expire = coerce::duration(value)?,
        "cookie_refresh" => cookie.refresh = coerce::duration(value)?,
        "cookie_secure" => cookie.secure = plain(value)?,
        "cookie_httponly" => cookie.http_only = plain(value)?,
        "cookie_samesite" => cookie.same_site = plain(value)?,
        "cookie_csrf_per_request" => cookie.csrf_per_request = plain(value)?,
        "cookie_csrf_expire" => cookie.csrf_expire = coerce::duration(value)?,

        "session_store_type" => session.store_type = plain(value)?,
        "session_cookie_minimal" => session.cookie_minimal = plain(value)?,

        "providers" => options.providers = schema::providers(value)?,

        "ssl_insecure_skip_verify" => options.ssl_insecure_skip_verify = plain(value)?,
        "skip_auth_preflight" => options.skip_auth_preflight = plain(value)?,
        "encode_state" => options.encode_state = plain(value)?,
        "signature_key" => options.signature_key = plain(value)?,

        unknown => tracing::debug!(key = unknown, "Ignoring unknown configuration key"),
    }
    Ok(())
}

/// Decode a field with no coercion beyond its own type.
fn plain<T: DeserializeOwned>(value: Value) -> Result<T, DecodeError> {
    from_value(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::canonical::from_json_slice;
    use crate::config::schema::ProviderType;
    use std::time::Duration;

    fn decode(json: &str) -> Result<Options, DecodeError> {
        decode_options(from_json_slice(json.as_bytes()).unwrap())
    }

    #[test]
    fn test_present_fields_round_trip() {
        let options = decode(
            r#"{
                "proxy_prefix": "/auth",
                "reverse_proxy": true,
                "real_client_ip_header": "X-Forwarded-For",
                "redirect_url": "https://app.example.com/oauth2/callback",
                "email_domains": ["example.com", "example.org"],
                "cookie_name": "_gw",
                "cookie_secret": "0123456789abcdef",
                "cookie_expire": "12h",
                "cookie_secure": false,
                "cookie_samesite": "lax",
                "session_cookie_minimal": true,
                "signature_key": "sha1:abc",
                "providers": [{"clientID": "cid", "clientSecret": "cs", "provider": "github"}]
            }"#,
        )
        .unwrap();

        assert_eq!(options.proxy_prefix, "/auth");
        assert!(options.reverse_proxy);
        assert_eq!(options.real_client_ip_header, "X-Forwarded-For");
        assert_eq!(options.raw_redirect_url, "https://app.example.com/oauth2/callback");
        assert_eq!(options.email_domains, vec!["example.com", "example.org"]);
        assert_eq!(options.cookie.name, "_gw");
        assert_eq!(options.cookie.secret, "0123456789abcdef");
        assert_eq!(options.cookie.expire, Duration::from_secs(12 * 3600));
        assert!(!options.cookie.secure);
        assert_eq!(options.cookie.same_site, "lax");
        assert!(options.session.cookie_minimal);
        assert_eq!(options.signature_key, "sha1:abc");
        assert_eq!(options.providers.len(), 1);
        assert_eq!(options.providers[0].provider_type, ProviderType::GitHub);
        assert_eq!(options.providers[0].client_id, "cid");

        // absent keys keep their defaults
        assert_eq!(options.cookie.path, "/");
        assert!(options.cookie.http_only);
        assert_eq!(options.cookie.csrf_expire, Duration::from_secs(900));
        assert_eq!(options.session.store_type, "cookie");
        assert!(options.whitelist_domains.is_empty());
    }

    #[test]
    fn test_comma_joined_lists() {
        let options = decode(r#"{"email_domains": "a,b,c", "cookie_domains": ""}"#).unwrap();
        assert_eq!(options.email_domains, vec!["a", "b", "c"]);
        assert!(options.cookie.domains.is_empty());
    }

    #[test]
    fn test_duration_literals() {
        let options = decode(r#"{"cookie_refresh": "1h30m", "cookie_csrf_expire": "0"}"#).unwrap();
        assert_eq!(options.cookie.refresh, Duration::from_secs(5_400));
        assert_eq!(options.cookie.csrf_expire, Duration::ZERO);
    }

    #[test]
    fn test_empty_document_is_all_defaults() {
        assert_eq!(decode("{}").unwrap(), Options::default());
    }

    #[test]
    fn test_missing_providers_use_default_provider() {
        let options = decode(r#"{"providers": []}"#).unwrap();
        assert_eq!(options.providers.len(), 1);
        let provider = &options.providers[0];
        assert_eq!(provider.provider_type, ProviderType::Oidc);
        assert_eq!(provider.oidc.email_claim, "email");
        assert_eq!(provider.oidc.groups_claim, "groups");
        assert_eq!(provider.oidc.audience_claims, vec!["aud"]);
    }

    #[test]
    fn test_unknown_keys_and_nulls_ignored() {
        let options = decode(r#"{"upstreams": ["http://127.0.0.1:8080"], "cookie_name": null}"#).unwrap();
        assert_eq!(options.cookie.name, "_oauth2_proxy");
    }

    #[test]
    fn test_type_mismatch_names_field() {
        let err = decode(r#"{"cookie_secure": "yes"}"#).unwrap_err();
        assert_eq!(err.path(), "cookie_secure");
        assert!(err.message().contains("expected a boolean"), "{err}");
    }

    #[test]
    fn test_bad_duration_names_field() {
        let err = decode(r#"{"cookie_expire": "a week"}"#).unwrap_err();
        assert_eq!(err.path(), "cookie_expire");
        assert!(err.to_string().starts_with("field `cookie_expire`: invalid duration"));

        let err = decode(r#"{"cookie_expire": "-1h"}"#).unwrap_err();
        assert_eq!(err.path(), "cookie_expire");
    }

    #[test]
    fn test_nested_provider_error_path() {
        let err = decode(r#"{"providers": [{"clientID": "a"}, {"oidcConfig": {"skipDiscovery": "no"}}]}"#)
            .unwrap_err();
        assert_eq!(err.path(), "providers[1].oidcConfig.skipDiscovery");
    }
}
