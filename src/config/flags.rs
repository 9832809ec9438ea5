//! Command-line flags.
//!
//! Each flag mirrors one top-level configuration key. Only flags given on
//! the command line end up in the overlay, so they replace the file value
//! for that key and leave every other key alone. Values go through the
//! same coercions as file values.

use clap::Args;

use crate::config::canonical::{Mapping, Value};

#[derive(Debug, Clone, Default, Args)]
pub struct ConfigFlags {
    /// URL path prefix for the gateway's own endpoints
    #[arg(long)]
    pub proxy_prefix: Option<String>,

    /// Trust X-Forwarded-* headers from a reverse proxy
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub reverse_proxy: Option<bool>,

    /// Header carrying the real client address (X-Real-IP, X-Forwarded-For, X-ProxyUser-IP)
    #[arg(long)]
    pub real_client_ip_header: Option<String>,

    /// OAuth redirect URL
    #[arg(long)]
    pub redirect_url: Option<String>,

    /// Allow a relative OAuth redirect URL
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub relative_redirect_url: Option<bool>,

    /// File with one authorized email address per line
    #[arg(long)]
    pub authenticated_emails_file: Option<String>,

    /// Authorize emails in these domains; `*` authorizes everyone
    #[arg(long = "email-domain", value_delimiter = ',')]
    pub email_domains: Option<Vec<String>>,

    /// Domains allowed as redirect targets after login
    #[arg(long = "whitelist-domain", value_delimiter = ',')]
    pub whitelist_domains: Option<Vec<String>>,

    #[arg(long)]
    pub cookie_name: Option<String>,

    /// Seed secret for secure cookies (16, 24 or 32 bytes, optionally base64)
    #[arg(long)]
    pub cookie_secret: Option<String>,

    #[arg(long = "cookie-domain", value_delimiter = ',')]
    pub cookie_domains: Option<Vec<String>>,

    #[arg(long)]
    pub cookie_path: Option<String>,

    /// Cookie lifetime, e.g. `168h`
    #[arg(long)]
    pub cookie_expire: Option<String>,

    /// Refresh the session after this long; `0` disables refresh
    #[arg(long)]
    pub cookie_refresh: Option<String>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub cookie_secure: Option<bool>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub cookie_httponly: Option<bool>,

    /// `lax`, `strict`, `none` or empty
    #[arg(long)]
    pub cookie_samesite: Option<String>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub cookie_csrf_per_request: Option<bool>,

    #[arg(long)]
    pub cookie_csrf_expire: Option<String>,

    #[arg(long)]
    pub session_store_type: Option<String>,

    /// Keep OAuth tokens out of cookie sessions
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub session_cookie_minimal: Option<bool>,

    /// Skip TLS verification for provider connections
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub ssl_insecure_skip_verify: Option<bool>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub skip_auth_preflight: Option<bool>,

    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub encode_state: Option<bool>,

    /// Deprecated `algorithm:secret` request signature key
    #[arg(long)]
    pub signature_key: Option<String>,
}

impl ConfigFlags {
    /// Canonical overlay holding every flag that was given.
    pub fn to_overlay(&self) -> Mapping {
        let string = |value: &Option<String>| value.clone().map(Value::string);
        let boolean = |value: &Option<bool>| value.map(Value::bool);
        // rejoined so the list coercion sees the same text a file value would
        let list = |value: &Option<Vec<String>>| {
            value.as_ref().map(|items| Value::string(items.join(",")))
        };

        [
            ("proxy_prefix", string(&self.proxy_prefix)),
            ("reverse_proxy", boolean(&self.reverse_proxy)),
            ("real_client_ip_header", string(&self.real_client_ip_header)),
            ("redirect_url", string(&self.redirect_url)),
            ("relative_redirect_url", boolean(&self.relative_redirect_url)),
            ("authenticated_emails_file", string(&self.authenticated_emails_file)),
            ("email_domains", list(&self.email_domains)),
            ("whitelist_domains", list(&self.whitelist_domains)),
            ("cookie_name", string(&self.cookie_name)),
            ("cookie_secret", string(&self.cookie_secret)),
            ("cookie_domains", list(&self.cookie_domains)),
            ("cookie_path", string(&self.cookie_path)),
            ("cookie_expire", string(&self.cookie_expire)),
            ("cookie_refresh", string(&self.cookie_refresh)),
            ("cookie_secure", boolean(&self.cookie_secure)),
            ("cookie_httponly", boolean(&self.cookie_httponly)),
            ("cookie_samesite", string(&self.cookie_samesite)),
            ("cookie_csrf_per_request", boolean(&self.cookie_csrf_per_request)),
            ("cookie_csrf_expire", string(&self.cookie_csrf_expire)),
            ("session_store_type", string(&self.session_store_type)),
            ("session_cookie_minimal", boolean(&self.session_cookie_minimal)),
            ("ssl_insecure_skip_verify", boolean(&self.ssl_insecure_skip_verify)),
            ("skip_auth_preflight", boolean(&self.skip_auth_preflight)),
            ("encode_state", boolean(&self.encode_state)),
            ("signature_key", string(&self.signature_key)),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.to_string(), value)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::coerce;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        flags: ConfigFlags,
    }

    fn parse(args: &[&str]) -> Mapping {
        let cli = TestCli::try_parse_from(std::iter::once("test").chain(args.iter().copied())).unwrap();
        cli.flags.to_overlay()
    }

    #[test]
    fn test_no_flags_no_overlay() {
        assert!(parse(&[]).is_empty());
    }

    #[test]
    fn test_bool_flag_forms() {
        let overlay = parse(&["--reverse-proxy", "--cookie-secure=false"]);
        assert_eq!(overlay["reverse_proxy"], Value::bool(true));
        assert_eq!(overlay["cookie_secure"], Value::bool(false));
        assert_eq!(overlay.len(), 2);
    }

    #[test]
    fn test_list_flags_split_and_repeat() {
        let overlay = parse(&["--email-domain", "a.com,b.com", "--email-domain=c.com"]);
        let domains: Vec<String> = coerce::string_list(overlay["email_domains"].clone()).unwrap();
        assert_eq!(domains, vec!["a.com", "b.com", "c.com"]);
    }

    #[test]
    fn test_empty_list_flag_is_empty_list() {
        let overlay = parse(&["--email-domain=", "--cookie-domain="]);
        for key in ["email_domains", "cookie_domains"] {
            let items: Vec<String> = coerce::string_list(overlay[key].clone()).unwrap();
            assert!(items.is_empty(), "{key}: {items:?}");
        }
    }

    #[test]
    fn test_string_flags_keep_raw_text() {
        let overlay = parse(&["--cookie-expire", "1h30m", "--signature-key", "sha256:k"]);
        assert_eq!(overlay["cookie_expire"], Value::string("1h30m"));
        assert_eq!(overlay["signature_key"], Value::string("sha256:k"));
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let result = TestCli::try_parse_from(["test", "--encode-state=maybe"]);
        assert!(result.is_err());
    }
}
