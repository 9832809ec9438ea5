//! OAuth redirect URL.

use url::Url;

use crate::config::capabilities::RedirectUrl;

/// Parse the configured redirect URL. Malformed input yields a violation
/// and [`RedirectUrl::Unset`].
pub(super) fn parse_redirect_url(raw: &str, violations: &mut Vec<String>) -> RedirectUrl {
    if raw.is_empty() {
        return RedirectUrl::Unset;
    }

    match Url::parse(raw) {
        Ok(url) => RedirectUrl::Absolute(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => match check_relative(raw) {
            Ok(()) => RedirectUrl::Relative(raw.to_string()),
            Err(err) => {
                violations.push(format!("error parsing redirect-url={raw:?} {err}"));
                RedirectUrl::Unset
            }
        },
        Err(err) => {
            violations.push(format!("error parsing redirect-url={raw:?} {err}"));
            RedirectUrl::Unset
        }
    }
}

// A relative reference must not start with a bare colon or carry one in
// its first path segment, and must resolve against some base.
fn check_relative(raw: &str) -> Result<(), String> {
    if raw.starts_with(':') {
        return Err("missing protocol scheme".to_string());
    }

    let reference = raw.split(['?', '#']).next().unwrap_or_default();
    if !reference.starts_with('/') {
        let first_segment = reference.split('/').next().unwrap_or_default();
        if first_segment.contains(':') {
            return Err("first path segment in URL cannot contain colon".to_string());
        }
    }

    let base = Url::parse("http://localhost/").map_err(|err| err.to_string())?;
    base.join(raw).map(|_| ()).map_err(|err| err.to_string())
}
