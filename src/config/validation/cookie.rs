//! Cookie and session checks.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::config::duration::format_duration;
use crate::config::schema::{CookieOptions, SessionOptions};

const AES_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

const MAX_COOKIE_NAME_LEN: usize = 256;

pub(super) fn validate_cookie(cookie: &CookieOptions, violations: &mut Vec<String>) {
    validate_secret(&cookie.secret, violations);

    if !cookie.expire.is_zero() && cookie.refresh >= cookie.expire {
        violations.push(format!(
            "cookie_refresh ({:?}) must be less than cookie_expire ({:?})",
            format_duration(cookie.refresh),
            format_duration(cookie.expire),
        ));
    }

    match cookie.same_site.as_str() {
        "" | "lax" | "strict" | "none" => {}
        other => violations.push(format!(
            "cookie_samesite ({other:?}) must be one of ['', 'lax', 'strict', 'none']"
        )),
    }

    validate_name(&cookie.name, violations);
}

pub(super) fn validate_session(
    session: &SessionOptions,
    cookie: &CookieOptions,
    violations: &mut Vec<String>,
) {
    if session.cookie_minimal && !cookie.refresh.is_zero() {
        violations.push(
            "cookie_refresh > 0 requires oauth tokens in sessions. session_cookie_minimal cannot be set"
                .to_string(),
        );
    }
}

fn validate_secret(secret: &str, violations: &mut Vec<String>) {
    if secret.is_empty() {
        violations.push("missing setting: cookie-secret".to_string());
        return;
    }

    let (bytes, decoded) = secret_bytes(secret);
    if AES_KEY_LENGTHS.contains(&bytes.len()) {
        return;
    }
    let note = if decoded {
        " note: cookie secret was base64 decoded"
    } else {
        ""
    };
    violations.push(format!(
        "cookie_secret must be 16, 24, or 32 bytes to create an AES cipher, but is {} bytes.{note}",
        bytes.len()
    ));
}

/// Key material for a cookie secret, and whether it came from base64.
///
/// Decoded bytes win when they have an AES key length. A raw secret of a
/// valid length is used as is. Otherwise the decoded length is reported
/// when decoding worked at all.
fn secret_bytes(secret: &str) -> (Vec<u8>, bool) {
    let raw = secret.as_bytes();
    match URL_SAFE_NO_PAD.decode(secret.trim_end_matches('=')) {
        Ok(decoded) if AES_KEY_LENGTHS.contains(&decoded.len()) => (decoded, true),
        _ if AES_KEY_LENGTHS.contains(&raw.len()) => (raw.to_vec(), false),
        Ok(decoded) => (decoded, true),
        Err(_) => (raw.to_vec(), false),
    }
}

fn validate_name(name: &str, violations: &mut Vec<String>) {
    if name.is_empty() || !name.bytes().all(is_token_byte) {
        violations.push(format!("invalid cookie name: {name:?}"));
    }
    if name.len() > MAX_COOKIE_NAME_LEN {
        violations.push(format!(
            "cookie name should be under 256 characters: cookie name is {} characters",
            name.len()
        ));
    }
}

// RFC 7230 tchar
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
