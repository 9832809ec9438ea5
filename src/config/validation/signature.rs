//! Legacy `algorithm:secret` signature key.

use crate::config::capabilities::{SignatureData, SignatureHash};

pub(super) fn parse_signature_key(raw: &str, violations: &mut Vec<String>) -> Option<SignatureData> {
    if raw.is_empty() {
        return None;
    }

    tracing::warn!("`signature_key` is deprecated and will be removed in a future release");

    let components: Vec<&str> = raw.split(':').collect();
    let [algorithm, secret] = components.as_slice() else {
        violations.push(format!("invalid signature hash:key spec: {raw}"));
        return None;
    };
    if algorithm.is_empty() || secret.is_empty() {
        violations.push(format!("invalid signature hash:key spec: {raw}"));
        return None;
    }

    match algorithm.parse::<SignatureHash>() {
        Ok(hash) => Some(SignatureData::new(hash, *secret)),
        Err(()) => {
            violations.push(format!("unsupported signature hash algorithm: {raw}"));
            None
        }
    }
}
