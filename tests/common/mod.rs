//! Shared fixtures for integration tests.

use std::io::Write;
use std::path::Path;

use serde_json::{json, Value};
use tempfile::{NamedTempFile, TempDir};

/// A configuration that passes every check.
pub fn valid_config() -> Value {
    json!({
        "cookie_secret": "0123456789abcdef0123456789abcdef",
        "email_domains": ["example.com"],
        "providers": [{
            "clientID": "gateway",
            "clientSecret": "s3cret",
            "oidcConfig": {"issuerURL": "https://idp.example.com/realms/main"}
        }]
    })
}

/// Write `contents` into a fresh file inside `dir`.
pub fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Write a JSON configuration document to a temporary file.
pub fn write_config(config: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(config.to_string().as_bytes()).unwrap();
    file
}

/// PEM bundle holding one freshly minted self-signed certificate.
#[allow(dead_code)]
pub fn ca_bundle(dir: &TempDir) -> std::path::PathBuf {
    let pem = rcgen::generate_simple_self_signed(vec!["idp.internal".to_string()])
        .unwrap()
        .cert
        .pem();
    write_file(dir, "ca.pem", &pem)
}

#[allow(dead_code)]
pub fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
