//! Outbound TLS trust for calls to identity providers.
//!
//! Validation decides once, at startup, which roots the HTTP client used for
//! discovery, JWKS and token calls trusts. The decision and the client built
//! from it are returned as a value instead of replacing a process-wide
//! default client.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use reqwest::tls::Version;
use rustls_pki_types::CertificateDer;
use thiserror::Error;

/// Errors raised while building the outbound trust configuration.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read CA file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no certificates found in CA file {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Which roots outbound HTTPS connections trust.
#[derive(Debug, Clone)]
pub enum TlsTrust {
    /// Built-in roots, default protocol versions.
    SystemDefault,
    /// Any certificate is accepted.
    InsecureSkipVerify,
    /// Roots loaded from the primary provider's CA files.
    CustomRoots {
        ca_files: Vec<PathBuf>,
        certificates: Vec<CertificateDer<'static>>,
        use_system_trust_store: bool,
    },
}

impl TlsTrust {
    /// Pick the trust mode. The insecure flag wins over CA files.
    pub fn select(
        insecure_skip_verify: bool,
        ca_files: &[String],
        use_system_trust_store: bool,
    ) -> Result<Self, TlsError> {
        if insecure_skip_verify {
            return Ok(TlsTrust::InsecureSkipVerify);
        }
        if ca_files.is_empty() {
            return Ok(TlsTrust::SystemDefault);
        }

        let ca_files: Vec<PathBuf> = ca_files.iter().map(PathBuf::from).collect();
        let certificates = load_ca_pool(&ca_files)?;
        Ok(TlsTrust::CustomRoots {
            ca_files,
            certificates,
            use_system_trust_store,
        })
    }

    pub fn is_insecure(&self) -> bool {
        matches!(self, TlsTrust::InsecureSkipVerify)
    }

    /// Build an HTTP client honoring this trust mode.
    ///
    /// Custom roots enforce TLS 1.2 as the minimum protocol version.
    pub fn build_client(&self) -> Result<reqwest::Client, TlsError> {
        let builder = reqwest::Client::builder().use_rustls_tls();
        let builder = match self {
            TlsTrust::SystemDefault => builder,
            TlsTrust::InsecureSkipVerify => builder.danger_accept_invalid_certs(true),
            TlsTrust::CustomRoots {
                certificates,
                use_system_trust_store,
                ..
            } => {
                let mut builder = builder
                    .tls_built_in_root_certs(*use_system_trust_store)
                    .min_tls_version(Version::TLS_1_2);
                for der in certificates {
                    builder = builder.add_root_certificate(reqwest::Certificate::from_der(der.as_ref())?);
                }
                builder
            }
        };
        Ok(builder.build()?)
    }
}

/// Trust decision plus the client built from it.
#[derive(Debug, Clone)]
pub struct OutboundTls {
    trust: TlsTrust,
    client: reqwest::Client,
}

impl OutboundTls {
    /// Select the trust mode and build the matching client.
    pub fn configure(
        insecure_skip_verify: bool,
        ca_files: &[String],
        use_system_trust_store: bool,
    ) -> Result<Self, TlsError> {
        let trust = TlsTrust::select(insecure_skip_verify, ca_files, use_system_trust_store)?;
        let client = trust.build_client()?;
        Ok(Self { trust, client })
    }

    pub fn trust(&self) -> &TlsTrust {
        &self.trust
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

/// Load every certificate from a set of PEM bundles.
///
/// A file that cannot be read or holds no certificate fails the whole pool.
pub fn load_ca_pool(paths: &[PathBuf]) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut pool = Vec::new();
    for path in paths {
        let certificates = load_pem_certificates(path)?;
        tracing::debug!(path = %path.display(), count = certificates.len(), "Loaded CA certificates");
        pool.extend(certificates);
    }
    Ok(pool)
}

fn load_pem_certificates(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let read_error = |source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_error)?;
    let mut reader = BufReader::new(file);
    let certificates = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)?;

    if certificates.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certificates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ca_pem() -> String {
        rcgen::generate_simple_self_signed(vec!["ca.internal".to_string()])
            .unwrap()
            .cert
            .pem()
    }

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_insecure_wins_over_ca_files() {
        let trust = TlsTrust::select(true, &["/does/not/exist.pem".to_string()], false).unwrap();
        assert!(trust.is_insecure());
        assert!(trust.build_client().is_ok());
    }

    #[test]
    fn test_no_ca_files_uses_system_default() {
        let trust = TlsTrust::select(false, &[], false).unwrap();
        assert!(matches!(trust, TlsTrust::SystemDefault));
    }

    #[test]
    fn test_custom_roots_loaded_from_bundle() {
        let bundle = format!("{}{}", ca_pem(), ca_pem());
        let file = write_temp(&bundle);
        let path = file.path().to_string_lossy().into_owned();

        let outbound = OutboundTls::configure(false, &[path], true).unwrap();
        match outbound.trust() {
            TlsTrust::CustomRoots {
                certificates,
                use_system_trust_store,
                ca_files,
            } => {
                assert_eq!(certificates.len(), 2);
                assert!(*use_system_trust_store);
                assert_eq!(ca_files, &vec![file.path().to_path_buf()]);
            }
            other => panic!("expected custom roots, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_ca_file_fails() {
        let err = TlsTrust::select(false, &["/does/not/exist.pem".to_string()], false).unwrap_err();
        assert!(matches!(err, TlsError::Read { .. }));
        assert!(err.to_string().contains("/does/not/exist.pem"));
    }

    #[test]
    fn test_bundle_without_certificates_fails() {
        let file = write_temp("just some text\n");
        let path = file.path().to_string_lossy().into_owned();
        let err = TlsTrust::select(false, &[path], false).unwrap_err();
        assert!(matches!(err, TlsError::NoCertificates(_)));
    }
}
