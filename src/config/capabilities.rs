//! Values derived by validation.
//!
//! Nothing here can be decoded from user input. [`ValidatedConfig`] joins
//! the user-supplied [`Options`] with the [`Capabilities`] the validator
//! computed, and only the validator can construct it.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::config::schema::Options;
use crate::net::client_ip::ClientAddressResolver;
use crate::net::tls::OutboundTls;

/// Redirect URL after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RedirectUrl {
    /// No redirect URL configured; derived from each request.
    #[default]
    Unset,
    Absolute(Url),
    /// Path-only reference resolved against the request host.
    Relative(String),
}

impl RedirectUrl {
    pub fn is_set(&self) -> bool {
        !matches!(self, RedirectUrl::Unset)
    }

    pub fn as_url(&self) -> Option<&Url> {
        match self {
            RedirectUrl::Absolute(url) => Some(url),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RedirectUrl::Unset => "",
            RedirectUrl::Absolute(url) => url.as_str(),
            RedirectUrl::Relative(path) => path,
        }
    }
}

/// Hash algorithms accepted for the legacy signature key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureHash {
    Md5,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl SignatureHash {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureHash::Md5 => "md5",
            SignatureHash::Sha1 => "sha1",
            SignatureHash::Sha224 => "sha224",
            SignatureHash::Sha256 => "sha256",
            SignatureHash::Sha384 => "sha384",
            SignatureHash::Sha512 => "sha512",
        }
    }
}

impl FromStr for SignatureHash {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "md5" => Ok(SignatureHash::Md5),
            "sha1" => Ok(SignatureHash::Sha1),
            "sha224" => Ok(SignatureHash::Sha224),
            "sha256" => Ok(SignatureHash::Sha256),
            "sha384" => Ok(SignatureHash::Sha384),
            "sha512" => Ok(SignatureHash::Sha512),
            _ => Err(()),
        }
    }
}

impl fmt::Display for SignatureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash algorithm and secret parsed from the legacy signature key.
#[derive(Clone, PartialEq, Eq)]
pub struct SignatureData {
    hash: SignatureHash,
    key: String,
}

impl SignatureData {
    pub(crate) fn new(hash: SignatureHash, key: impl Into<String>) -> Self {
        Self {
            hash,
            key: key.into(),
        }
    }

    pub fn hash(&self) -> SignatureHash {
        self.hash
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for SignatureData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureData")
            .field("hash", &self.hash)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Settings an ID-token verifier is built from for the primary provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenVerifierSettings {
    pub provider_id: String,
    pub client_id: String,
    pub issuer_url: Option<Url>,
    pub jwks_url: Option<Url>,
    pub skip_discovery: bool,
    /// Client id followed by any extra audiences.
    pub audiences: Vec<String>,
    pub audience_claims: Vec<String>,
    pub email_claim: String,
    pub groups_claim: String,
    pub user_id_claim: String,
    pub skip_issuer_verification: bool,
    pub skip_nonce: bool,
    pub allow_unverified_email: bool,
}

/// Everything validation derives from [`Options`].
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub(crate) redirect_url: RedirectUrl,
    pub(crate) signature: Option<SignatureData>,
    pub(crate) oidc_verifier: Option<TokenVerifierSettings>,
    pub(crate) client_address: ClientAddressResolver,
    pub(crate) outbound: OutboundTls,
}

impl Capabilities {
    pub fn redirect_url(&self) -> &RedirectUrl {
        &self.redirect_url
    }

    pub fn signature_data(&self) -> Option<&SignatureData> {
        self.signature.as_ref()
    }

    pub fn oidc_verifier(&self) -> Option<&TokenVerifierSettings> {
        self.oidc_verifier.as_ref()
    }

    /// Client address extraction for access logs and rate limits.
    pub fn client_address(&self) -> &ClientAddressResolver {
        &self.client_address
    }

    /// Trust decision and HTTP client for calls to providers.
    pub fn outbound(&self) -> &OutboundTls {
        &self.outbound
    }
}

/// A configuration that passed every check.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    options: Options,
    capabilities: Capabilities,
}

impl ValidatedConfig {
    pub(crate) fn new(options: Options, capabilities: Capabilities) -> Self {
        Self {
            options,
            capabilities,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn into_parts(self) -> (Options, Capabilities) {
        (self.options, self.capabilities)
    }
}
