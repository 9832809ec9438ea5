//! Configuration schema definitions.
//!
//! [`Options`] holds everything a user may supply. It is plain data: it is
//! freely decodable and carries no derived state. Values computed during
//! validation live in [`crate::config::capabilities`] instead.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::config::coerce;

/// Generic email claim used by OIDC providers.
pub const OIDC_EMAIL_CLAIM: &str = "email";

/// Generic groups claim used by OIDC providers.
pub const OIDC_GROUPS_CLAIM: &str = "groups";

/// Claim verified against the client id by default.
pub const OIDC_AUDIENCE_CLAIM: &str = "aud";

/// Session store type that keeps the whole session in the cookie.
pub const COOKIE_SESSION_STORE: &str = "cookie";

/// Root configuration for the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// URL root path the gateway's own endpoints are nested under.
    pub proxy_prefix: String,

    /// Whether the gateway sits behind a trusted reverse proxy.
    pub reverse_proxy: bool,

    /// Header carrying the real client address when `reverse_proxy` is set.
    pub real_client_ip_header: String,

    /// OAuth redirect URL as supplied; may be empty.
    pub raw_redirect_url: String,

    /// Allow a relative OAuth redirect URL.
    pub relative_redirect_url: bool,

    /// File with one authorized email address per line.
    pub authenticated_emails_file: String,

    /// Email domains to authorize; `*` authorizes every address.
    pub email_domains: Vec<String>,

    /// Domains allowed as post-authentication redirect targets.
    pub whitelist_domains: Vec<String>,

    pub cookie: CookieOptions,

    pub session: SessionOptions,

    /// Upstream identity providers. Never empty after decoding.
    pub providers: Vec<Provider>,

    /// Skip certificate validation for outbound HTTPS to providers.
    pub ssl_insecure_skip_verify: bool,

    /// Skip authentication for OPTIONS requests.
    pub skip_auth_preflight: bool,

    /// Base64-encode the OAuth state parameter.
    pub encode_state: bool,

    /// Deprecated `algorithm:secret` request signature key.
    pub signature_key: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            proxy_prefix: "/oauth2".to_string(),
            reverse_proxy: false,
            real_client_ip_header: "X-Real-IP".to_string(),
            raw_redirect_url: String::new(),
            relative_redirect_url: false,
            authenticated_emails_file: String::new(),
            email_domains: Vec::new(),
            whitelist_domains: Vec::new(),
            cookie: CookieOptions::default(),
            session: SessionOptions::default(),
            providers: default_providers(),
            ssl_insecure_skip_verify: false,
            skip_auth_preflight: false,
            encode_state: false,
            signature_key: String::new(),
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieOptions {
    pub name: String,

    /// Seed secret for cookie encryption and signing.
    pub secret: String,

    /// Cookie domains; the most specific matching one is used.
    pub domains: Vec<String>,

    pub path: String,

    /// Cookie lifetime. Zero means a session cookie.
    pub expire: Duration,

    /// Refresh the session after this long. Zero disables refresh.
    pub refresh: Duration,

    pub secure: bool,

    pub http_only: bool,

    /// `""`, `lax`, `strict` or `none`.
    pub same_site: String,

    /// Use a distinct CSRF cookie per login attempt.
    pub csrf_per_request: bool,

    pub csrf_expire: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: "_oauth2_proxy".to_string(),
            secret: String::new(),
            domains: Vec::new(),
            path: "/".to_string(),
            expire: Duration::from_secs(168 * 60 * 60),
            refresh: Duration::ZERO,
            secure: true,
            http_only: true,
            same_site: String::new(),
            csrf_per_request: false,
            csrf_expire: Duration::from_secs(15 * 60),
        }
    }
}

/// Session store settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    pub store_type: String,

    /// Strip OAuth tokens from cookie sessions.
    pub cookie_minimal: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            store_type: COOKIE_SESSION_STORE.to_string(),
            cookie_minimal: false,
        }
    }
}

/// Provider kind. Unknown names are kept so validation can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ProviderType {
    Adfs,
    Azure,
    Bitbucket,
    DigitalOcean,
    Facebook,
    GitHub,
    GitLab,
    Google,
    Keycloak,
    KeycloakOidc,
    LinkedIn,
    LoginGov,
    NextCloud,
    #[default]
    Oidc,
    Unsupported(String),
}

impl ProviderType {
    pub const SUPPORTED: [ProviderType; 14] = [
        ProviderType::Adfs,
        ProviderType::Azure,
        ProviderType::Bitbucket,
        ProviderType::DigitalOcean,
        ProviderType::Facebook,
        ProviderType::GitHub,
        ProviderType::GitLab,
        ProviderType::Google,
        ProviderType::Keycloak,
        ProviderType::KeycloakOidc,
        ProviderType::LinkedIn,
        ProviderType::LoginGov,
        ProviderType::NextCloud,
        ProviderType::Oidc,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ProviderType::Adfs => "adfs",
            ProviderType::Azure => "azure",
            ProviderType::Bitbucket => "bitbucket",
            ProviderType::DigitalOcean => "digitalocean",
            ProviderType::Facebook => "facebook",
            ProviderType::GitHub => "github",
            ProviderType::GitLab => "gitlab",
            ProviderType::Google => "google",
            ProviderType::Keycloak => "keycloak",
            ProviderType::KeycloakOidc => "keycloak-oidc",
            ProviderType::LinkedIn => "linkedin",
            ProviderType::LoginGov => "login.gov",
            ProviderType::NextCloud => "nextcloud",
            ProviderType::Oidc => "oidc",
            ProviderType::Unsupported(name) => name,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ProviderType::Unsupported(_))
    }

    /// Providers that authenticate through OIDC discovery and ID tokens.
    pub fn is_oidc_based(&self) -> bool {
        matches!(
            self,
            ProviderType::Oidc | ProviderType::KeycloakOidc | ProviderType::Adfs
        )
    }
}

impl From<&str> for ProviderType {
    fn from(name: &str) -> Self {
        match name {
            "adfs" => ProviderType::Adfs,
            "azure" => ProviderType::Azure,
            "bitbucket" => ProviderType::Bitbucket,
            "digitalocean" => ProviderType::DigitalOcean,
            "facebook" => ProviderType::Facebook,
            "github" => ProviderType::GitHub,
            "gitlab" => ProviderType::GitLab,
            "google" => ProviderType::Google,
            "keycloak" => ProviderType::Keycloak,
            "keycloak-oidc" => ProviderType::KeycloakOidc,
            "linkedin" => ProviderType::LinkedIn,
            "login.gov" => ProviderType::LoginGov,
            "nextcloud" => ProviderType::NextCloud,
            // An explicitly empty type means "not specified".
            "" | "oidc" => ProviderType::Oidc,
            other => ProviderType::Unsupported(other.to_string()),
        }
    }
}

impl From<String> for ProviderType {
    fn from(name: String) -> Self {
        ProviderType::from(name.as_str())
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One upstream identity provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Provider {
    /// OAuth client id registered with the provider.
    #[serde(rename = "clientID")]
    pub client_id: String,

    #[serde(rename = "clientSecret")]
    pub client_secret: String,

    /// Read the client secret from this file when `client_secret` is empty.
    #[serde(rename = "clientSecretFile")]
    pub client_secret_file: String,

    #[serde(rename = "oidcConfig")]
    pub oidc: OidcOptions,

    /// Unique provider id; derived from type and client id when empty.
    pub id: String,

    #[serde(rename = "provider")]
    pub provider_type: ProviderType,

    /// Display name for the sign-in page.
    pub name: String,

    /// PEM bundles to trust when talking to the provider.
    #[serde(rename = "caFiles", deserialize_with = "coerce::string_list")]
    pub ca_files: Vec<String>,

    /// Trust the built-in roots in addition to `ca_files`.
    #[serde(rename = "useSystemTrustStore")]
    pub use_system_trust_store: bool,

    #[serde(rename = "loginURL")]
    pub login_url: String,

    #[serde(rename = "redeemURL")]
    pub redeem_url: String,

    #[serde(rename = "profileURL")]
    pub profile_url: String,

    #[serde(rename = "skipClaimsFromProfileURL")]
    pub skip_claims_from_profile_url: bool,

    /// Protected resource (Azure and ADFS only).
    #[serde(rename = "resource")]
    pub protected_resource: String,

    #[serde(rename = "validateURL")]
    pub validate_url: String,

    pub scope: String,

    #[serde(rename = "allowedGroups", deserialize_with = "coerce::string_list")]
    pub allowed_groups: Vec<String>,

    #[serde(rename = "code_challenge_method")]
    pub code_challenge_method: String,

    /// Backend logout endpoint; `{id_token}` is substituted.
    #[serde(rename = "backendLogoutURL")]
    pub backend_logout_url: String,
}

impl Default for Provider {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            client_secret_file: String::new(),
            oidc: OidcOptions::default(),
            id: String::new(),
            provider_type: ProviderType::Oidc,
            name: String::new(),
            ca_files: Vec::new(),
            use_system_trust_store: false,
            login_url: String::new(),
            redeem_url: String::new(),
            profile_url: String::new(),
            skip_claims_from_profile_url: false,
            protected_resource: String::new(),
            validate_url: String::new(),
            scope: String::new(),
            allowed_groups: Vec::new(),
            code_challenge_method: String::new(),
            backend_logout_url: String::new(),
        }
    }
}

impl Provider {
    /// The configured id, or `<type>=<clientID>` when none was given.
    pub fn effective_id(&self) -> String {
        if self.id.is_empty() {
            format!("{}={}", self.provider_type, self.client_id)
        } else {
            self.id.clone()
        }
    }
}

/// OIDC settings for OIDC-based providers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OidcOptions {
    #[serde(rename = "issuerURL")]
    pub issuer_url: String,

    /// Accept ID tokens whose email is not verified.
    #[serde(rename = "insecureAllowUnverifiedEmail")]
    pub insecure_allow_unverified_email: bool,

    /// Do not require the token issuer to match the discovery URL.
    #[serde(rename = "insecureSkipIssuerVerification")]
    pub insecure_skip_issuer_verification: bool,

    /// Do not verify the ID token nonce.
    #[serde(rename = "insecureSkipNonce")]
    pub insecure_skip_nonce: bool,

    /// Use manually supplied endpoints instead of discovery.
    #[serde(rename = "skipDiscovery")]
    pub skip_discovery: bool,

    #[serde(rename = "jwksURL")]
    pub jwks_url: String,

    #[serde(rename = "emailClaim")]
    pub email_claim: String,

    #[serde(rename = "groupsClaim")]
    pub groups_claim: String,

    #[serde(rename = "userIDClaim")]
    pub user_id_claim: String,

    /// Claims verified against the client id.
    #[serde(rename = "audienceClaims", deserialize_with = "coerce::string_list")]
    pub audience_claims: Vec<String>,

    /// Audiences accepted in addition to the client id.
    #[serde(rename = "extraAudiences", deserialize_with = "coerce::string_list")]
    pub extra_audiences: Vec<String>,
}

impl Default for OidcOptions {
    fn default() -> Self {
        Self {
            issuer_url: String::new(),
            insecure_allow_unverified_email: false,
            insecure_skip_issuer_verification: false,
            insecure_skip_nonce: true,
            skip_discovery: false,
            jwks_url: String::new(),
            email_claim: OIDC_EMAIL_CLAIM.to_string(),
            groups_claim: OIDC_GROUPS_CLAIM.to_string(),
            user_id_claim: OIDC_EMAIL_CLAIM.to_string(),
            audience_claims: vec![OIDC_AUDIENCE_CLAIM.to_string()],
            extra_audiences: Vec::new(),
        }
    }
}

/// The provider list used when none is configured.
pub fn default_providers() -> Vec<Provider> {
    vec![Provider::default()]
}

/// Decode the provider list. Every entry starts from [`Provider::default`];
/// an absent or empty list becomes [`default_providers`].
pub fn providers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Provider>, D::Error> {
    let decoded = Option::<Vec<Provider>>::deserialize(deserializer)?.unwrap_or_default();
    if decoded.is_empty() {
        Ok(default_providers())
    } else {
        Ok(decoded)
    }
}
