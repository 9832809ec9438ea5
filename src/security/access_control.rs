//! Email authorization.
//!
//! Decides whether an authenticated email address may use the gateway,
//! from the configured email domains and the authenticated-emails file.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::config::loader::ConfigError;

/// Authorization checker handed to the proxy engine.
#[derive(Debug, Clone, Default)]
pub struct EmailAuthorizer {
    allow_all: bool,
    domains: Vec<String>,
    emails: HashSet<String>,
}

impl EmailAuthorizer {
    /// Build the checker, reading `emails_file` when one is configured.
    ///
    /// An unreadable file is a fatal startup error.
    pub fn new(domains: &[String], emails_file: &str) -> Result<Self, ConfigError> {
        let emails = if emails_file.is_empty() {
            Vec::new()
        } else {
            let path = Path::new(emails_file);
            let content = fs::read_to_string(path).map_err(|source| ConfigError::io(path, source))?;
            let emails: Vec<String> = content.lines().map(str::to_owned).collect();
            tracing::debug!(path = %path.display(), "Loaded authenticated emails file");
            emails
        };
        Ok(Self::from_parts(domains, emails))
    }

    /// Build the checker from in-memory lists.
    pub fn from_parts<I, S>(domains: &[String], emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allow_all = false;
        let mut allowed_domains = Vec::with_capacity(domains.len());
        for domain in domains {
            if domain == "*" {
                allow_all = true;
            } else {
                allowed_domains.push(domain.to_lowercase());
            }
        }

        let emails = emails
            .into_iter()
            .map(|email| email.as_ref().trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect();

        Self {
            allow_all,
            domains: allowed_domains,
            emails,
        }
    }

    pub fn allows_all(&self) -> bool {
        self.allow_all
    }

    /// Number of addresses loaded from the emails file.
    pub fn email_count(&self) -> usize {
        self.emails.len()
    }

    pub fn is_authorized(&self, email: &str) -> bool {
        if email.is_empty() {
            return false;
        }
        if self.allow_all {
            return true;
        }
        let email = email.to_lowercase();
        self.matches_domain(&email) || self.emails.contains(&email)
    }

    fn matches_domain(&self, email: &str) -> bool {
        self.domains.iter().any(|domain| {
            if email
                .strip_suffix(domain.as_str())
                .is_some_and(|local| local.ends_with('@'))
            {
                return true;
            }
            // `.example.com` and `*.example.com` cover every subdomain
            let subdomain = domain.strip_prefix('*').unwrap_or(domain);
            subdomain.starts_with('.') && email.ends_with(subdomain)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn domains(list: &[&str]) -> Vec<String> {
        list.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn test_domain_suffix() {
        let authorizer = EmailAuthorizer::from_parts(&domains(&["Example.com"]), Vec::<String>::new());
        assert!(authorizer.is_authorized("alice@example.com"));
        assert!(authorizer.is_authorized("Bob@EXAMPLE.COM"));
        assert!(!authorizer.is_authorized("mallory@notexample.com"));
        assert!(!authorizer.is_authorized("carol@sub.example.com"));
        assert!(!authorizer.is_authorized(""));
    }

    #[test]
    fn test_subdomain_wildcards() {
        let authorizer =
            EmailAuthorizer::from_parts(&domains(&[".corp.example", "*.lab.example"]), Vec::<String>::new());
        assert!(authorizer.is_authorized("a@eu.corp.example"));
        assert!(authorizer.is_authorized("b@x.lab.example"));
        assert!(!authorizer.is_authorized("c@corp.example"));
    }

    #[test]
    fn test_wildcard_allows_everyone() {
        let authorizer = EmailAuthorizer::from_parts(&domains(&["*"]), Vec::<String>::new());
        assert!(authorizer.allows_all());
        assert!(authorizer.is_authorized("anyone@anywhere.test"));
        assert!(!authorizer.is_authorized(""));
    }

    #[test]
    fn test_emails_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  Alice@Partner.test ").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "bob@partner.test").unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let authorizer = EmailAuthorizer::new(&[], &path).unwrap();
        assert_eq!(authorizer.email_count(), 2);
        assert!(authorizer.is_authorized("alice@partner.test"));
        assert!(authorizer.is_authorized("BOB@partner.test"));
        assert!(!authorizer.is_authorized("carol@partner.test"));
    }

    #[test]
    fn test_unreadable_emails_file() {
        let err = EmailAuthorizer::new(&[], "/does/not/exist").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
