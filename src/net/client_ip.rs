//! Real client address extraction behind a trusted reverse proxy.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientIpError {
    #[error("the http header key ({0}) is either invalid or unsupported")]
    UnsupportedHeader(String),

    #[error("unable to parse ip ({value}) from {header} header")]
    InvalidAddress { value: String, header: &'static str },
}

/// Headers a trusted proxy may use to pass the client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RealClientIpHeader {
    /// `client, proxy1, proxy2`; the first entry is the client.
    XForwardedFor,
    XRealIp,
    XProxyUserIp,
}

impl RealClientIpHeader {
    pub fn as_str(&self) -> &'static str {
        match self {
            RealClientIpHeader::XForwardedFor => "X-Forwarded-For",
            RealClientIpHeader::XRealIp => "X-Real-IP",
            RealClientIpHeader::XProxyUserIp => "X-ProxyUser-IP",
        }
    }
}

/// Parser bound to one trusted header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealClientIpParser {
    header: RealClientIpHeader,
}

impl RealClientIpParser {
    /// Build a parser for `name`, matched case-insensitively.
    pub fn for_header(name: &str) -> Result<Self, ClientIpError> {
        let header = [
            RealClientIpHeader::XForwardedFor,
            RealClientIpHeader::XRealIp,
            RealClientIpHeader::XProxyUserIp,
        ]
        .into_iter()
        .find(|candidate| candidate.as_str().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| ClientIpError::UnsupportedHeader(name.to_string()))?;
        Ok(Self { header })
    }

    pub fn header(&self) -> RealClientIpHeader {
        self.header
    }

    /// Client address carried by the trusted header, if the header is present.
    pub fn real_client_ip(&self, headers: &HeaderMap) -> Result<Option<IpAddr>, ClientIpError> {
        let name = self.header.as_str();
        let Some(raw) = headers.get(name) else {
            return Ok(None);
        };
        let invalid = |value: &str| ClientIpError::InvalidAddress {
            value: value.to_string(),
            header: name,
        };

        let raw = raw
            .to_str()
            .map_err(|_| invalid(&String::from_utf8_lossy(raw.as_bytes())))?;
        let candidate = match self.header {
            RealClientIpHeader::XForwardedFor => raw.split(',').next().unwrap_or_default(),
            RealClientIpHeader::XRealIp | RealClientIpHeader::XProxyUserIp => raw,
        };
        candidate
            .trim()
            .parse::<IpAddr>()
            .map(Some)
            .map_err(|_| invalid(candidate))
    }
}

/// Resolves the client address of a request.
///
/// Without a trusted parser only the socket peer address is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientAddressResolver {
    parser: Option<RealClientIpParser>,
}

impl ClientAddressResolver {
    pub fn direct() -> Self {
        Self { parser: None }
    }

    pub fn trusting(parser: RealClientIpParser) -> Self {
        Self {
            parser: Some(parser),
        }
    }

    pub fn parser(&self) -> Option<&RealClientIpParser> {
        self.parser.as_ref()
    }

    /// Trusted header value when it parses, otherwise the peer address.
    pub fn resolve(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
        if let Some(parser) = &self.parser {
            match parser.real_client_ip(headers) {
                Ok(Some(ip)) => return Some(ip),
                Ok(None) => {}
                Err(err) => tracing::debug!(error = %err, "Ignoring unparsable client address header"),
            }
        }
        peer.map(|addr| addr.ip())
    }

    /// Address for log lines; `-` when unknown.
    pub fn client_string(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        self.resolve(headers, peer)
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: &'static str, value: &'static str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(name, HeaderValue::from_static(value));
        map
    }

    #[test]
    fn test_header_names_case_insensitive() {
        let parser = RealClientIpParser::for_header("x-forwarded-for").unwrap();
        assert_eq!(parser.header(), RealClientIpHeader::XForwardedFor);
        let parser = RealClientIpParser::for_header("X-ProxyUser-IP").unwrap();
        assert_eq!(parser.header(), RealClientIpHeader::XProxyUserIp);
    }

    #[test]
    fn test_unsupported_header_rejected() {
        let err = RealClientIpParser::for_header("X-Client").unwrap_err();
        assert_eq!(err, ClientIpError::UnsupportedHeader("X-Client".into()));
    }

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let parser = RealClientIpParser::for_header("X-Forwarded-For").unwrap();
        let ip = parser
            .real_client_ip(&headers("x-forwarded-for", "203.0.113.9, 10.0.0.1, 10.0.0.2"))
            .unwrap();
        assert_eq!(ip, Some("203.0.113.9".parse().unwrap()));
    }

    #[test]
    fn test_real_ip_accepts_ipv6() {
        let parser = RealClientIpParser::for_header("X-Real-IP").unwrap();
        let ip = parser.real_client_ip(&headers("x-real-ip", " 2001:db8::1 ")).unwrap();
        assert_eq!(ip, Some("2001:db8::1".parse().unwrap()));
    }

    #[test]
    fn test_missing_and_garbage_headers() {
        let parser = RealClientIpParser::for_header("X-Real-IP").unwrap();
        assert_eq!(parser.real_client_ip(&HeaderMap::new()).unwrap(), None);

        let err = parser.real_client_ip(&headers("x-real-ip", "not-an-ip")).unwrap_err();
        assert_eq!(err.to_string(), "unable to parse ip (not-an-ip) from X-Real-IP header");
    }

    #[test]
    fn test_resolver_falls_back_to_peer() {
        let peer: SocketAddr = "192.0.2.10:5555".parse().unwrap();
        let trusting = ClientAddressResolver::trusting(RealClientIpParser::for_header("X-Real-IP").unwrap());

        assert_eq!(
            trusting.client_string(&headers("x-real-ip", "198.51.100.4"), Some(peer)),
            "198.51.100.4"
        );
        assert_eq!(trusting.client_string(&headers("x-real-ip", "junk"), Some(peer)), "192.0.2.10");
        assert_eq!(trusting.client_string(&HeaderMap::new(), None), "-");

        // headers are ignored unless a parser is trusted
        let direct = ClientAddressResolver::direct();
        assert_eq!(direct.client_string(&headers("x-real-ip", "198.51.100.4"), Some(peer)), "192.0.2.10");
    }
}
