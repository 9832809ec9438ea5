//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Build the access-log layer used by the proxy engine
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level configurable via `RUST_LOG`, falling back to the CLI default
//! - The access log resolves client addresses through the resolver that
//!   validation derived, so proxy headers are only honored when trusted

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::net::client_ip::ClientAddressResolver;

/// Install the global subscriber. `RUST_LOG` wins over `default_directive`.
pub fn init(default_directive: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Default filter for a plain level name such as `info`.
pub fn default_directive(level: &str) -> String {
    format!("oidc_gateway={level},tower_http={level}")
}

/// HTTP trace layer whose request span carries the resolved client address.
pub fn access_log_layer(
    resolver: ClientAddressResolver,
) -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, impl Fn(&Request<Body>) -> Span + Clone> {
    TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let client = request_client(&resolver, request);
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            client = %client,
        )
    })
}

/// Client address of `request` for log lines.
pub fn request_client<B>(resolver: &ClientAddressResolver, request: &Request<B>) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    resolver.client_string(request.headers(), peer)
}

/// Run `f` with a thread-local subscriber and return what it logged.
#[cfg(test)]
pub(crate) fn capture_logs(f: impl FnOnce()) -> String {
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);

    let bytes = captured.0.lock().unwrap().clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::client_ip::RealClientIpParser;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn request_from(peer: &str, forwarded: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri("/")
            .extension(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
        if let Some(value) = forwarded {
            builder = builder.header("X-Forwarded-For", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_direct_resolver_uses_peer() {
        let request = request_from("192.0.2.1:4000", Some("203.0.113.5"));
        assert_eq!(request_client(&ClientAddressResolver::direct(), &request), "192.0.2.1");
    }

    #[test]
    fn test_trusted_header_wins() {
        let resolver =
            ClientAddressResolver::trusting(RealClientIpParser::for_header("X-Forwarded-For").unwrap());
        let request = request_from("192.0.2.1:4000", Some("203.0.113.5, 192.0.2.1"));
        assert_eq!(request_client(&resolver, &request), "203.0.113.5");
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive("warn"), "oidc_gateway=warn,tower_http=warn");
    }

    #[tokio::test]
    async fn test_layer_passes_requests_through() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(access_log_layer(ClientAddressResolver::direct()));

        let response = app
            .oneshot(request_from("192.0.2.1:4000", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
