//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: CORS preprocessing, route table
//! lookup under `/api/v1`, dispatch, and access logging.

use crate::config::AppState;
use crate::handler::{conversions, health};
use crate::http::{self, cors};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::header::{HeaderName, REFERER, USER_AGENT};
use hyper::{Method, Request, Response, Version};
use std::net::SocketAddr;
use std::time::Instant;

/// Version prefix every route lives under
pub const API_PREFIX: &str = "/api/v1";

/// Routes registered under [`API_PREFIX`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Conversions,
    Health,
}

impl Endpoint {
    /// Look up the route table. Only `GET` is routed.
    pub fn resolve(method: &Method, path: &str) -> Option<Self> {
        if method != Method::GET {
            return None;
        }
        match path.strip_prefix(API_PREFIX)? {
            "/conversions" => Some(Self::Conversions),
            "/health" => Some(Self::Health),
            _ => None,
        }
    }
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub fn handle_request<B>(
    req: &Request<B>,
    state: &AppState,
    peer_addr: SocketAddr,
) -> Response<Full<Bytes>> {
    let started = Instant::now();

    let response = if cors::is_preflight(req) {
        state.cors.preflight_response(req.headers())
    } else {
        let mut response = route_request(req, state);
        state.cors.apply(req.headers(), &mut response);
        response
    };

    let logging = &state.config.logging;
    if logging.access_log {
        let entry = build_access_log_entry(req, &response, peer_addr, started);
        logger::log_access(&entry, &logging.access_log_format);
    }

    response
}

/// Dispatch to the handler registered for the request's method and path
fn route_request<B>(req: &Request<B>, state: &AppState) -> Response<Full<Bytes>> {
    match Endpoint::resolve(req.method(), req.uri().path()) {
        Some(Endpoint::Conversions) => conversions::get_conversions(state),
        Some(Endpoint::Health) => health::get_health(),
        None => http::build_404_response(),
    }
}

/// Build the access log record for a finished request.
/// The client address is always the transport peer.
fn build_access_log_entry<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dataset::Dataset;
    use http_body_util::BodyExt;
    use hyper::header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_REQUEST_METHOD, CONTENT_TYPE, ORIGIN,
    };
    use hyper::StatusCode;

    const SAMPLE: &str = r#"{"lastUpdated":"2025-01-01","dataSource":"x","config":{},"programs":{"a":{}},"conversions":[]}"#;
    const HEALTH_BODY: &str = r#"{"status":"healthy","message":"Points Converter API is running"}"#;

    fn test_state(dataset: Option<&str>) -> AppState {
        let mut config =
            Config::load_from("this-config-file-does-not-exist", ::config::Map::new()).unwrap();
        config.logging.access_log = false;
        let dataset =
            dataset.map(|json| Dataset::from_slice("conversions.json", json.as_bytes()).unwrap());
        AppState::new(config, dataset)
    }

    fn peer() -> SocketAddr {
        "203.0.113.7:51000".parse().unwrap()
    }

    fn get(path: &str, origin: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(origin) = origin {
            builder = builder.header(ORIGIN, origin);
        }
        builder.body(()).unwrap()
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_route_table() {
        assert_eq!(
            Endpoint::resolve(&Method::GET, "/api/v1/conversions"),
            Some(Endpoint::Conversions)
        );
        assert_eq!(
            Endpoint::resolve(&Method::GET, "/api/v1/health"),
            Some(Endpoint::Health)
        );
        for path in [
            "/",
            "/api/v1",
            "/api/v1/",
            "/api/v1/health/",
            "/api/v2/health",
            "/conversions",
            "/api/v1/conversionsx",
        ] {
            assert_eq!(Endpoint::resolve(&Method::GET, path), None, "{path}");
        }
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            assert_eq!(Endpoint::resolve(&method, "/api/v1/health"), None);
        }
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state(Some(SAMPLE));
        let response = handle_request(&get("/api/v1/health", None), &state, peer());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, HEALTH_BODY);
    }

    #[tokio::test]
    async fn test_health_without_dataset() {
        let state = test_state(None);
        let response = handle_request(&get("/api/v1/health", None), &state, peer());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, HEALTH_BODY);
    }

    #[tokio::test]
    async fn test_conversions_from_allowed_origin() {
        let state = test_state(Some(SAMPLE));
        let req = get("/api/v1/conversions", Some("https://points-converter.com"));
        let response = handle_request(&req, &state, peer());

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));
        assert_eq!(
            response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://points-converter.com"
        );

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        let expected: serde_json::Value = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(body, expected);
        for key in ["lastUpdated", "dataSource", "config", "programs", "conversions"] {
            assert!(body.get(key).is_some(), "{key} missing");
        }
    }

    #[tokio::test]
    async fn test_conversions_from_disallowed_origin() {
        let state = test_state(Some(SAMPLE));
        let req = get("/api/v1/conversions", Some("https://evil.example"));
        let response = handle_request(&req, &state, peer());

        // Body is served; the browser is the one that blocks it
        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
        assert_eq!(body_string(response).await, SAMPLE);
    }

    #[tokio::test]
    async fn test_conversions_ignores_query() {
        let state = test_state(Some(SAMPLE));
        let response = handle_request(&get("/api/v1/conversions?program=a", None), &state, peer());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, SAMPLE);
    }

    #[tokio::test]
    async fn test_conversions_responses_are_identical() {
        let state = test_state(Some(SAMPLE));
        let mut bodies = Vec::new();
        for _ in 0..3 {
            let response = handle_request(&get("/api/v1/conversions", None), &state, peer());
            bodies.push(body_string(response).await);
        }
        assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[tokio::test]
    async fn test_conversions_without_dataset() {
        let state = test_state(None);
        let response = handle_request(&get("/api/v1/conversions", None), &state, peer());
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_string(response).await,
            r#"{"error":"Conversion data not loaded"}"#
        );
    }

    #[tokio::test]
    async fn test_unknown_routes_return_404() {
        let state = test_state(Some(SAMPLE));
        let response = handle_request(&get("/api/v1/unknown", None), &state, peer());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/conversions")
            .body(())
            .unwrap();
        let response = handle_request(&req, &state, peer());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/health")
            .body(())
            .unwrap();
        let response = handle_request(&req, &state, peer());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_404_carries_cors_for_allowed_origin() {
        let state = test_state(Some(SAMPLE));
        let response = handle_request(&get("/missing", Some("http://localhost:5173")), &state, peer());
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_preflight_from_allowed_origin() {
        let state = test_state(Some(SAMPLE));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/conversions")
            .header(ORIGIN, "http://localhost:5173")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(())
            .unwrap();
        let response = handle_request(&req, &state, peer());

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_HEADERS],
            "Origin, Content-Type, Accept, Authorization"
        );
        assert!(body_string(response).await.is_empty());
    }

    #[test]
    fn test_preflight_from_disallowed_origin() {
        let state = test_state(Some(SAMPLE));
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/conversions")
            .header(ORIGIN, "https://evil.example")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(())
            .unwrap();
        let response = handle_request(&req, &state, peer());
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));
        assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_METHODS));
    }

    #[test]
    fn test_access_log_uses_transport_peer() {
        let state = test_state(Some(SAMPLE));
        let req = Request::builder()
            .method(Method::GET)
            .uri("/api/v1/health?probe=1")
            .header("X-Forwarded-For", "198.51.100.1")
            .header("X-Real-IP", "198.51.100.2")
            .header(USER_AGENT, "kube-probe/1.29")
            .body(())
            .unwrap();
        let response = handle_request(&req, &state, peer());
        let entry = build_access_log_entry(&req, &response, peer(), Instant::now());

        assert_eq!(entry.remote_addr.to_string(), "203.0.113.7");
        assert_eq!(entry.path, "/api/v1/health");
        assert_eq!(entry.query.as_deref(), Some("probe=1"));
        assert_eq!(entry.status, 200);
        assert_eq!(entry.body_bytes, HEALTH_BODY.len() as u64);
        assert_eq!(entry.user_agent.as_deref(), Some("kube-probe/1.29"));
        assert_eq!(entry.referer, None);
    }
}
