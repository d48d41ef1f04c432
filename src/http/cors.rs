//! Cross-origin resource sharing module
//!
//! Runs ahead of routing on every request:
//! - Preflights (`OPTIONS` with an `Origin`) are answered here with 204
//! - Other responses get `Access-Control-Allow-Origin` when the origin is allowed
//!
//! Disallowed origins receive no `Access-Control-*` headers at all; the
//! browser enforces the rejection.

use crate::config::CorsConfig;
use crate::http::response::build_204_response;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ORIGIN, VARY,
};
use hyper::{Method, Request, Response};

/// Compiled CORS policy; header values are prepared once at startup
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<String>,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            allowed_origins: config.allowed_origins.clone(),
            allow_methods: join_header_list("cors.allowed_methods", &config.allowed_methods),
            allow_headers: join_header_list("cors.allowed_headers", &config.allowed_headers),
            max_age: HeaderValue::from(config.max_age),
        }
    }

    /// The request's `Origin` header, if it is on the allow-list (exact match)
    pub fn allowed_origin<'a>(&self, headers: &'a HeaderMap) -> Option<&'a HeaderValue> {
        let origin = headers.get(ORIGIN)?;
        let value = origin.to_str().ok()?;
        self.allowed_origins
            .iter()
            .any(|allowed| allowed == value)
            .then_some(origin)
    }

    /// Answer a preflight request
    pub fn preflight_response(&self, headers: &HeaderMap) -> Response<Full<Bytes>> {
        let mut response = build_204_response();
        let out = response.headers_mut();
        out.insert(
            VARY,
            HeaderValue::from_static(
                "Origin, Access-Control-Request-Method, Access-Control-Request-Headers",
            ),
        );

        if let Some(origin) = self.allowed_origin(headers) {
            out.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
            out.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
            out.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
            out.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
        }
        response
    }

    /// Decorate a routed response for the request's origin
    pub fn apply<B>(&self, headers: &HeaderMap, response: &mut Response<B>) {
        if !headers.contains_key(ORIGIN) {
            return;
        }
        let out = response.headers_mut();
        out.append(VARY, HeaderValue::from_static("Origin"));
        if let Some(origin) = self.allowed_origin(headers) {
            out.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }
    }
}

/// A preflight is any `OPTIONS` request carrying an `Origin` header
pub fn is_preflight<B>(req: &Request<B>) -> bool {
    req.method() == Method::OPTIONS && req.headers().contains_key(ORIGIN)
}

/// Join list entries into one header value, skipping entries that are not
/// valid header text
fn join_header_list(key: &str, entries: &[String]) -> HeaderValue {
    let valid: Vec<&str> = entries
        .iter()
        .map(String::as_str)
        .filter(|entry| {
            let ok = HeaderValue::from_str(entry).is_ok();
            if !ok {
                logger::log_warning(&format!("Ignoring invalid {key} entry: {entry:?}"));
            }
            ok
        })
        .collect();
    HeaderValue::from_str(&valid.join(", ")).unwrap_or_else(|_| HeaderValue::from_static(""))
}
