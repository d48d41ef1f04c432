//! Liveness endpoint

use crate::http;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    message: &'static str,
}

/// `GET /api/v1/health`
///
/// Reports that the process is up. It does not look at the dataset: a process
/// whose dataset failed to load never gets as far as serving.
pub fn get_health() -> Response<Full<Bytes>> {
    http::build_json_response(
        StatusCode::OK,
        &HealthBody {
            status: "healthy",
            message: "Points Converter API is running",
        },
    )
}
