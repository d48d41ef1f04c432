//! Dataset endpoint

use crate::config::AppState;
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

/// `GET /api/v1/conversions`
///
/// Serves the body serialized at load time, so every response carries the
/// same bytes.
pub fn get_conversions(state: &AppState) -> Response<Full<Bytes>> {
    match &state.dataset {
        Some(dataset) => http::build_json_bytes_response(StatusCode::OK, dataset.body()),
        None => {
            logger::log_error("Conversion data requested but no dataset is loaded");
            http::build_json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &serde_json::json!({ "error": "Conversion data not loaded" }),
            )
        }
    }
}
