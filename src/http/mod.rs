//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! handlers: JSON response builders and the cross-origin policy.

pub mod cors;
pub mod response;

// Re-export commonly used types
pub use cors::CorsPolicy;
pub use response::{build_404_response, build_json_bytes_response, build_json_response};
