//! Request handler module
//!
//! Responsible for request routing dispatch and the two API endpoints.

pub mod conversions;
pub mod health;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
