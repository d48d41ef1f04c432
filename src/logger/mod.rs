//! Logger module
//!
//! Provides logging utilities for the API server including:
//! - Startup and shutdown logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use crate::dataset::Dataset;
use chrono::Local;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn timestamped(tag: &str, message: &str) -> String {
    format!("{} [{tag}] {message}", Local::now().format("%Y/%m/%d %H:%M:%S"))
}

/// Write to info/access log
fn write_info(message: &str) {
    let line = timestamped("INFO", message);
    match writer::get() {
        Some(w) => w.write_info(&line),
        None => println!("{line}"),
    }
}

/// Write to error log
fn write_error(tag: &str, message: &str) {
    let line = timestamped(tag, message);
    match writer::get() {
        Some(w) => w.write_error(&line),
        None => eprintln!("{line}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_error(message: &str) {
    write_error("ERROR", message);
}

pub fn log_warning(message: &str) {
    write_error("WARN", message);
}

pub fn log_dataset_loaded(dataset: &Dataset) {
    write_info(&format!(
        "Loaded conversion data: {} programs, {} conversions",
        dataset.program_count(),
        dataset.conversion_count()
    ));
    write_info(&format!(
        "Data source: {} (last updated: {})",
        dataset.source().display(),
        dataset.last_updated().unwrap_or("unknown")
    ));
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info(&format!("Starting API server on port {}", addr.port()));
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("  - GET  http://{addr}/api/v1/conversions"));
    write_info(&format!("  - GET  http://{addr}/api/v1/health"));
    write_info(&format!(
        "CORS allowed origins: {}",
        config.cors.allowed_origins.join(", ")
    ));
    match config.server.workers {
        Some(workers) => write_info(&format!("Worker threads: {workers}")),
        None => write_info("Worker threads: one per CPU core"),
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
}

pub fn log_connection_error(err: &hyper::Error) {
    write_error("ERROR", &format!("Failed to serve connection: {err}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_shutdown_requested(signal: &str) {
    write_info(&format!("{signal} received, shutting down"));
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        write_info("Server stopped");
    } else {
        write_error(
            "WARN",
            &format!("Server stopped with {remaining} connection(s) still open"),
        );
    }
}
