// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub dataset: DatasetConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight connections after a shutdown signal
    pub shutdown_grace_period: u64,
}

/// Cross-origin policy applied to every request
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// Exact origins allowed to read responses
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,
    #[serde(default = "default_allowed_headers")]
    pub allowed_headers: Vec<String>,
    /// Preflight cache lifetime in seconds
    #[serde(default = "default_max_age")]
    pub max_age: u64,
}

fn default_allowed_origins() -> Vec<String> {
    to_strings(&[
        "https://points-converter.com",
        "http://localhost:5173",
        "http://localhost:4173",
    ])
}

fn default_allowed_methods() -> Vec<String> {
    to_strings(&["GET", "POST", "PUT", "DELETE", "OPTIONS"])
}

fn default_allowed_headers() -> Vec<String> {
    to_strings(&["Origin", "Content-Type", "Accept", "Authorization"])
}

const fn default_max_age() -> u64 {
    12 * 60 * 60
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allowed_methods: default_allowed_methods(),
            allowed_headers: default_allowed_headers(),
            max_age: default_max_age(),
        }
    }
}

/// Dataset location configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct DatasetConfig {
    /// Candidate paths probed in order; the first existing one wins.
    /// Container layout first, local development layout second.
    #[serde(default = "default_dataset_paths")]
    pub paths: Vec<String>,
}

fn default_dataset_paths() -> Vec<String> {
    to_strings(&["conversions.json", "../public/data/conversions.json"])
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            paths: default_dataset_paths(),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
