// Application state module
// Everything request handlers read; built once before the listener is bound

use std::sync::atomic::AtomicUsize;

use super::types::Config;
use crate::dataset::Dataset;
use crate::http::CorsPolicy;

/// Application state
///
/// Shared behind an `Arc` by every connection task. Nothing in here is
/// mutated after construction except the connection counter.
pub struct AppState {
    pub config: Config,
    pub cors: CorsPolicy,
    /// `None` only when the process was started without data, which `main`
    /// never does; handlers still guard against it.
    pub dataset: Option<Dataset>,
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config, dataset: Option<Dataset>) -> Self {
        let cors = CorsPolicy::from_config(&config.cors);
        Self {
            config,
            cors,
            dataset,
            active_connections: AtomicUsize::new(0),
        }
    }
}
