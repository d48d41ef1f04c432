use crate::dataset::DatasetError;
use std::net::SocketAddr;
use thiserror::Error;

/// Anything that stops the process before or while it starts serving
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("{0}")]
    InvalidAddress(String),

    #[error("Failed to open log files: {0}")]
    Logger(#[source] std::io::Error),

    #[error("Failed to load conversion data: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Failed to build async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to start server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
