use std::process::ExitCode;
use std::sync::Arc;

mod config;
mod dataset;
mod error;
mod handler;
mod http;
mod logger;
mod server;

use error::StartupError;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

/// Startup sequence. The dataset is loaded, and the process fails, before any
/// socket is bound.
fn run() -> Result<(), StartupError> {
    let cfg = config::Config::load()?;
    logger::init(&cfg).map_err(StartupError::Logger)?;

    let dataset = dataset::load(&cfg.dataset.paths)?;

    // Multi-threaded runtime; `server.workers` caps the thread count
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers.filter(|&w| w > 0) {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build().map_err(StartupError::Runtime)?;

    runtime.block_on(async_main(cfg, dataset))
}

async fn async_main(cfg: config::Config, dataset: dataset::Dataset) -> Result<(), StartupError> {
    let addr = cfg.get_socket_addr().map_err(StartupError::InvalidAddress)?;
    let listener =
        server::create_listener(addr).map_err(|source| StartupError::Bind { addr, source })?;

    let state = Arc::new(config::AppState::new(cfg, Some(dataset)));
    logger::log_server_start(&addr, &state.config);

    server::run_server_loop(listener, state, server::signal::wait_for_shutdown()).await;
    Ok(())
}
