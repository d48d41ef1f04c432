// Server loop module
// Accepts connections until shutdown, then drains in-flight connections

use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How often the drain phase re-checks the connection counter
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept connections on `listener` until `shutdown` resolves.
///
/// After `shutdown` the listener is closed, open connections are told to
/// finish their current response, and the loop waits up to
/// `performance.shutdown_grace_period` seconds for them before returning.
pub async fn run_server_loop<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future<Output = ()>,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, shutdown_rx.clone());
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => break,
        }
    }

    // Stop accepting before waiting on the stragglers
    drop(listener);
    let _ = shutdown_tx.send(true);

    let grace = Duration::from_secs(state.config.performance.shutdown_grace_period);
    let remaining = drain_connections(&state, grace).await;
    logger::log_shutdown_complete(remaining);
}

/// Wait until no connection is active or `grace` has elapsed.
/// Returns the number of connections still open.
async fn drain_connections(state: &AppState, grace: Duration) -> usize {
    let deadline = Instant::now() + grace;
    loop {
        let active = state.active_connections.load(Ordering::SeqCst);
        if active == 0 || Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
