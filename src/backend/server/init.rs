/**
 * Server Initialization
 *
 * 1. Load collaborators (store, mailer) from the config
 * 2. Build `AppState`
 * 3. Start the periodic cleanup of dead live connections
 * 4. Create the router
 */

use std::time::Duration;

use axum::Router;

use super::config::{load_mailer, load_store};
use super::state::AppState;
use crate::backend::error::BackendResult;
use crate::backend::routes::router::create_router;
use crate::shared::AppConfig;

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Create and configure the Axum application
pub async fn create_app(config: AppConfig) -> BackendResult<Router> {
    tracing::info!("Initializing Teamspace backend server");

    let store = load_store(&config).await;
    let mailer = load_mailer(&config)?;
    let state = AppState::new(config, store, mailer);

    spawn_connection_cleanup(&state);

    let app = create_router(state);
    tracing::info!("Router configured with periodic cleanup task");
    Ok(app)
}

/// Connections normally unregister when their stream drops; this catches any
/// whose receiver went away without that happening.
fn spawn_connection_cleanup(state: &AppState) {
    let directory = state.directory.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            let pruned = directory.prune_closed();
            if pruned > 0 {
                tracing::debug!("[Directory] Pruned {} closed connections", pruned);
            }
        }
    });
}
