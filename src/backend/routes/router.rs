/**
 * Router Configuration
 *
 * Combines the live connection endpoint and the API routes into one router.
 *
 * # Route Order
 *
 * 1. `GET /realtime` and the API routes, all behind the auth middleware
 * 2. `GET /health`, public
 * 3. Fallback returning a JSON 404
 */

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::backend::error::BackendError;
use crate::backend::middleware::auth_middleware;
use crate::backend::realtime::handle_realtime_subscription;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/realtime", get(handle_realtime_subscription));

    let router = configure_api_routes(router)
        .route_layer(from_fn_with_state(app_state.clone(), auth_middleware));

    router
        .route("/health", get(|| async { "ok" }))
        .fallback(|| async { BackendError::not_found("Route not found") })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
