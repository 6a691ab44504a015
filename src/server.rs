use axum::{
    middleware as axum_mw,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers::{self, AppError};
use crate::metrics::stream;
use crate::middleware::http_metrics;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Auth ────────────────────────────────────────────────
        .route(
            "/api/auth",
            post(handlers::auth::register)
                .put(handlers::auth::login)
                .delete(handlers::auth::logout),
        )
        // ── Franchises & stores ─────────────────────────────────
        .route(
            "/api/franchise",
            get(handlers::franchise::list_franchises)
                .post(handlers::franchise::create_franchise),
        )
        .route(
            "/api/franchise/:id",
            get(handlers::franchise::user_franchises)
                .delete(handlers::franchise::delete_franchise),
        )
        .route(
            "/api/franchise/:id/store",
            post(handlers::franchise::create_store),
        )
        .route(
            "/api/franchise/:id/store/:store_id",
            delete(handlers::franchise::delete_store),
        )
        // ── Menu & orders ───────────────────────────────────────
        .route(
            "/api/order/menu",
            get(handlers::order::get_menu).put(handlers::order::add_menu_item),
        )
        .route(
            "/api/order",
            get(handlers::order::get_orders).post(handlers::order::create_order),
        )
        // ── Local metrics view ──────────────────────────────────
        .route("/api/metrics", get(stream::get_metrics))
        .route("/api/metrics/stream", get(stream::metrics_stream))
        .fallback(unknown_endpoint)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            http_metrics::http_metrics_middleware,
        ))
        .layer(CorsLayer::permissive())
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
}

async fn unknown_endpoint() -> AppError {
    AppError::NotFound("unknown endpoint".into())
}
