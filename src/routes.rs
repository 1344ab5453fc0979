//! HTTP router.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{AppState, handlers};

/// Build the application router.
///
/// # Routes
///
/// - `POST /payment`, `GET /payment`, `GET /payment/{id}`
/// - `POST /contact`, `GET /contact`, `GET /contact/{id}`
/// - `GET /health`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/payment",
            post(handlers::payments::create_payment).get(handlers::payments::list_payments),
        )
        .route("/payment/{id}", get(handlers::payments::get_payment))
        .route(
            "/contact",
            post(handlers::contacts::create_contact).get(handlers::contacts::list_contacts),
        )
        .route("/contact/{id}", get(handlers::contacts::get_contact))
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
