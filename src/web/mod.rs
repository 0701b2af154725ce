//! HTTP surface: router, shared state and middleware.

pub mod handlers;
pub mod views;

use crate::domain::ports::RiskPredictor;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<dyn RiskPredictor>,
}

impl AppState {
    pub fn new(predictor: Arc<dyn RiskPredictor>) -> Self {
        Self { predictor }
    }
}

/// Build the full router with tracing and timeout layers.
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %req.method(),
                        uri = %req.uri(),
                    )
                })
                .on_response(tower_http::trace::DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ));

    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::predict_form))
        .route("/api/predict", post(handlers::predict_json))
        .route("/api/fields", get(handlers::fields))
        .route("/health", get(|| async { "OK" }))
        .route("/health/ready", get(handlers::readiness))
        .layer(middleware)
        .with_state(state)
}
