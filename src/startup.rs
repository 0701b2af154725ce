//! Server startup and wiring.

use crate::config::cli::LocalStorage;
use crate::core::artifact::RiskPipeline;
use crate::core::inference::InferenceInvoker;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::validate_socket_address;
use crate::web::{build_router, AppState};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Load the pipeline once; the result is shared read-only by every request.
pub async fn load_invoker<C: ConfigProvider>(config: &C) -> Result<InferenceInvoker> {
    let storage = LocalStorage::default();
    let pipeline = RiskPipeline::load(&storage, config.model_path()).await?;
    Ok(InferenceInvoker::new(Arc::new(pipeline)))
}

/// Build the router and resolve the listen address.
pub async fn build_app<C: ConfigProvider>(config: &C) -> Result<(Router, SocketAddr)> {
    let addr = validate_socket_address("bind_address", config.bind_address())?;
    let invoker = load_invoker(config).await?;

    let state = AppState::new(Arc::new(invoker));
    let router = build_router(state, Duration::from_secs(config.request_timeout_secs()));
    Ok((router, addr))
}
