//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the use-case layer every handler calls
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use obraledger_auth::Hs256JwtValidator;
use obraledger_infra::{AppConfig, LedgerStore, StoreError};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router, selecting the store from `config`.
pub async fn build_app(config: &AppConfig) -> Result<Router, StoreError> {
    let services = services::build_services(config).await?;
    Ok(router_for(config, Arc::new(services)))
}

/// Build the router over an explicit store (used by tests and embedders).
pub fn build_app_with(config: &AppConfig, store: Arc<dyn LedgerStore>) -> Router {
    router_for(config, Arc::new(services::AppServices::new(store, config)))
}

fn router_for(config: &AppConfig, services: Arc<services::AppServices>) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(config.jwt_secret.as_bytes()));
    let auth_state = middleware::AuthState {
        jwt,
        services: services.clone(),
    };

    // Protected routes: bearer token + resolved principal.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::trace_request)))
}
