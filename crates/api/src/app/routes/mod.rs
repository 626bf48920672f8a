use axum::{routing::get, Router};

pub mod admin;
pub mod common;
pub mod companies;
pub mod projects;
pub mod reports;
pub mod system;
pub mod transactions;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/me", get(system::me))
        .nest("/companies", companies::router())
        .nest("/projects", projects::router())
        .nest("/transactions", transactions::router())
        .nest("/admin", admin::router())
}
