//! Request authentication → principal resolution.
//!
//! Runs once per request before any handler: the token's email becomes an
//! identity, and the identity is resolved against the current grants.

use axum::http::StatusCode;
use axum::response::Response;

use obraledger_auth::{JwtClaims, Principal};

use crate::app::errors;
use crate::app::services::AppServices;

/// Resolve the principal for validated `claims`.
///
/// A token without a usable email is unauthenticated (401); a failed grant
/// lookup is a backend failure (503), never an empty or widened scope.
pub async fn resolve_principal(services: &AppServices, claims: &JwtClaims) -> Result<Principal, Response> {
    let identity = claims
        .identity()
        .map_err(|e| errors::json_error(StatusCode::UNAUTHORIZED, "unauthenticated", e.to_string()))?;

    services.resolve_principal(identity).await.map_err(|e| {
        tracing::error!(error = %e, "principal resolution failed");
        errors::access_error_to_response(e)
    })
}
