//! Administration panel: every project across companies, and access grants.

use std::sync::Arc;

use axum::{
    Extension,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use obraledger_auth::GrantAccess;
use obraledger_core::{CompanyId, GrantId};

use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/grants", get(list_grants).post(grant_access))
        .route("/grants/:id", delete(revoke_access))
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
) -> axum::response::Response {
    let result = services.all_projects(caller.principal()).await;
    respond(StatusCode::OK, result, |items| {
        json!({ "items": items.iter().map(dto::project_listing_to_json).collect::<Vec<_>>() })
    })
}

pub async fn list_grants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
) -> axum::response::Response {
    let result = services.grants(caller.principal()).await;
    respond(StatusCode::OK, result, |items| {
        json!({ "items": items.iter().map(dto::grant_listing_to_json).collect::<Vec<_>>() })
    })
}

/// 201 when the grant is new, 200 when it already existed.
pub async fn grant_access(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Json(body): Json<dto::GrantAccessRequest>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&body.company_id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = GrantAccess {
        email: body.email,
        company_id,
    };

    match services.grant_access(caller.principal(), cmd, Utc::now()).await {
        Ok(outcome) => {
            let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
            (status, Json(dto::grant_to_json(&outcome.grant))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn revoke_access(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let grant_id: GrantId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.revoke_access(caller.principal(), grant_id).await;
    respond(StatusCode::OK, result, |receipt| json!(receipt))
}
