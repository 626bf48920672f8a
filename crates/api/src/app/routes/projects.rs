use std::sync::Arc;

use axum::{
    Extension,
    extract::Path,
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use obraledger_core::ProjectId;
use obraledger_ledger::UpdateBudget;

use crate::app::routes::{common::respond, reports};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(project_detail).delete(delete_project))
        .route("/:id/budget", patch(update_budget))
        .route("/:id/report", get(reports::project_report))
}

pub async fn project_detail(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let project_id: ProjectId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.project_detail(caller.principal(), project_id, Utc::now()).await;
    respond(StatusCode::OK, result, dto::project_detail_to_json)
}

pub async fn update_budget(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateBudgetRequest>,
) -> axum::response::Response {
    let project_id: ProjectId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = UpdateBudget {
        project_id,
        budget: body.budget,
    };
    let result = services.update_budget(caller.principal(), cmd).await;
    respond(StatusCode::OK, result, dto::project_to_json)
}

pub async fn delete_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let project_id: ProjectId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.delete_project(caller.principal(), project_id).await;
    respond(StatusCode::OK, result, |receipt| json!(receipt))
}
