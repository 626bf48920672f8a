use std::sync::Arc;

use axum::{
    Extension,
    extract::Path,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use obraledger_core::{CompanyId, ProjectId};
use obraledger_ledger::{CreateCompany, CreateProject, RecordTransaction, TransactionKind};

use crate::app::routes::{common::respond, reports};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_companies).post(create_company))
        .route("/:id", get(company_dashboard).delete(delete_company))
        .route("/:id/projects", post(create_project))
        .route("/:id/transactions", post(record_transaction))
        .route("/:id/report", get(reports::company_report))
}

pub async fn list_companies(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
) -> axum::response::Response {
    let result = services.visible_companies(caller.principal()).await;
    respond(StatusCode::OK, result, |items| {
        json!({ "items": items.iter().map(dto::company_to_json).collect::<Vec<_>>() })
    })
}

pub async fn create_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Json(body): Json<dto::CreateCompanyRequest>,
) -> axum::response::Response {
    let cmd = CreateCompany { name: body.name };
    let result = services.create_company(caller.principal(), cmd).await;
    respond(StatusCode::CREATED, result, dto::company_to_json)
}

pub async fn company_dashboard(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.company_dashboard(caller.principal(), company_id, Utc::now()).await;
    respond(StatusCode::OK, result, dto::dashboard_to_json)
}

pub async fn delete_company(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.delete_company(caller.principal(), company_id).await;
    respond(StatusCode::OK, result, |receipt| json!(receipt))
}

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CreateProjectRequest>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let cmd = CreateProject {
        company_id,
        name: body.name,
        client: body.client,
        budget: body.budget,
    };
    let result = services.create_project(caller.principal(), cmd).await;
    respond(StatusCode::CREATED, result, dto::project_to_json)
}

pub async fn record_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::RecordTransactionRequest>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let project_id = match body.project_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => match errors::parse_id::<ProjectId>(raw) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        },
        None => None,
    };
    let kind: TransactionKind = match body.kind.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let now = Utc::now();
    let cmd = RecordTransaction {
        company_id,
        project_id,
        kind,
        amount: body.amount,
        date: body.date.unwrap_or_else(|| now.date_naive()),
        description: body.description,
        notes: body.notes,
        evidence_url: body.evidence_url,
    };
    let result = services.record_transaction(caller.principal(), cmd, now).await;
    respond(StatusCode::CREATED, result, dto::transaction_to_json)
}
