//! Printable reports: JSON document by default, plain text with `?format=text`.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use obraledger_core::{CompanyId, ProjectId};
use obraledger_reports::{ReportDocument, render_text};

use crate::app::dto::ReportQuery;
use crate::app::errors;
use crate::app::services::{AppServices, ServiceResult};
use crate::context::PrincipalContext;

fn render(result: ServiceResult<ReportDocument>, query: &ReportQuery) -> axum::response::Response {
    let doc = match result {
        Ok(doc) => doc,
        Err(e) => return errors::service_error_to_response(e),
    };

    if query.wants_text() {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            render_text(&doc),
        )
            .into_response()
    } else {
        (StatusCode::OK, Json(doc)).into_response()
    }
}

pub async fn company_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> axum::response::Response {
    let company_id: CompanyId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.company_report(caller.principal(), company_id, Utc::now()).await;
    render(result, &query)
}

pub async fn project_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> axum::response::Response {
    let project_id: ProjectId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.project_report(caller.principal(), project_id, Utc::now()).await;
    render(result, &query)
}
