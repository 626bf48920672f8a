use std::sync::Arc;

use axum::{http::StatusCode, Extension};

use crate::app::dto;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Who-am-I: email, role and visible companies.
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
) -> axum::response::Response {
    let result = services.me(caller.principal()).await;
    respond(StatusCode::OK, result, dto::me_to_json)
}
