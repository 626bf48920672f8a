use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, routing::delete, Extension, Router};
use serde_json::json;

use obraledger_core::TransactionId;

use crate::app::errors;
use crate::app::routes::common::respond;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new().route("/:id", delete(delete_transaction))
}

pub async fn delete_transaction(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let transaction_id: TransactionId = match errors::parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = services.delete_transaction(caller.principal(), transaction_id).await;
    respond(StatusCode::OK, result, |receipt| json!(receipt))
}
