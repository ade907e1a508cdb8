use axum::{extract::State, Json};
use serde_json::{json, Value};
use store::repository::flows as flow_repo;

use super::AppState;
use crate::ApiError;

pub async fn check(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let flows = flow_repo::list_flows(&state.store).await?.len();
    let modules: Vec<&str> = state.catalog.names().collect();
    Ok(Json(json!({ "status": "ok", "flows": flows, "modules": modules })))
}
