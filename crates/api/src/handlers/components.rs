use axum::{
    extract::{Query, State},
    Json,
};
use blocks::schema::{build_components, ComponentSchema};
use serde::Deserialize;

use super::AppState;
use crate::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ComponentsQuery {
    pub module: Option<String>,
}

/// Editor palette for one registry.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ComponentsQuery>,
) -> Result<Json<Vec<ComponentSchema>>, ApiError> {
    let module = query.module.as_deref().unwrap_or(&state.config.default_module);
    let registry = state.catalog.resolve(module)?;
    Ok(Json(build_components(&registry)))
}
