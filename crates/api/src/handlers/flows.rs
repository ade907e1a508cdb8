use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use engine::{validate_graph, Graph, GraphIndex};
use serde::Deserialize;
use store::models::FlowRow;
use store::repository::flows as flow_repo;

use super::AppState;
use crate::ApiError;

#[derive(Deserialize)]
pub struct CreateFlowDto {
    pub name: String,
    pub graph: Graph,
}

#[derive(Deserialize)]
pub struct UpdateFlowDto {
    pub name: Option<String>,
    pub graph: Graph,
}

/// Reject graphs no run could load; in strict mode, anything `validate_graph` rejects.
fn check_graph(state: &AppState, graph: &Graph) -> Result<(), ApiError> {
    if state.config.strict {
        validate_graph(graph)?;
    } else {
        GraphIndex::build(graph)?;
    }
    Ok(())
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<FlowRow>>, ApiError> {
    Ok(Json(flow_repo::list_flows(&state.store).await?))
}

pub async fn get(Path(id): Path<u64>, State(state): State<AppState>) -> Result<Json<FlowRow>, ApiError> {
    Ok(Json(flow_repo::get_flow(&state.store, id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateFlowDto>,
) -> Result<(StatusCode, Json<FlowRow>), ApiError> {
    check_graph(&state, &payload.graph)?;
    let flow = flow_repo::create_flow(&state.store, &payload.name, payload.graph).await?;
    state.persist().await?;
    Ok((StatusCode::CREATED, Json(flow)))
}

pub async fn update(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateFlowDto>,
) -> Result<Json<FlowRow>, ApiError> {
    check_graph(&state, &payload.graph)?;
    let flow = flow_repo::update_flow(&state.store, id, payload.name.as_deref(), payload.graph).await?;
    state.persist().await?;
    Ok(Json(flow))
}

pub async fn delete(Path(id): Path<u64>, State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    flow_repo::delete_flow(&state.store, id).await?;
    state.persist().await?;
    Ok(StatusCode::NO_CONTENT)
}
