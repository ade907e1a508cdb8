use axum::{
    extract::{Path, State},
    Json,
};
use engine::trigger::{command_entries, seed_command, CommandEntry};
use engine::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use store::repository::flows as flow_repo;
use store::StoreError;

use super::runs::{execute_flow, RunResponse};
use super::AppState;
use crate::ApiError;

#[derive(Debug, Serialize)]
pub struct CommandListing {
    pub flow_id: u64,
    pub flow_name: String,
    #[serde(flatten)]
    pub entry: CommandEntry,
}

#[derive(Debug, Default, Deserialize)]
pub struct FireCommandDto {
    #[serde(default)]
    pub options: Map<String, Value>,
    /// The triggering chat event.
    #[serde(default)]
    pub event: Value,
    pub module: Option<String>,
}

/// Every command declared by any saved flow.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CommandListing>>, ApiError> {
    let flows = flow_repo::list_flows(&state.store).await?;
    let listings = flows
        .into_iter()
        .flat_map(|flow| {
            command_entries(&flow.graph)
                .into_iter()
                .map(move |entry| CommandListing {
                    flow_id: flow.id,
                    flow_name: flow.name.clone(),
                    entry,
                })
                .collect::<Vec<_>>()
        })
        .collect();
    Ok(Json(listings))
}

/// Fire chat command `name`: seed its options and the event, then run its flow.
pub async fn fire(
    Path(name): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<FireCommandDto>,
) -> Result<Json<RunResponse>, ApiError> {
    let (flow, entry) = flow_repo::find_by_command(&state.store, &name)
        .await
        .map_err(|err| match err {
            StoreError::NotFound => ApiError::Engine(EngineError::UnknownCommand(name.clone())),
            other => other.into(),
        })?;

    let (graph, ambient) = seed_command(&flow.graph, &entry, &payload.options, &payload.event)?;
    let response = execute_flow(
        &state,
        &flow,
        graph,
        ambient,
        payload.module.as_deref(),
        Some(&entry.command),
    )
    .await?;
    Ok(Json(response))
}
