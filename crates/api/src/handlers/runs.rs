use axum::{
    extract::{Path, State},
    Json,
};
use blocks::builtin::REPLIES_KEY;
use engine::{AmbientContext, Graph, GraphRunner, RunOutcome, RunnerConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use store::models::{FlowRow, RunRow, RunStatus};
use store::repository::{flows as flow_repo, runs as run_repo};
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use crate::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct RunFlowDto {
    /// Exposed to blocks as the ambient value `event`.
    #[serde(default)]
    pub event: Value,
    /// `"<nodeId>.<port>"` bindings that replace the stored ones.
    #[serde(default)]
    pub constants: Map<String, Value>,
    pub module: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub flow_id: u64,
    pub flow_version: u32,
    #[serde(flatten)]
    pub outcome: RunOutcome,
    /// Replies recorded by `reply` blocks during this run.
    pub replies: Vec<Value>,
}

pub async fn run(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Json(payload): Json<RunFlowDto>,
) -> Result<Json<RunResponse>, ApiError> {
    let flow = flow_repo::get_flow(&state.store, id).await?;

    let mut graph = flow.graph.clone();
    graph.constants.extend(payload.constants);

    let mut ambient = AmbientContext::new();
    if !payload.event.is_null() {
        ambient.insert("event", payload.event);
    }

    let response = execute_flow(&state, &flow, graph, ambient, payload.module.as_deref(), None).await?;
    Ok(Json(response))
}

pub async fn list(Path(id): Path<u64>, State(state): State<AppState>) -> Result<Json<Vec<RunRow>>, ApiError> {
    flow_repo::get_flow(&state.store, id).await?;
    Ok(Json(run_repo::list_runs_for_flow(&state.store, id).await?))
}

/// Run `graph` (already seeded) on behalf of `flow`, under the server deadline,
/// recording the run in the store.
pub(crate) async fn execute_flow(
    state: &AppState,
    flow: &FlowRow,
    graph: Graph,
    ambient: AmbientContext,
    module: Option<&str>,
    command: Option<&str>,
) -> Result<RunResponse, ApiError> {
    let module = module.unwrap_or(&state.config.default_module);
    let registry = state.catalog.resolve(module)?;
    let runner = GraphRunner::new(
        registry,
        state.variables.clone(),
        RunnerConfig {
            strict: state.config.strict,
            ..RunnerConfig::default()
        },
    );

    let run_id = Uuid::new_v4();
    run_repo::create_run(&state.store, run_id, flow.id, command).await?;
    info!(%run_id, flow_id = flow.id, module, "run started");

    let deadline = state.config.run_timeout;
    let result = tokio::time::timeout(deadline, runner.run_with_id(&graph, &ambient, run_id)).await;
    let run_key = run_id.to_string();
    let replies = state.variables.drain_matching(REPLIES_KEY, |reply| {
        reply.get("run_id").and_then(Value::as_str) == Some(run_key.as_str())
    });

    match result {
        Ok(Ok(outcome)) => {
            // The outcome is returned even if its history row is gone.
            if let Err(err) = run_repo::finish_run(&state.store, run_id, RunStatus::Succeeded, None).await {
                warn!(%run_id, error = %err, "could not record finished run");
            }
            Ok(RunResponse {
                flow_id: flow.id,
                flow_version: flow.version,
                outcome,
                replies,
            })
        }
        Ok(Err(err)) => {
            warn!(%run_id, error = %err, "run failed");
            run_repo::finish_run(&state.store, run_id, RunStatus::Failed, Some(err.to_string())).await?;
            Err(err.into())
        }
        Err(_) => {
            warn!(%run_id, ?deadline, "run timed out");
            let err = ApiError::Timeout(deadline);
            run_repo::finish_run(&state.store, run_id, RunStatus::TimedOut, Some(err.to_string())).await?;
            Err(err)
        }
    }
}
