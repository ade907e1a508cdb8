//! Run history operations.

use chrono::Utc;
use uuid::Uuid;

use crate::memory::MAX_RUN_HISTORY;
use crate::{
    models::{RunRow, RunStatus},
    FlowStore, StoreError,
};

/// Record a run of `flow_id` in `running` status.
pub async fn create_run(
    store: &FlowStore,
    run_id: Uuid,
    flow_id: u64,
    command: Option<&str>,
) -> Result<RunRow, StoreError> {
    let row = RunRow {
        id: run_id,
        flow_id,
        command: command.map(str::to_owned),
        status: RunStatus::Running,
        started_at: Utc::now(),
        finished_at: None,
        error: None,
    };

    let mut tables = store.write().await;
    tables.runs.push_back(row.clone());
    while tables.runs.len() > MAX_RUN_HISTORY {
        tables.runs.pop_front();
    }

    Ok(row)
}

/// Set the final status (and error message, if any) of a run.
pub async fn finish_run(
    store: &FlowStore,
    run_id: Uuid,
    status: RunStatus,
    error: Option<String>,
) -> Result<RunRow, StoreError> {
    let mut tables = store.write().await;
    let row = tables
        .runs
        .iter_mut()
        .find(|r| r.id == run_id)
        .ok_or(StoreError::NotFound)?;

    row.status = status;
    row.error = error;
    row.finished_at = Some(Utc::now());
    Ok(row.clone())
}

pub async fn get_run(store: &FlowStore, run_id: Uuid) -> Result<RunRow, StoreError> {
    store
        .read()
        .await
        .runs
        .iter()
        .find(|r| r.id == run_id)
        .cloned()
        .ok_or(StoreError::NotFound)
}

/// Runs of one flow, newest first.
pub async fn list_runs_for_flow(store: &FlowStore, flow_id: u64) -> Result<Vec<RunRow>, StoreError> {
    Ok(store
        .read()
        .await
        .runs
        .iter()
        .rev()
        .filter(|r| r.flow_id == flow_id)
        .cloned()
        .collect())
}
