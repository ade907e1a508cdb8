//! In-memory backing store with JSON file snapshots.

use std::collections::{BTreeMap, VecDeque};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use crate::models::{FlowRow, RunRow};
use crate::StoreError;

/// Oldest runs are dropped once the history grows past this.
pub const MAX_RUN_HISTORY: usize = 500;

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) flows: BTreeMap<u64, FlowRow>,
    pub(crate) runs: VecDeque<RunRow>,
    pub(crate) last_flow_id: u64,
}

/// On-disk shape of a snapshot. Runs are not persisted.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    flows: Vec<FlowRow>,
}

/// Shared handle to the store. Clones point at the same tables.
#[derive(Debug, Clone, Default)]
pub struct FlowStore {
    tables: Arc<RwLock<Tables>>,
}

impl FlowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load flows from `path`; a missing file yields an empty store.
    pub async fn load_file(path: &Path) -> Result<Self, StoreError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "flows file not found, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
        let mut tables = Tables::default();
        for flow in snapshot.flows {
            tables.last_flow_id = tables.last_flow_id.max(flow.id);
            tables.flows.insert(flow.id, flow);
        }
        info!(path = %path.display(), flows = tables.flows.len(), "loaded flows");

        Ok(Self {
            tables: Arc::new(RwLock::new(tables)),
        })
    }

    /// Write every flow to `path` as pretty-printed JSON.
    pub async fn save_file(&self, path: &Path) -> Result<(), StoreError> {
        let snapshot = {
            let tables = self.read().await;
            Snapshot {
                flows: tables.flows.values().cloned().collect(),
            }
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        tokio::fs::write(path, bytes).await?;
        info!(path = %path.display(), flows = snapshot.flows.len(), "saved flows");
        Ok(())
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().await
    }
}
