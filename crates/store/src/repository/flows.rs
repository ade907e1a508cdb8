//! Flow CRUD operations.

use chrono::Utc;
use engine::trigger::{find_command, CommandEntry};
use engine::Graph;
use tracing::debug;

use crate::{models::FlowRow, FlowStore, StoreError};

/// Save a new flow. Ids are assigned in increasing order starting at 1.
pub async fn create_flow(store: &FlowStore, name: &str, graph: Graph) -> Result<FlowRow, StoreError> {
    let mut tables = store.write().await;
    tables.last_flow_id += 1;
    let now = Utc::now();

    let row = FlowRow {
        id: tables.last_flow_id,
        name: name.to_owned(),
        version: 1,
        graph,
        created_at: now,
        updated_at: now,
    };
    tables.flows.insert(row.id, row.clone());
    debug!(flow_id = row.id, flow_name = name, "flow created");

    Ok(row)
}

/// Fetch a single flow by id.
pub async fn get_flow(store: &FlowStore, id: u64) -> Result<FlowRow, StoreError> {
    store
        .read()
        .await
        .flows
        .get(&id)
        .cloned()
        .ok_or(StoreError::NotFound)
}

/// Return all flows ordered by id (oldest first).
pub async fn list_flows(store: &FlowStore) -> Result<Vec<FlowRow>, StoreError> {
    Ok(store.read().await.flows.values().cloned().collect())
}

/// Replace a flow's graph, and its name when given, bumping its version.
pub async fn update_flow(
    store: &FlowStore,
    id: u64,
    name: Option<&str>,
    graph: Graph,
) -> Result<FlowRow, StoreError> {
    let mut tables = store.write().await;
    let row = tables.flows.get_mut(&id).ok_or(StoreError::NotFound)?;

    if let Some(name) = name {
        row.name = name.to_owned();
    }
    row.graph = graph;
    row.version += 1;
    row.updated_at = Utc::now();
    debug!(flow_id = id, version = row.version, "flow updated");

    Ok(row.clone())
}

/// Permanently delete a flow.
///
/// Returns `StoreError::NotFound` if no flow was deleted.
pub async fn delete_flow(store: &FlowStore, id: u64) -> Result<(), StoreError> {
    store
        .write()
        .await
        .flows
        .remove(&id)
        .map(|_| ())
        .ok_or(StoreError::NotFound)
}

/// The first flow (by id) whose graph declares chat command `command`.
pub async fn find_by_command(store: &FlowStore, command: &str) -> Result<(FlowRow, CommandEntry), StoreError> {
    store
        .read()
        .await
        .flows
        .values()
        .find_map(|row| find_command(&row.graph, command).map(|entry| (row.clone(), entry)))
        .ok_or(StoreError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::trigger::COMMAND_ENTRY_CODE_ID;
    use engine::NodeDefinition;

    fn command_graph(command: &str) -> Graph {
        let mut entry = NodeDefinition::new("slash-1", COMMAND_ENTRY_CODE_ID);
        entry.command = Some(command.into());
        Graph::new(vec![entry], vec![])
    }

    #[tokio::test]
    async fn crud_round_trip() {
        let store = FlowStore::new();
        let created = create_flow(&store, "dice", Graph::default()).await.unwrap();
        assert_eq!((created.id, created.version), (1, 1));

        let updated = update_flow(&store, created.id, Some("dice v2"), command_graph("roll"))
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.name, "dice v2");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(get_flow(&store, created.id).await.unwrap(), updated);

        // graph-only update keeps the name
        let again = update_flow(&store, created.id, None, Graph::default()).await.unwrap();
        assert_eq!((again.name.as_str(), again.version), ("dice v2", 3));

        delete_flow(&store, created.id).await.unwrap();
        assert!(matches!(get_flow(&store, created.id).await, Err(StoreError::NotFound)));
        assert!(matches!(delete_flow(&store, created.id).await, Err(StoreError::NotFound)));
        assert!(matches!(
            update_flow(&store, 99, None, Graph::default()).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn commands_are_found_across_flows() {
        let store = FlowStore::new();
        create_flow(&store, "plain", Graph::default()).await.unwrap();
        let roll = create_flow(&store, "roll", command_graph("roll")).await.unwrap();

        let (row, entry) = find_by_command(&store, "roll").await.unwrap();
        assert_eq!(row.id, roll.id);
        assert_eq!(entry.node_id, "slash-1");
        assert!(matches!(find_by_command(&store, "ping").await, Err(StoreError::NotFound)));
    }
}
