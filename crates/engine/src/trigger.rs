//! Chat-command entry points.
//!
//! A node with `code_id == "__slash__"` is a placeholder that stands for an
//! externally registered chat command. When the command fires, its option
//! values and the triggering event are seeded as constants on that node, so
//! downstream blocks read them through ordinary edges, and the event is
//! also handed to every block as ambient context.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::ambient::AmbientContext;
use crate::error::value_kind;
use crate::models::{CommandOption, Graph};
use crate::EngineError;

/// `code_id` of command entry nodes.
pub const COMMAND_ENTRY_CODE_ID: &str = "__slash__";

/// Ports the triggering event is seeded on.
pub const EVENT_PORTS: [&str; 2] = ["ctx", "interaction"];

/// Ambient names the triggering event is exposed under.
pub const EVENT_AMBIENT_NAMES: [&str; 2] = ["event", "interaction"];

/// A command declared by an entry node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandEntry {
    pub node_id: String,
    pub command: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

/// Every command entry declared in `graph`, in declaration order.
pub fn command_entries(graph: &Graph) -> Vec<CommandEntry> {
    graph
        .nodes
        .iter()
        .filter(|n| n.code_id == COMMAND_ENTRY_CODE_ID)
        .filter_map(|n| {
            let command = n.command.clone()?;
            Some(CommandEntry {
                node_id: n.id.clone(),
                description: n
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Auto-generated /{command}")),
                command,
                options: n.options.clone(),
            })
        })
        .collect()
}

pub fn find_command(graph: &Graph, name: &str) -> Option<CommandEntry> {
    command_entries(graph).into_iter().find(|c| c.command == name)
}

/// Prepare a run for a fired command.
///
/// Returns a copy of `graph` with the option values and the event bound as
/// constants on the entry node, plus the ambient context for the run.
/// Trigger constants replace stored constants on the same key. Only declared
/// options are seeded; each must be present and match its declared type.
pub fn seed_command(
    graph: &Graph,
    entry: &CommandEntry,
    options: &Map<String, Value>,
    event: &Value,
) -> Result<(Graph, AmbientContext), EngineError> {
    let mut seeded = graph.clone();

    for option in &entry.options {
        let value = options
            .get(&option.name)
            .ok_or_else(|| EngineError::MissingCommandOption {
                command: entry.command.clone(),
                option: option.name.clone(),
            })?;
        check_option_type(entry, option, value)?;
        seeded
            .constants
            .insert(format!("{}.{}", entry.node_id, option.name), value.clone());
    }

    for port in EVENT_PORTS {
        seeded
            .constants
            .insert(format!("{}.{port}", entry.node_id), event.clone());
    }

    let ambient = EVENT_AMBIENT_NAMES
        .iter()
        .map(|name| (*name, event.clone()))
        .collect();

    debug!(command = %entry.command, node_id = %entry.node_id, "seeded command constants");
    Ok((seeded, ambient))
}

fn check_option_type(entry: &CommandEntry, option: &CommandOption, value: &Value) -> Result<(), EngineError> {
    let ok = match option.option_type.as_str() {
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "string" => value.is_string(),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(EngineError::InvalidCommandOption {
            command: entry.command.clone(),
            option: option.name.clone(),
            expected: option.option_type.clone(),
            actual: value_kind(value),
        })
    }
}
