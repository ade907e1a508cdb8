//! Engine-level error types.

use blocks::BlockError;
use thiserror::Error;

/// Errors produced by the graph engine (loading, validation and execution).
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Load errors ------

    /// The graph document could not be parsed.
    #[error("invalid graph document: {0}")]
    InvalidGraph(#[from] serde_json::Error),

    /// Two or more nodes share the same ID.
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    /// More than one edge feeds the same input port.
    #[error("input port '{port}' on node '{node_id}' has {count} incoming edges; at most one is allowed")]
    ConflictingInputEdges {
        node_id: String,
        port: String,
        count: usize,
    },

    // ------ Strict validation errors ------

    /// An edge references a node ID that doesn't exist in the graph.
    #[error("edge references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference {
        node_id: String,
        side: &'static str,
    },

    /// Topological sort could not reach every node.
    #[error("graph contains a cycle; never reachable: {}", .stranded.join(", "))]
    CycleDetected { stranded: Vec<String> },

    // ------ Execution errors ------

    /// An input port has no constant, no resolved edge and no default.
    #[error("input port '{port}' on node '{label}' (id={node_id}) is unconnected and has no default or constant value")]
    UnboundInput {
        node_id: String,
        label: String,
        port: String,
    },

    /// A node with several output ports got something other than a mapping.
    #[error("block '{code_id}' on node '{node_id}' declares {declared} outputs but returned {actual}; expected an object of port → value")]
    ResultShape {
        node_id: String,
        code_id: String,
        declared: usize,
        actual: &'static str,
    },

    /// A node with several output ports got a mapping lacking one of them.
    #[error("block '{code_id}' on node '{node_id}' did not return a value for output port '{port}'")]
    MissingOutput {
        node_id: String,
        code_id: String,
        port: String,
    },

    /// The block itself failed; the whole run is aborted.
    #[error("block '{code_id}' on node '{node_id}' failed: {source}")]
    BlockFailed {
        node_id: String,
        code_id: String,
        #[source]
        source: BlockError,
    },

    // ------ Invocation errors ------

    /// No block registry is known under this name.
    #[error("unknown block registry '{0}'")]
    UnknownRegistry(String),

    /// No command entry node with this name exists in the graph.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A declared command option was not supplied.
    #[error("command '{command}' requires option '{option}'")]
    MissingCommandOption { command: String, option: String },

    /// A command option value does not match its declared type.
    #[error("command '{command}' option '{option}' expects {expected}, got {actual}")]
    InvalidCommandOption {
        command: String,
        option: String,
        expected: String,
        actual: &'static str,
    },
}

/// Short name of a JSON value's kind, for error messages.
pub fn value_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
