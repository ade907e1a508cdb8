//! Core graph models.
//!
//! These types mirror the JSON document the visual editor exports: nodes
//! with declared ports, edges between ports, and dotted-key constants.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::EngineError;

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// A named input or output slot on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    /// Editor type hint; informational only.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub port_type: Option<String>,
}

impl Port {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            port_type: None,
        }
    }
}

// ---------------------------------------------------------------------------
// CommandOption
// ---------------------------------------------------------------------------

/// A typed option of a chat-command entry node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOption {
    pub name: String,
    /// One of `string`, `integer`, `boolean`.
    #[serde(rename = "type", default = "default_option_type")]
    pub option_type: String,
}

fn default_option_type() -> String {
    "string".to_owned()
}

// ---------------------------------------------------------------------------
// NodeDefinition
// ---------------------------------------------------------------------------

/// One placement of a block (or a placeholder) in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Unique identifier within this graph (referenced by edges and constants).
    pub id: String,
    /// Registry identifier of the implementing block. Unknown ids make the
    /// node a placeholder.
    pub code_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,

    // Chat-command entry nodes only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
}

impl NodeDefinition {
    pub fn new(id: impl Into<String>, code_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code_id: code_id.into(),
            label: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            command: None,
            description: None,
            options: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_inputs(mut self, names: &[&str]) -> Self {
        self.inputs = names.iter().map(|n| Port::new(*n)).collect();
        self
    }

    pub fn with_outputs(mut self, names: &[&str]) -> Self {
        self.outputs = names.iter().map(|n| Port::new(*n)).collect();
        self
    }

    /// Label if present, otherwise the id. Used in error messages.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Directed value flow from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "sourceComponentId", alias = "sourceId")]
    pub source: String,
    #[serde(rename = "sourcePort")]
    pub source_port: String,
    #[serde(rename = "targetComponentId", alias = "targetId")]
    pub target: String,
    #[serde(rename = "targetPort")]
    pub target_port: String,
}

impl Edge {
    pub fn new(
        source: impl Into<String>,
        source_port: impl Into<String>,
        target: impl Into<String>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_port: source_port.into(),
            target: target.into(),
            target_port: target_port.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A complete graph document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// `"<nodeId>.<port>"` → value.
    #[serde(default)]
    pub constants: Map<String, Value>,
}

impl Graph {
    pub fn new(nodes: Vec<NodeDefinition>, edges: Vec<Edge>) -> Self {
        Self {
            nodes,
            edges,
            constants: Map::new(),
        }
    }

    /// Parse the serialized form of a graph.
    pub fn from_json(doc: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(doc)?)
    }

    /// Bind a constant to `node.port`, replacing any previous binding.
    pub fn with_constant(mut self, node: &str, port: &str, value: impl Into<Value>) -> Self {
        self.constants.insert(format!("{node}.{port}"), value.into());
        self
    }

    pub fn node(&self, id: &str) -> Option<&NodeDefinition> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
