//! Component palette consumed by the visual editor.
//!
//! Built straight from registered signatures: the editor never sees a block
//! that the engine could not resolve.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{BlockRegistry, BlockSignature};

/// One input or output port as the editor renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub desc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Palette entry for a single block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSchema {
    pub code_id: String,
    pub label: String,
    /// First line of the block's documentation.
    pub doc: String,
    pub inputs: Vec<PortSchema>,
    pub outputs: Vec<PortSchema>,
}

pub fn component(signature: &BlockSignature) -> ComponentSchema {
    let inputs = signature
        .params
        .iter()
        .map(|p| PortSchema {
            name: p.name.clone(),
            type_name: p.value_type.editor_name(false).to_owned(),
            desc: p.description.clone(),
            default: p.default.clone(),
        })
        .collect();

    let outputs = signature
        .outputs
        .iter()
        .map(|o| PortSchema {
            name: o.name.clone(),
            type_name: o.value_type.editor_name(true).to_owned(),
            desc: o.description.clone(),
            default: None,
        })
        .collect();

    ComponentSchema {
        code_id: signature.code_id.clone(),
        label: signature.label.clone(),
        doc: signature.doc.lines().next().unwrap_or_default().to_owned(),
        inputs,
        outputs,
    }
}

/// Palette for every block in `registry`, ordered by `code_id`.
pub fn build_components(registry: &BlockRegistry) -> Vec<ComponentSchema> {
    registry.signatures().map(component).collect()
}
