//! Declared block signatures.
//!
//! A signature is built once, when the block is registered, and describes
//! everything the engine matches against at call time: parameter names,
//! their type tags and defaults, whether the block swallows arbitrary extra
//! named arguments, and the output ports it produces.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// ValueType
// ---------------------------------------------------------------------------

/// Coarse type tag attached to parameters and outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Number,
    String,
    Boolean,
    #[default]
    Any,
    /// No value. Rendered as `void` when used as a return type.
    Null,
}

impl ValueType {
    /// Name of the type as the visual editor understands it.
    pub fn editor_name(self, is_return: bool) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Any => "any",
            Self::Null if is_return => "void",
            Self::Null => "null",
        }
    }
}

// ---------------------------------------------------------------------------
// Param / OutputPort
// ---------------------------------------------------------------------------

/// One declared parameter of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value_type: ValueType,
    /// Value used when the port is neither constant nor connected.
    pub default: Option<Value>,
    pub description: String,
}

impl Param {
    /// A parameter that must be supplied by a constant or an edge.
    pub fn required(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            default: None,
            description: String::new(),
        }
    }

    /// A parameter that falls back to `default` when unbound.
    pub fn optional(name: impl Into<String>, value_type: ValueType, default: impl Into<Value>) -> Self {
        Self {
            default: Some(default.into()),
            ..Self::required(name, value_type)
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// One declared output port of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputPort {
    pub name: String,
    pub value_type: ValueType,
    pub description: String,
}

impl OutputPort {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            description: String::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// ---------------------------------------------------------------------------
// BlockSignature
// ---------------------------------------------------------------------------

/// Name of the single output port a plain value-returning block exposes.
pub const DEFAULT_OUTPUT: &str = "output";

/// Everything the engine and the editor need to know about a block without
/// calling it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSignature {
    /// Stable identifier referenced by graph nodes.
    pub code_id: String,
    /// Human readable name shown in the editor.
    pub label: String,
    pub doc: String,
    pub params: Vec<Param>,
    /// Block accepts any named argument, so every ambient value is passed in.
    pub accepts_extra: bool,
    pub outputs: Vec<OutputPort>,
}

impl BlockSignature {
    /// A signature with no parameters and no outputs, labelled by its id.
    pub fn new(code_id: impl Into<String>) -> Self {
        let code_id = code_id.into();
        Self {
            label: code_id.clone(),
            code_id,
            doc: String::new(),
            params: Vec::new(),
            accepts_extra: false,
            outputs: Vec::new(),
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn accepts_extra(mut self) -> Self {
        self.accepts_extra = true;
        self
    }

    /// Declare a single `output` port of the given type.
    pub fn returns(self, value_type: ValueType) -> Self {
        self.output(OutputPort::new(DEFAULT_OUTPUT, value_type))
    }

    pub fn output(mut self, port: OutputPort) -> Self {
        self.outputs.push(port);
        self
    }

    pub fn param_named(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Whether `name` is an explicitly declared parameter.
    pub fn declares(&self, name: &str) -> bool {
        self.param_named(name).is_some()
    }

    pub fn default_for(&self, name: &str) -> Option<&Value> {
        self.param_named(name).and_then(|p| p.default.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_are_looked_up_by_name() {
        let sig = BlockSignature::new("random_int")
            .param(Param::required("low", ValueType::Number))
            .param(Param::optional("high", ValueType::Number, 10));

        assert_eq!(sig.default_for("high"), Some(&json!(10)));
        assert_eq!(sig.default_for("low"), None);
        assert_eq!(sig.default_for("missing"), None);
        assert!(sig.declares("low"));
        assert!(!sig.declares("event"));
    }

    #[test]
    fn null_renders_as_void_only_in_return_position() {
        assert_eq!(ValueType::Null.editor_name(true), "void");
        assert_eq!(ValueType::Null.editor_name(false), "null");
        assert_eq!(ValueType::Number.editor_name(true), "number");
    }

    #[test]
    fn label_defaults_to_code_id() {
        let sig = BlockSignature::new("echo");
        assert_eq!(sig.label, "echo");
        assert!(sig.outputs.is_empty());
        assert_eq!(sig.returns(ValueType::Any).outputs[0].name, DEFAULT_OUTPUT);
    }
}
