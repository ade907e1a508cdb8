//! The `ExecutableBlock` trait: the contract every asynchronous block must fulfil.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::{BlockError, Variables};

/// Named arguments handed to a block: resolved input ports plus any ambient
/// values the invoker decided to pass.
pub type Arguments = serde_json::Map<String, Value>;

/// Per-invocation context passed to every block.
///
/// Defined here (in the blocks crate) so both the engine and individual block
/// implementations can import it without a circular dependency.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    /// ID of the current graph run.
    pub run_id: Uuid,
    /// Graph node this invocation belongs to.
    pub node_id: String,
    /// Store for blocks that read or write variables.
    pub variables: Variables,
}

impl InvocationContext {
    pub fn new(run_id: Uuid, node_id: impl Into<String>, variables: Variables) -> Self {
        Self {
            run_id,
            node_id: node_id.into(),
            variables,
        }
    }
}

/// A block whose invocation completes asynchronously.
///
/// The engine awaits the returned future before touching any other node.
#[async_trait]
pub trait ExecutableBlock: Send + Sync {
    /// Run the block with its fully resolved arguments.
    async fn invoke(&self, args: Arguments, ctx: &InvocationContext) -> Result<Value, BlockError>;
}

// ---------------------------------------------------------------------------
// Argument accessors
// ---------------------------------------------------------------------------

pub fn require<'a>(args: &'a Arguments, name: &str) -> Result<&'a Value, BlockError> {
    args.get(name)
        .ok_or_else(|| BlockError::MissingArgument(name.to_owned()))
}

pub fn require_i64(args: &Arguments, name: &str) -> Result<i64, BlockError> {
    let value = require(args, name)?;
    value
        .as_i64()
        .or_else(|| {
            value
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        })
        .ok_or_else(|| BlockError::invalid(name, format!("expected an integer, got {value}")))
}

pub fn require_f64(args: &Arguments, name: &str) -> Result<f64, BlockError> {
    let value = require(args, name)?;
    value
        .as_f64()
        .ok_or_else(|| BlockError::invalid(name, format!("expected a number, got {value}")))
}

pub fn require_str<'a>(args: &'a Arguments, name: &str) -> Result<&'a str, BlockError> {
    let value = require(args, name)?;
    value
        .as_str()
        .ok_or_else(|| BlockError::invalid(name, format!("expected a string, got {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn integer_accessor_accepts_whole_floats() {
        let a = args(json!({ "n": 4.0, "m": 4.5, "s": "x" }));
        assert_eq!(require_i64(&a, "n"), Ok(4));
        assert!(matches!(require_i64(&a, "m"), Err(BlockError::InvalidArgument { .. })));
        assert!(matches!(require_i64(&a, "s"), Err(BlockError::InvalidArgument { .. })));
        assert_eq!(require_i64(&a, "gone"), Err(BlockError::MissingArgument("gone".into())));
    }

    #[test]
    fn integer_accessor_rejects_out_of_range_floats() {
        let a = args(json!({ "big": 1e20, "small": -1e20, "edge": -9.223372036854775808e18 }));
        assert!(matches!(require_i64(&a, "big"), Err(BlockError::InvalidArgument { .. })));
        assert!(matches!(require_i64(&a, "small"), Err(BlockError::InvalidArgument { .. })));
        assert_eq!(require_i64(&a, "edge"), Ok(i64::MIN));
    }

    #[test]
    fn string_accessor_rejects_numbers() {
        let a = args(json!({ "text": "hi", "n": 1 }));
        assert_eq!(require_str(&a, "text"), Ok("hi"));
        assert!(require_str(&a, "n").is_err());
    }
}
