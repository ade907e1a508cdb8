//! Block invocation: ambient injection, the call itself, and result fan-out.

use blocks::{Arguments, BlockEntry, BlockError, BlockSignature, Callable, InvocationContext};
use serde_json::Value;

use crate::ambient::AmbientContext;
use crate::cache::ValueCache;
use crate::error::value_kind;
use crate::models::NodeDefinition;
use crate::EngineError;

/// Merge ambient values into resolved arguments.
///
/// A block that accepts extra named arguments receives every ambient value,
/// overriding resolved inputs of the same name. Any other block receives
/// only the ambient values matching one of its declared parameters that was
/// not already resolved.
pub fn inject_ambient(args: &mut Arguments, signature: &BlockSignature, ambient: &AmbientContext) {
    for (name, value) in ambient.iter() {
        if signature.accepts_extra {
            args.insert(name.to_owned(), value.clone());
        } else if signature.declares(name) && !args.contains_key(name) {
            args.insert(name.to_owned(), value.clone());
        }
    }
}

/// Supply the declared default of every parameter still missing.
///
/// A node need not list every parameter as an input port; whatever it leaves
/// out, and ambient context did not provide, falls back to the default.
pub fn fill_defaults(args: &mut Arguments, signature: &BlockSignature) {
    for param in &signature.params {
        if let Some(default) = &param.default {
            if !args.contains_key(&param.name) {
                args.insert(param.name.clone(), default.clone());
            }
        }
    }
}

/// Call the block, awaiting it if it is asynchronous.
pub async fn invoke(
    entry: &BlockEntry,
    args: Arguments,
    ctx: &InvocationContext,
) -> Result<Value, BlockError> {
    match &entry.callable {
        Callable::Sync(f) => f(args, ctx),
        Callable::Async(block) => block.invoke(args, ctx).await,
    }
}

/// Store a block result under the node's declared output ports.
///
/// - no outputs: the result is discarded;
/// - one output: the raw result is stored under it;
/// - several outputs: the result must be an object holding every port.
pub fn fan_out(
    node: &NodeDefinition,
    code_id: &str,
    result: Value,
    cache: &mut ValueCache,
) -> Result<(), EngineError> {
    match node.outputs.as_slice() {
        [] => Ok(()),
        [only] => {
            cache.set(&node.id, &only.name, result);
            Ok(())
        }
        ports => {
            let mut map = match result {
                Value::Object(map) => map,
                other => {
                    return Err(EngineError::ResultShape {
                        node_id: node.id.clone(),
                        code_id: code_id.to_owned(),
                        declared: ports.len(),
                        actual: value_kind(&other),
                    })
                }
            };
            for port in ports {
                let value = map.remove(&port.name).ok_or_else(|| EngineError::MissingOutput {
                    node_id: node.id.clone(),
                    code_id: code_id.to_owned(),
                    port: port.name.clone(),
                })?;
                cache.set(&node.id, &port.name, value);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocks::{Param, ValueType};
    use serde_json::json;

    fn ambient() -> AmbientContext {
        AmbientContext::new()
            .with("event", json!({ "user": "u1" }))
            .with("bot", "bot-handle")
    }

    #[test]
    fn named_injection_only_fills_declared_unresolved_params() {
        let sig = BlockSignature::new("reply")
            .param(Param::required("text", ValueType::String))
            .param(Param::optional("event", ValueType::Any, Value::Null));

        let mut args = Arguments::new();
        args.insert("text".into(), json!("hi"));
        inject_ambient(&mut args, &sig, &ambient());

        assert_eq!(args.len(), 2);
        assert_eq!(args["event"], json!({ "user": "u1" }));
        assert!(!args.contains_key("bot"));
    }

    #[test]
    fn resolved_inputs_win_over_named_injection() {
        let sig = BlockSignature::new("b").param(Param::required("event", ValueType::Any));
        let mut args = Arguments::new();
        args.insert("event".into(), json!("from-edge"));
        inject_ambient(&mut args, &sig, &ambient());
        assert_eq!(args["event"], json!("from-edge"));
    }

    #[test]
    fn open_ended_blocks_receive_everything() {
        let sig = BlockSignature::new("echo").accepts_extra();
        let mut args = Arguments::new();
        args.insert("x".into(), json!(1));
        inject_ambient(&mut args, &sig, &ambient());

        assert_eq!(args.len(), 3);
        assert_eq!(args["bot"], json!("bot-handle"));
        assert_eq!(args["x"], json!(1));
    }

    #[test]
    fn defaults_fill_only_missing_params() {
        let sig = BlockSignature::new("random_int")
            .param(Param::required("low", ValueType::Number))
            .param(Param::optional("high", ValueType::Number, 10))
            .param(Param::optional("event", ValueType::Any, Value::Null));

        let mut args = Arguments::new();
        args.insert("low".into(), json!(3));
        inject_ambient(&mut args, &sig, &ambient());
        fill_defaults(&mut args, &sig);

        assert_eq!(args["high"], json!(10));
        assert_eq!(args["event"], json!({ "user": "u1" }));

        let mut bare = Arguments::new();
        fill_defaults(&mut bare, &sig);
        assert!(!bare.contains_key("low"));
    }

    fn node(outputs: &[&str]) -> NodeDefinition {
        NodeDefinition::new("n", "blk").with_outputs(outputs)
    }

    #[test]
    fn single_output_stores_raw_result() {
        let mut cache = ValueCache::new();
        fan_out(&node(&["output"]), "blk", json!(7), &mut cache).unwrap();
        assert_eq!(cache.get("n", "output"), Some(&json!(7)));
    }

    #[test]
    fn no_outputs_discards_result() {
        let mut cache = ValueCache::new();
        fan_out(&node(&[]), "blk", json!(7), &mut cache).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn multi_output_requires_a_mapping() {
        let mut cache = ValueCache::new();
        let err = fan_out(&node(&["a", "b"]), "blk", json!(5), &mut cache).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ResultShape { declared: 2, actual: "number", .. }
        ));
    }

    #[test]
    fn multi_output_reports_missing_port() {
        let mut cache = ValueCache::new();
        let err = fan_out(&node(&["a", "b"]), "blk", json!({ "a": 1 }), &mut cache).unwrap_err();
        assert!(matches!(err, EngineError::MissingOutput { port, .. } if port == "b"));
    }

    #[test]
    fn multi_output_ignores_extra_keys() {
        let mut cache = ValueCache::new();
        fan_out(&node(&["a", "b"]), "blk", json!({ "a": 1, "b": 2, "c": 3 }), &mut cache).unwrap();
        assert_eq!(cache.get("n", "b"), Some(&json!(2)));
        assert!(!cache.has("n", "c"));
    }
}
