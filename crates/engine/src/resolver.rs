//! Input resolution for a node about to execute.
//!
//! Each declared input port is filled from the first source that has a value:
//! 1. the value cache (constants land here before the run starts);
//! 2. the single edge feeding the port, read from its source's cache entry;
//! 3. the block's declared default for a parameter of that name.
//!
//! A port with none of these aborts the run with [`EngineError::UnboundInput`].
//! Ambient values are not considered here; see the invoker.

use blocks::{Arguments, BlockSignature};
use serde_json::Value;
use tracing::trace;

use crate::cache::ValueCache;
use crate::dag::GraphIndex;
use crate::models::NodeDefinition;
use crate::EngineError;

/// Resolve every declared input port of `node`.
pub fn resolve_inputs(
    node: &NodeDefinition,
    index: &GraphIndex<'_>,
    signature: &BlockSignature,
    cache: &ValueCache,
) -> Result<Arguments, EngineError> {
    let mut args = Arguments::new();
    for port in &node.inputs {
        let value = resolve_port(node, &port.name, index, signature, cache)?;
        args.insert(port.name.clone(), value);
    }
    Ok(args)
}

fn resolve_port(
    node: &NodeDefinition,
    port: &str,
    index: &GraphIndex<'_>,
    signature: &BlockSignature,
    cache: &ValueCache,
) -> Result<Value, EngineError> {
    if let Some(value) = cache.get(&node.id, port) {
        trace!(node_id = %node.id, port, "input from cache");
        return Ok(value.clone());
    }

    if let Some(edge) = index.inbound_edge(&node.id, port) {
        if let Some(value) = cache.get(&edge.source, &edge.source_port) {
            trace!(node_id = %node.id, port, source = %edge.source, "input from edge");
            return Ok(value.clone());
        }
        // Upstream placeholder without a constant, or a node with no such output.
        trace!(node_id = %node.id, port, source = %edge.source, "edge source has no value");
    }

    if let Some(default) = signature.default_for(port) {
        trace!(node_id = %node.id, port, "input from declared default");
        return Ok(default.clone());
    }

    Err(EngineError::UnboundInput {
        node_id: node.id.clone(),
        label: node.display_name().to_owned(),
        port: port.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Edge, Graph};
    use blocks::{Param, ValueType};
    use serde_json::json;

    fn signature() -> BlockSignature {
        BlockSignature::new("random_int")
            .param(Param::required("low", ValueType::Number))
            .param(Param::optional("high", ValueType::Number, 10))
    }

    fn graph() -> Graph {
        Graph::new(
            vec![
                NodeDefinition::new("src", "whatever").with_outputs(&["n"]),
                NodeDefinition::new("pick", "random_int")
                    .with_label("Random Number")
                    .with_inputs(&["low", "high"]),
            ],
            vec![Edge::new("src", "n", "pick", "low")],
        )
    }

    #[test]
    fn constant_beats_edge() {
        let graph = graph().with_constant("pick", "low", 3);
        let index = GraphIndex::build(&graph).unwrap();
        let mut cache = ValueCache::from_constants(&graph.constants);
        cache.set("src", "n", json!(99));

        let args = resolve_inputs(graph.node("pick").unwrap(), &index, &signature(), &cache).unwrap();
        assert_eq!(args["low"], json!(3));
    }

    #[test]
    fn edge_then_default() {
        let graph = graph();
        let index = GraphIndex::build(&graph).unwrap();
        let mut cache = ValueCache::new();
        cache.set("src", "n", json!(4));

        let args = resolve_inputs(graph.node("pick").unwrap(), &index, &signature(), &cache).unwrap();
        assert_eq!(args["low"], json!(4));
        assert_eq!(args["high"], json!(10));
    }

    #[test]
    fn unbound_port_names_node_and_port() {
        let graph = graph();
        let index = GraphIndex::build(&graph).unwrap();
        let cache = ValueCache::new(); // src never produced `n`

        let err = resolve_inputs(graph.node("pick").unwrap(), &index, &signature(), &cache).unwrap_err();
        match err {
            EngineError::UnboundInput { node_id, label, port } => {
                assert_eq!(node_id, "pick");
                assert_eq!(label, "Random Number");
                assert_eq!(port, "low");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
