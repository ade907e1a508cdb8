//! Per-run value cache keyed by (node, port).

use std::collections::HashMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

/// Resolved port values for a single run.
///
/// Seeded from the graph's constants, then grown as nodes execute. Owned
/// exclusively by one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueCache {
    entries: HashMap<String, HashMap<String, Value>>,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cache from `"<node>.<port>"` constants.
    ///
    /// Keys are split on the first `.`; keys without one cannot address a
    /// port and are skipped.
    pub fn from_constants(constants: &Map<String, Value>) -> Self {
        let mut cache = Self::new();
        for (key, value) in constants {
            match key.split_once('.') {
                Some((node, port)) => cache.set(node, port, value.clone()),
                None => warn!(%key, "ignoring constant without a node.port key"),
            }
        }
        cache
    }

    pub fn get(&self, node: &str, port: &str) -> Option<&Value> {
        self.entries.get(node)?.get(port)
    }

    pub fn has(&self, node: &str, port: &str) -> bool {
        self.get(node, port).is_some()
    }

    pub fn set(&mut self, node: &str, port: &str, value: Value) {
        self.entries
            .entry(node.to_owned())
            .or_default()
            .insert(port.to_owned(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate `(node, port, value)` triples in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.entries.iter().flat_map(|(node, ports)| {
            ports
                .iter()
                .map(move |(port, value)| (node.as_str(), port.as_str(), value))
        })
    }

    /// Export as a `"<node>.<port>"` keyed object.
    pub fn to_dotted(&self) -> Map<String, Value> {
        self.iter()
            .map(|(node, port, value)| (format!("{node}.{port}"), value.clone()))
            .collect()
    }
}

impl Serialize for ValueCache {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dotted().serialize(serializer)
    }
}
