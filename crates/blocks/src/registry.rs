//! Block registry: `code_id` → callable plus its declared signature.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::{Arguments, BlockError, BlockSignature, ExecutableBlock, InvocationContext};

/// A plain function block that returns its result immediately.
pub type SyncBlockFn =
    Arc<dyn Fn(Arguments, &InvocationContext) -> Result<Value, BlockError> + Send + Sync>;

/// How a registered block is called.
#[derive(Clone)]
pub enum Callable {
    /// Result is available as soon as the call returns.
    Sync(SyncBlockFn),
    /// Call yields a future that must be awaited.
    Async(Arc<dyn ExecutableBlock>),
}

impl Callable {
    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async(_))
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Callable::Sync"),
            Self::Async(_) => f.write_str("Callable::Async"),
        }
    }
}

/// One registry entry.
#[derive(Debug, Clone)]
pub struct BlockEntry {
    pub signature: BlockSignature,
    pub callable: Callable,
}

/// Named collection of blocks a graph's `code_id`s are resolved against.
///
/// Read-only once built; wrap it in an `Arc` to share it between runs.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    name: String,
    entries: BTreeMap<String, BlockEntry>,
}

impl BlockRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a block that completes synchronously.
    pub fn register_sync<F>(&mut self, signature: BlockSignature, f: F) -> &mut Self
    where
        F: Fn(Arguments, &InvocationContext) -> Result<Value, BlockError> + Send + Sync + 'static,
    {
        self.insert(signature, Callable::Sync(Arc::new(f)))
    }

    /// Register a block whose invocation must be awaited.
    pub fn register_async<B>(&mut self, signature: BlockSignature, block: B) -> &mut Self
    where
        B: ExecutableBlock + 'static,
    {
        self.insert(signature, Callable::Async(Arc::new(block)))
    }

    fn insert(&mut self, signature: BlockSignature, callable: Callable) -> &mut Self {
        let code_id = signature.code_id.clone();
        debug!(registry = %self.name, %code_id, asynchronous = callable.is_async(), "registering block");
        if self
            .entries
            .insert(code_id.clone(), BlockEntry { signature, callable })
            .is_some()
        {
            debug!(registry = %self.name, %code_id, "replaced existing block");
        }
        self
    }

    pub fn get(&self, code_id: &str) -> Option<&BlockEntry> {
        self.entries.get(code_id)
    }

    pub fn contains(&self, code_id: &str) -> bool {
        self.entries.contains_key(code_id)
    }

    /// Signatures in `code_id` order.
    pub fn signatures(&self) -> impl Iterator<Item = &BlockSignature> {
        self.entries.values().map(|e| &e.signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
