//! `MockBlock`: a test double for `ExecutableBlock`.
//!
//! Useful in unit and integration tests where a real block implementation is
//! either unavailable or irrelevant.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use crate::{Arguments, BlockError, ExecutableBlock, InvocationContext};

/// Behaviour injected into `MockBlock` at construction time.
#[derive(Debug, Clone)]
pub enum MockBehaviour {
    /// Return a specific JSON value.
    ReturnValue(Value),
    /// Return the received arguments as a JSON object.
    EchoArguments,
    /// Fail with `BlockError::Failed`.
    Fail(String),
}

/// A mock block that records every call it receives and returns a
/// programmer-specified result.
///
/// Clones share the call log, so a test can keep one handle and register
/// the other.
#[derive(Debug, Clone)]
pub struct MockBlock {
    /// Label used in test assertions.
    pub name: String,
    /// What the block will do when `invoke` is called.
    pub behaviour: MockBehaviour,
    /// All arguments seen by this block (in call order).
    pub calls: Arc<Mutex<Vec<Arguments>>>,
}

impl MockBlock {
    fn with_behaviour(name: impl Into<String>, behaviour: MockBehaviour) -> Self {
        Self {
            name: name.into(),
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always succeeds with the given value.
    pub fn returning(name: impl Into<String>, value: Value) -> Self {
        Self::with_behaviour(name, MockBehaviour::ReturnValue(value))
    }

    /// Create a mock that returns whatever arguments it was called with.
    pub fn echoing(name: impl Into<String>) -> Self {
        Self::with_behaviour(name, MockBehaviour::EchoArguments)
    }

    /// Create a mock that always fails.
    pub fn failing(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::with_behaviour(name, MockBehaviour::Fail(msg.into()))
    }

    /// Number of times this block has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Arguments of the most recent call.
    pub fn last_call(&self) -> Option<Arguments> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ExecutableBlock for MockBlock {
    async fn invoke(&self, args: Arguments, _ctx: &InvocationContext) -> Result<Value, BlockError> {
        self.calls.lock().unwrap().push(args.clone());

        match &self.behaviour {
            MockBehaviour::ReturnValue(v) => Ok(v.clone()),
            MockBehaviour::EchoArguments => Ok(Value::Object(args)),
            MockBehaviour::Fail(msg) => Err(BlockError::Failed(msg.clone())),
        }
    }
}
