//! `blocks` crate: block signatures, the `ExecutableBlock` trait, the block
//! registry and the built-in block library.
//!
//! Every block, built-in or user supplied, is registered with a declared
//! [`BlockSignature`]. The engine crate resolves graph nodes against a
//! [`BlockRegistry`] and never inspects a block beyond its signature.

pub mod builtin;
pub mod error;
pub mod mock;
pub mod registry;
pub mod schema;
pub mod signature;
pub mod traits;
pub mod variables;

pub use error::BlockError;
pub use registry::{BlockEntry, BlockRegistry, Callable, SyncBlockFn};
pub use signature::{BlockSignature, OutputPort, Param, ValueType, DEFAULT_OUTPUT};
pub use traits::{Arguments, ExecutableBlock, InvocationContext};
pub use variables::Variables;
