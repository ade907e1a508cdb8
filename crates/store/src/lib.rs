//! `store` crate: flow persistence.
//!
//! Holds saved flows (named graphs) and a bounded history of runs in memory,
//! with optional load/save of the flows to a JSON file. Repository functions
//! take a `&FlowStore` and return `Result<T, StoreError>`; no execution logic
//! lives here.

pub mod error;
pub mod memory;
pub mod models;
pub mod repository;

pub use error::StoreError;
pub use memory::FlowStore;
