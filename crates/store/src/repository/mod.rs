//! Repository functions, one function per store operation.
//!
//! Every function takes a `&FlowStore` and returns a `Result<T, StoreError>`.

pub mod flows;
pub mod runs;
