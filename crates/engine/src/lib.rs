//! `engine` crate: graph models, scheduling, input resolution and the graph runner.

pub mod ambient;
pub mod cache;
pub mod catalog;
pub mod dag;
pub mod error;
pub mod executor;
pub mod invoker;
pub mod models;
pub mod resolver;
pub mod trigger;

pub use ambient::AmbientContext;
pub use cache::ValueCache;
pub use catalog::RegistryCatalog;
pub use dag::{validate_graph, GraphIndex};
pub use error::EngineError;
pub use executor::{GraphRunner, RunOutcome, RunnerConfig};
pub use models::{CommandOption, Edge, Graph, NodeDefinition, Port};
