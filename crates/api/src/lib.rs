//! `api` crate: HTTP REST API layer.
//!
//! Exposes:
//!   GET    /health
//!   GET    /api/v1/flows
//!   POST   /api/v1/flows
//!   GET    /api/v1/flows/:id
//!   PUT    /api/v1/flows/:id
//!   DELETE /api/v1/flows/:id
//!   POST   /api/v1/flows/:id/run
//!   GET    /api/v1/flows/:id/runs
//!   GET    /api/v1/commands
//!   POST   /api/v1/commands/:name
//!   GET    /api/v1/components?module=builtin

pub mod error;
pub mod handlers;
pub mod router;

pub use error::ApiError;
pub use handlers::{AppState, ServerConfig};
pub use router::{router, serve};
