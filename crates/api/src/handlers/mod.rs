//! Request handlers and the state they share.

pub mod commands;
pub mod components;
pub mod flows;
pub mod health;
pub mod runs;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use blocks::builtin::BUILTIN_MODULE;
use blocks::Variables;
use engine::RegistryCatalog;
use store::FlowStore;

use crate::ApiError;

/// Server-wide settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deadline for a whole run; the engine itself never times out.
    pub run_timeout: Duration,
    /// Validate graphs strictly on save and before every run.
    pub strict: bool,
    /// Registry used when a run request names none.
    pub default_module: String,
    /// Where flows are saved after every change, if anywhere.
    pub flows_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            run_timeout: Duration::from_secs(30),
            strict: false,
            default_module: BUILTIN_MODULE.to_owned(),
            flows_file: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: FlowStore,
    pub catalog: Arc<RegistryCatalog>,
    /// Shared by every run the server starts.
    pub variables: Variables,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: FlowStore, catalog: RegistryCatalog, config: ServerConfig) -> Self {
        Self {
            store,
            catalog: Arc::new(catalog),
            variables: Variables::new(),
            config: Arc::new(config),
        }
    }

    /// Save the flows file, when one is configured.
    pub(crate) async fn persist(&self) -> Result<(), ApiError> {
        if let Some(path) = &self.config.flows_file {
            self.store.save_file(path).await?;
        }
        Ok(())
    }
}
