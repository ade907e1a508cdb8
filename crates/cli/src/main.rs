//! `block-graph` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`       start the API server.
//! - `validate`    strictly validate a graph JSON file.
//! - `run`         run a graph JSON file once and print the outcome.
//! - `components`  print the editor palette for a block registry.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use blocks::builtin::BUILTIN_MODULE;
use blocks::schema::build_components;
use blocks::Variables;
use engine::{validate_graph, AmbientContext, Graph, GraphRunner, RegistryCatalog, RunnerConfig};
use store::FlowStore;

#[derive(Parser)]
#[command(name = "block-graph", about = "Runs visual block graphs", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[arg(long, env = "BLOCKS_BIND", default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
        /// JSON file flows are loaded from and saved to.
        #[arg(long, env = "BLOCKS_FLOWS_FILE")]
        flows: Option<PathBuf>,
        #[arg(long, env = "BLOCKS_RUN_TIMEOUT_SECS", default_value_t = 30)]
        run_timeout_secs: u64,
        /// Reject dangling edges and cycles on save and before every run.
        #[arg(long)]
        strict: bool,
    },
    /// Validate a graph JSON file.
    Validate {
        /// Path to the graph JSON file.
        path: PathBuf,
    },
    /// Run a graph JSON file once.
    Run {
        path: PathBuf,
        #[arg(long, default_value = BUILTIN_MODULE)]
        module: String,
        /// Triggering event as JSON, exposed to blocks as `event`.
        #[arg(long)]
        event: Option<String>,
        /// Extra constant binding, `node.port=<json>`; repeatable.
        #[arg(long = "const", value_parser = parse_constant)]
        constants: Vec<(String, Value)>,
        #[arg(long)]
        strict: bool,
    },
    /// Print the editor palette for a block registry.
    Components {
        #[arg(long, default_value = BUILTIN_MODULE)]
        module: String,
    },
}

/// Parse `node.port=<json>`; a value that is not JSON is taken as a string.
fn parse_constant(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected node.port=value, got '{raw}'"))?;
    if !key.contains('.') {
        return Err(format!("constant key '{key}' must look like node.port"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()));
    Ok((key.to_owned(), value))
}

fn read_graph(path: &Path) -> Result<Graph> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("cannot read file {}", path.display()))?;
    Graph::from_json(&content).with_context(|| format!("invalid graph in {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let catalog = RegistryCatalog::new();

    match cli.command {
        Command::Serve {
            bind,
            flows,
            run_timeout_secs,
            strict,
        } => {
            let store = match &flows {
                Some(path) => FlowStore::load_file(path)
                    .await
                    .with_context(|| format!("cannot load flows from {}", path.display()))?,
                None => FlowStore::new(),
            };
            let config = api::ServerConfig {
                run_timeout: Duration::from_secs(run_timeout_secs),
                strict,
                flows_file: flows,
                ..api::ServerConfig::default()
            };
            info!(%bind, strict, run_timeout_secs, "starting API server");
            api::serve(bind, api::AppState::new(store, catalog, config)).await?;
        }
        Command::Validate { path } => {
            let graph = read_graph(&path)?;
            let order = validate_graph(&graph).context("validation failed")?;
            println!("graph is valid; execution order: {order:?}");
        }
        Command::Run {
            path,
            module,
            event,
            constants,
            strict,
        } => {
            let mut graph = read_graph(&path)?;
            graph.constants.extend(constants);

            let mut ambient = AmbientContext::new();
            if let Some(event) = event {
                let event: Value = serde_json::from_str(&event).context("--event is not valid JSON")?;
                ambient.insert("event", event);
            }

            let runner = GraphRunner::new(
                catalog.resolve(&module)?,
                Variables::new(),
                RunnerConfig {
                    strict,
                    ..RunnerConfig::default()
                },
            );
            let outcome = runner.run(&graph, &ambient).await.context("run failed")?;
            let variables = runner.variables().snapshot();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "outcome": outcome, "variables": variables }))?
            );
        }
        Command::Components { module } => {
            let registry = catalog.resolve(&module)?;
            println!("{}", serde_json::to_string_pretty(&build_components(&registry))?);
        }
    }

    Ok(())
}
