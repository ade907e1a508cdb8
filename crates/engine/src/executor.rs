//! Graph execution engine.
//!
//! `GraphRunner` is the central orchestrator:
//! 1. Indexes the graph (optionally validating it strictly first).
//! 2. Seeds the value cache from the graph's constants.
//! 3. Pulls ready nodes from the scheduler one at a time, in Kahn order.
//! 4. Resolves each node's inputs, injects ambient context, fills declared
//!    defaults for parameters the node leaves out, invokes the block
//!    (awaiting it if asynchronous) and fans its result into the cache.
//! 5. Returns the final cache plus what ran, what was skipped and what was
//!    never reached.
//!
//! Placeholder nodes (no registry entry) are skipped. Any resolution, shape
//! or block error aborts the run immediately.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use blocks::{BlockEntry, BlockRegistry, InvocationContext, Variables};

use crate::ambient::AmbientContext;
use crate::cache::ValueCache;
use crate::dag::{validate_graph, GraphIndex};
use crate::invoker::{fan_out, fill_defaults, inject_ambient, invoke};
use crate::models::{Graph, NodeDefinition};
use crate::resolver::resolve_inputs;
use crate::EngineError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the runner.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Run [`validate_graph`] before executing; rejects dangling edges and cycles.
    pub strict: bool,
    /// Log a warning when some nodes were never reached.
    pub warn_on_stranded: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            strict: false,
            warn_on_stranded: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Output of a completed run
// ---------------------------------------------------------------------------

/// The result of running a full graph.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    /// Every resolved `(node, port)` value, constants included.
    pub cache: ValueCache,
    /// Invoked nodes, in execution order.
    pub executed: Vec<String>,
    /// Placeholder nodes that were released but not invoked.
    pub skipped: Vec<String>,
    /// Nodes never released because they sit on or behind a cycle.
    pub stranded: Vec<String>,
}

// ---------------------------------------------------------------------------
// GraphRunner
// ---------------------------------------------------------------------------

/// Runs graphs against one block registry.
///
/// Holds nothing per run, so one runner can serve many runs; the registry is
/// shared read-only and every run gets a fresh cache.
#[derive(Debug, Clone)]
pub struct GraphRunner {
    registry: Arc<BlockRegistry>,
    variables: Variables,
    config: RunnerConfig,
}

impl GraphRunner {
    pub fn new(registry: Arc<BlockRegistry>, variables: Variables, config: RunnerConfig) -> Self {
        Self {
            registry,
            variables,
            config,
        }
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Parse a serialized graph and run it.
    pub async fn run_json(&self, doc: &str, ambient: &AmbientContext) -> Result<RunOutcome, EngineError> {
        let graph = Graph::from_json(doc)?;
        self.run(&graph, ambient).await
    }

    /// Run the graph and return the final value cache.
    ///
    /// # Errors
    /// Load errors (duplicate IDs, conflicting input edges), strict
    /// validation errors when enabled, and the first resolution, result
    /// shape or block failure.
    pub async fn run(&self, graph: &Graph, ambient: &AmbientContext) -> Result<RunOutcome, EngineError> {
        self.execute(graph, ambient, Uuid::new_v4()).await
    }

    /// Like [`run`](Self::run) but with a caller-chosen run id, so the run
    /// can be recorded before it starts.
    pub async fn run_with_id(
        &self,
        graph: &Graph,
        ambient: &AmbientContext,
        run_id: Uuid,
    ) -> Result<RunOutcome, EngineError> {
        self.execute(graph, ambient, run_id).await
    }

    #[instrument(
        skip(self, graph, ambient),
        fields(registry = %self.registry.name(), nodes = graph.nodes.len())
    )]
    async fn execute(
        &self,
        graph: &Graph,
        ambient: &AmbientContext,
        run_id: Uuid,
    ) -> Result<RunOutcome, EngineError> {
        if self.config.strict {
            validate_graph(graph)?;
        }

        let index = GraphIndex::build(graph)?;
        let mut cache = ValueCache::from_constants(&graph.constants);
        let mut scheduler = index.scheduler();
        let mut executed = Vec::new();
        let mut skipped = Vec::new();

        info!(
            constants = cache.len(),
            dangling_edges = index.dangling_edges(),
            "starting run"
        );

        while let Some(node) = scheduler.next_ready() {
            match self.registry.get(&node.code_id) {
                Some(entry) => {
                    self.execute_node(node, entry, &index, &mut cache, ambient, run_id)
                        .await?;
                    executed.push(node.id.clone());
                }
                None => {
                    debug!(node_id = %node.id, code_id = %node.code_id, "placeholder node, not invoked");
                    skipped.push(node.id.clone());
                }
            }
            scheduler.complete(node);
        }

        let stranded = scheduler.stranded();
        if !stranded.is_empty() && self.config.warn_on_stranded {
            warn!(?stranded, "nodes never became ready; graph has a cycle");
        }

        info!(
            executed = executed.len(),
            skipped = skipped.len(),
            stranded = stranded.len(),
            "run finished"
        );

        Ok(RunOutcome {
            run_id,
            cache,
            executed,
            skipped,
            stranded,
        })
    }

    // -----------------------------------------------------------------------
    // Internal: resolve, invoke and fan out a single node.
    // -----------------------------------------------------------------------

    async fn execute_node(
        &self,
        node: &NodeDefinition,
        entry: &BlockEntry,
        index: &GraphIndex<'_>,
        cache: &mut ValueCache,
        ambient: &AmbientContext,
        run_id: Uuid,
    ) -> Result<(), EngineError> {
        let mut args = resolve_inputs(node, index, &entry.signature, cache)?;
        inject_ambient(&mut args, &entry.signature, ambient);
        fill_defaults(&mut args, &entry.signature);

        let ctx = InvocationContext::new(run_id, node.id.clone(), self.variables.clone());
        debug!(
            node_id = %node.id,
            code_id = %node.code_id,
            asynchronous = entry.callable.is_async(),
            "invoking block"
        );

        let result = invoke(entry, args, &ctx)
            .await
            .map_err(|source| EngineError::BlockFailed {
                node_id: node.id.clone(),
                code_id: node.code_id.clone(),
                source,
            })?;

        fan_out(node, &node.code_id, result, cache)
    }
}
