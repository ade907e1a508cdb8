//! Graph indexing, scheduling and strict validation.
//!
//! [`GraphIndex`] is what every run builds first. It rejects duplicate node
//! IDs and multiple edges into one input port, silently drops dangling
//! edges, and precomputes adjacency and in-degrees.
//!
//! [`Scheduler`] walks the index with Kahn's algorithm. Nodes of in-degree
//! zero are released in declaration order; a node's successors are released
//! only once the caller marks it complete. Nodes on (or behind) a cycle
//! never become ready and are reported as stranded.
//!
//! [`validate_graph`] is the strict variant for callers that want dangling
//! edges and cycles rejected outright.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::models::{Edge, Graph, NodeDefinition};
use crate::EngineError;

// ---------------------------------------------------------------------------
// GraphIndex
// ---------------------------------------------------------------------------

/// Read-only lookup structures over a [`Graph`], restricted to non-dangling edges.
#[derive(Debug)]
pub struct GraphIndex<'a> {
    graph: &'a Graph,
    nodes: HashMap<&'a str, &'a NodeDefinition>,
    /// target node → target port → the single edge feeding it.
    inbound: HashMap<&'a str, HashMap<&'a str, &'a Edge>>,
    successors: HashMap<&'a str, Vec<&'a str>>,
    in_degree: HashMap<&'a str, usize>,
    dangling: usize,
}

impl<'a> GraphIndex<'a> {
    /// Index `graph`.
    ///
    /// # Errors
    /// - [`EngineError::DuplicateNodeId`] if two nodes share an ID.
    /// - [`EngineError::ConflictingInputEdges`] if an input port has several incoming edges.
    pub fn build(graph: &'a Graph) -> Result<Self, EngineError> {
        let mut nodes: HashMap<&str, &NodeDefinition> = HashMap::with_capacity(graph.nodes.len());
        for node in &graph.nodes {
            if nodes.insert(node.id.as_str(), node).is_some() {
                return Err(EngineError::DuplicateNodeId(node.id.clone()));
            }
        }

        let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut in_degree: HashMap<&str, usize> = nodes.keys().map(|&id| (id, 0)).collect();
        let mut inbound: HashMap<&str, HashMap<&str, &Edge>> = HashMap::new();
        let mut dangling = 0;

        let is_live = |e: &Edge| nodes.contains_key(e.source.as_str()) && nodes.contains_key(e.target.as_str());

        for edge in &graph.edges {
            if !is_live(edge) {
                debug!(
                    source = %edge.source,
                    target = %edge.target,
                    "ignoring edge to a node that is not in the graph"
                );
                dangling += 1;
                continue;
            }

            let ports = inbound.entry(edge.target.as_str()).or_default();
            if ports.insert(edge.target_port.as_str(), edge).is_some() {
                let count = graph
                    .edges
                    .iter()
                    .filter(|e| is_live(e) && e.target == edge.target && e.target_port == edge.target_port)
                    .count();
                return Err(EngineError::ConflictingInputEdges {
                    node_id: edge.target.clone(),
                    port: edge.target_port.clone(),
                    count,
                });
            }

            successors
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.target.as_str());
            *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
        }

        Ok(Self {
            graph,
            nodes,
            inbound,
            successors,
            in_degree,
            dangling,
        })
    }

    pub fn graph(&self) -> &'a Graph {
        self.graph
    }

    pub fn node(&self, id: &str) -> Option<&'a NodeDefinition> {
        self.nodes.get(id).copied()
    }

    /// The edge feeding `node.port`, if any.
    pub fn inbound_edge(&self, node: &str, port: &str) -> Option<&'a Edge> {
        self.inbound.get(node)?.get(port).copied()
    }

    pub fn successors(&self, node: &str) -> &[&'a str] {
        self.successors.get(node).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of edges dropped because an endpoint is not in the graph.
    pub fn dangling_edges(&self) -> usize {
        self.dangling
    }

    pub fn scheduler(&self) -> Scheduler<'_, 'a> {
        Scheduler::new(self)
    }

    /// Full Kahn ordering without executing anything: `(order, stranded)`.
    pub fn execution_order(&self) -> (Vec<String>, Vec<String>) {
        let mut scheduler = self.scheduler();
        let mut order = Vec::with_capacity(self.graph.nodes.len());
        while let Some(node) = scheduler.next_ready() {
            order.push(node.id.clone());
            scheduler.complete(node);
        }
        (order, scheduler.stranded())
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Incremental Kahn traversal over a [`GraphIndex`].
pub struct Scheduler<'i, 'a> {
    index: &'i GraphIndex<'a>,
    in_degree: HashMap<&'a str, usize>,
    queue: VecDeque<&'a NodeDefinition>,
    released: HashSet<&'a str>,
}

impl<'i, 'a> Scheduler<'i, 'a> {
    pub fn new(index: &'i GraphIndex<'a>) -> Self {
        let in_degree = index.in_degree.clone();

        // Seed in declaration order; callers rely on this tie-break.
        let queue: VecDeque<&NodeDefinition> = index
            .graph
            .nodes
            .iter()
            .filter(|n| in_degree.get(n.id.as_str()).copied().unwrap_or(0) == 0)
            .collect();

        Self {
            index,
            in_degree,
            queue,
            released: HashSet::new(),
        }
    }

    /// Next node whose dependencies have all completed.
    pub fn next_ready(&mut self) -> Option<&'a NodeDefinition> {
        let node = self.queue.pop_front()?;
        self.released.insert(node.id.as_str());
        Some(node)
    }

    /// Mark `node` done and release any successor whose in-degree drops to zero.
    pub fn complete(&mut self, node: &NodeDefinition) {
        for &succ in self.index.successors(&node.id) {
            let Some(deg) = self.in_degree.get_mut(succ) else {
                continue;
            };
            *deg = deg.saturating_sub(1);
            if *deg == 0 {
                if let Some(next) = self.index.node(succ) {
                    self.queue.push_back(next);
                }
            }
        }
    }

    /// Nodes never released, in declaration order.
    pub fn stranded(&self) -> Vec<String> {
        self.index
            .graph
            .nodes
            .iter()
            .filter(|n| !self.released.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Strict validation
// ---------------------------------------------------------------------------

/// Validate the graph strictly and return node IDs in execution order.
///
/// Run this before persisting a graph, or before executing it when silent
/// tolerance of stale editor state is not wanted.
///
/// # Errors
/// - [`EngineError::DuplicateNodeId`] if two nodes share an ID.
/// - [`EngineError::UnknownNodeReference`] if an edge references a missing node.
/// - [`EngineError::ConflictingInputEdges`] if an input port has several incoming edges.
/// - [`EngineError::CycleDetected`] if some nodes can never run.
pub fn validate_graph(graph: &Graph) -> Result<Vec<String>, EngineError> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &graph.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            return Err(EngineError::DuplicateNodeId(node.id.clone()));
        }
    }

    for edge in &graph.edges {
        if !seen_ids.contains(edge.source.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.source.clone(),
                side: "source",
            });
        }
        if !seen_ids.contains(edge.target.as_str()) {
            return Err(EngineError::UnknownNodeReference {
                node_id: edge.target.clone(),
                side: "target",
            });
        }
    }

    let index = GraphIndex::build(graph)?;
    let (order, stranded) = index.execution_order();
    if !stranded.is_empty() {
        return Err(EngineError::CycleDetected { stranded });
    }

    Ok(order)
}

// ============================================================
// Unit tests
// ============================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn make_node(id: &str) -> NodeDefinition {
        NodeDefinition::new(id, "mock")
            .with_inputs(&["in"])
            .with_outputs(&["out"])
    }

    fn wire(from: &str, to: &str) -> Edge {
        Edge::new(from, "out", to, "in")
    }

    fn make_graph(ids: &[&str], edges: Vec<Edge>) -> Graph {
        Graph::new(ids.iter().map(|id| make_node(id)).collect(), edges)
    }

    #[test]
    fn valid_linear_dag_returns_sorted_order() {
        // A → B → C
        let graph = make_graph(&["a", "b", "c"], vec![wire("a", "b"), wire("b", "c")]);

        let sorted = validate_graph(&graph).expect("should be valid");
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn valid_diamond_dag() {
        //   A
        //  / \
        // B   C
        //  \ /
        //   D
        let mut graph = make_graph(
            &["a", "b", "c", "d"],
            vec![wire("a", "b"), wire("a", "c"), wire("b", "d")],
        );
        graph.edges.push(Edge::new("c", "out", "d", "other"));

        let sorted = validate_graph(&graph).expect("should be valid");
        assert_eq!(sorted, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn independent_roots_follow_declaration_order() {
        let graph = make_graph(&["zeta", "alpha", "mid"], vec![]);
        let index = GraphIndex::build(&graph).unwrap();
        let (order, stranded) = index.execution_order();
        assert_eq!(order, vec!["zeta", "alpha", "mid"]);
        assert!(stranded.is_empty());
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let graph = make_graph(&["a", "a"], vec![]); // duplicate!
        assert!(matches!(
            validate_graph(&graph),
            Err(EngineError::DuplicateNodeId(id)) if id == "a"
        ));
        assert!(matches!(
            GraphIndex::build(&graph),
            Err(EngineError::DuplicateNodeId(_))
        ));
    }

    #[test]
    fn edge_referencing_missing_node_is_rejected_strictly() {
        let graph = make_graph(&["a"], vec![wire("a", "ghost")]); // ghost doesn't exist
        assert!(matches!(
            validate_graph(&graph),
            Err(EngineError::UnknownNodeReference { node_id, side: "target" }) if node_id == "ghost"
        ));
    }

    #[test]
    fn dangling_edges_are_ignored_by_the_index() {
        let graph = make_graph(&["a", "b"], vec![wire("ghost", "b"), wire("a", "b")]);
        let index = GraphIndex::build(&graph).unwrap();

        assert_eq!(index.dangling_edges(), 1);
        assert_eq!(index.inbound_edge("b", "in").unwrap().source, "a");
        assert_eq!(index.execution_order().0, vec!["a", "b"]);
    }

    #[test]
    fn two_edges_into_one_port_are_rejected() {
        let graph = make_graph(&["a", "b", "c"], vec![wire("a", "c"), wire("b", "c")]);
        assert!(matches!(
            GraphIndex::build(&graph),
            Err(EngineError::ConflictingInputEdges { node_id, port, count: 2 })
                if node_id == "c" && port == "in"
        ));
    }

    #[test]
    fn cycle_is_detected() {
        // A → B → C → A  (cycle!), D downstream of the cycle, E independent
        let graph = make_graph(
            &["a", "b", "c", "d", "e"],
            vec![wire("a", "b"), wire("b", "c"), wire("c", "a"), Edge::new("c", "out", "d", "in")],
        );

        match validate_graph(&graph) {
            Err(EngineError::CycleDetected { stranded }) => {
                assert_eq!(stranded, vec!["a", "b", "c", "d"]);
            }
            other => panic!("expected a cycle, got {other:?}"),
        }

        let index = GraphIndex::build(&graph).unwrap();
        let (order, stranded) = index.execution_order();
        assert_eq!(order, vec!["e"]);
        assert_eq!(stranded.len(), 4);
    }

    #[test]
    fn successors_are_released_only_after_completion() {
        let graph = make_graph(&["a", "b"], vec![wire("a", "b")]);
        let index = GraphIndex::build(&graph).unwrap();
        let mut scheduler = index.scheduler();

        let a = scheduler.next_ready().unwrap();
        assert_eq!(a.id, "a");
        assert!(scheduler.next_ready().is_none());

        scheduler.complete(a);
        assert_eq!(scheduler.next_ready().unwrap().id, "b");
        assert!(scheduler.stranded().is_empty());
    }

    #[test]
    fn single_node_no_edges_is_valid() {
        let graph = make_graph(&["solo"], vec![]);
        let sorted = validate_graph(&graph).expect("single node should be valid");
        assert_eq!(sorted, vec!["solo"]);
    }
}
