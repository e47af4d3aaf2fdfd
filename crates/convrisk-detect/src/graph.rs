//! Minimal directed graph used by the semantic and multi-role analyzers.
//!
//! Nodes are keyed by stable string identifiers and carry a typed payload;
//! edges carry a kind tag and a weight. Adjacency is kept in ordered maps so
//! traversal order is deterministic across runs.

use std::collections::BTreeMap;

/// Payload of a graph node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// One conversation turn.
    Dialogue {
        turn_id: usize,
        role: String,
        content: String,
        concepts: Vec<String>,
    },
    /// A deduplicated concept mentioned anywhere in the conversation.
    Concept { name: String },
    /// A deduplicated speaker role.
    Role { name: String },
}

/// Edge kind tag.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeKind {
    /// Role node to dialogue node.
    Speaks,
    /// Dialogue node to concept node.
    Mentions,
    /// Concept to concept, carrying the dangerous-combination category.
    DangerousPattern { category: String },
    /// Role to role, one consecutive speaker change.
    Transition,
}

/// A directed, weighted edge between two node identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub weight: f64,
}

/// Directed graph with string node identifiers.
#[derive(Debug, Clone, Default)]
pub struct DiGraph {
    nodes: BTreeMap<String, NodeKind>,
    edges: Vec<Edge>,
    outgoing: BTreeMap<String, Vec<usize>>,
    in_degree: BTreeMap<String, usize>,
}

impl DiGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, keeping the existing payload if the id is taken.
    pub fn add_node(&mut self, id: &str, kind: NodeKind) {
        self.nodes.entry(id.to_string()).or_insert(kind);
        self.in_degree.entry(id.to_string()).or_insert(0);
    }

    /// Whether a node with this id exists.
    #[must_use]
    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Node payload lookup.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&NodeKind> {
        self.nodes.get(id)
    }

    /// Total node count.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over `(id, payload)` pairs in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (&String, &NodeKind)> {
        self.nodes.iter()
    }

    /// Add a directed edge. Endpoints must already exist as nodes.
    pub fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind, weight: f64) {
        debug_assert!(self.has_node(from) && self.has_node(to));
        let index = self.edges.len();
        self.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            weight,
        });
        self.outgoing.entry(from.to_string()).or_default().push(index);
        *self.in_degree.entry(to.to_string()).or_insert(0) += 1;
    }

    /// Whether at least one edge `from -> to` exists.
    #[must_use]
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.out_edges(from).any(|e| e.to == to)
    }

    /// Increment the weight of an existing `from -> to` edge, or insert it
    /// with weight 1 if absent. Used for role-transition counting.
    pub fn bump_edge_weight(&mut self, from: &str, to: &str, kind: EdgeKind) {
        let existing = self.outgoing.get(from).and_then(|indices| {
            indices
                .iter()
                .copied()
                .find(|&i| self.edges[i].to == to && self.edges[i].kind == kind)
        });
        match existing {
            Some(i) => self.edges[i].weight += 1.0,
            None => self.add_edge(from, to, kind, 1.0),
        }
    }

    /// Outgoing edges of a node.
    pub fn out_edges(&self, id: &str) -> impl Iterator<Item = &Edge> {
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Number of distinct edges pointing at a node.
    ///
    /// Parallel edges count once per insertion; callers that need distinct
    /// predecessors should use [`Self::distinct_in_degree`].
    #[must_use]
    pub fn in_degree(&self, id: &str) -> usize {
        self.in_degree.get(id).copied().unwrap_or(0)
    }

    /// Number of distinct predecessor nodes of a node.
    #[must_use]
    pub fn distinct_in_degree(&self, id: &str) -> usize {
        let mut sources: Vec<&str> = self
            .edges
            .iter()
            .filter(|e| e.to == id)
            .map(|e| e.from.as_str())
            .collect();
        sources.sort_unstable();
        sources.dedup();
        sources.len()
    }
}
