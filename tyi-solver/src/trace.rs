//! Record of the constraints created while solving, for tooling
use crate::{
    common::FastHashMap,
    infer::{ConstraintId, ConstraintKind},
};
use petgraph::{
    dot::Dot,
    graph::{DiGraph, NodeIndex},
};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Resolved,
    Failed,
    /// Replaced by a common type constraint
    Merged,
    /// Failed silently once the solver got stuck
    Forced,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pending => write!(f, "pending"),
            Outcome::Resolved => write!(f, "resolved"),
            Outcome::Failed => write!(f, "failed"),
            Outcome::Merged => write!(f, "merged"),
            Outcome::Forced => write!(f, "forced"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TraceNode {
    pub id: ConstraintId,
    pub kind: ConstraintKind,
    pub outcome: Outcome,
    /// Number of passes where the rule refined the constraint without
    /// settling it
    pub advances: usize,
}

impl fmt::Display for TraceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({}", self.id.index(), self.kind, self.outcome)?;

        if self.advances != 0 {
            write!(f, ", {} advances", self.advances)?;
        }

        write!(f, ")")
    }
}

/// Graph of constraints, an edge links a constraint to the ones created
/// while its rule was applied and is weighted by the pass number
#[derive(Debug, Default)]
pub struct SolverTrace {
    graph: DiGraph<TraceNode, usize>,
    nodes: FastHashMap<ConstraintId, NodeIndex>,
    pass: usize,
}

impl SolverTrace {
    pub(crate) fn register(
        &mut self,
        id: ConstraintId,
        kind: ConstraintKind,
        parent: Option<ConstraintId>,
    ) {
        let node = self.graph.add_node(TraceNode {
            id,
            kind,
            outcome: Outcome::Pending,
            advances: 0,
        });
        self.nodes.insert(id, node);

        let parent = parent.and_then(|parent| self.nodes.get(&parent).copied());

        if let Some(parent) = parent {
            self.graph.add_edge(parent, node, self.pass);
        }
    }

    pub(crate) fn next_pass(&mut self) { self.pass += 1 }

    pub(crate) fn advance(&mut self, id: ConstraintId) {
        if let Some(node) = self.nodes.get(&id) {
            self.graph[*node].advances += 1;
        }
    }

    pub(crate) fn settle(&mut self, id: ConstraintId, outcome: Outcome) {
        if let Some(node) = self.nodes.get(&id) {
            self.graph[*node].outcome = outcome;
        }
    }

    /// Number of scheduler passes recorded
    pub fn passes(&self) -> usize { self.pass }

    pub fn node(&self, id: ConstraintId) -> Option<&TraceNode> {
        self.nodes.get(&id).map(|node| &self.graph[*node])
    }

    /// Constraints created while the rule of `id` was applied
    pub fn spawned(&self, id: ConstraintId) -> Vec<ConstraintId> {
        let mut spawned: Vec<_> = match self.nodes.get(&id) {
            Some(node) => self
                .graph
                .neighbors(*node)
                .map(|child| self.graph[child].id)
                .collect(),
            None => Vec::new(),
        };

        spawned.sort();
        spawned
    }

    pub fn graph(&self) -> &DiGraph<TraceNode, usize> { &self.graph }

    /// Renders the trace in the graphviz dot format
    pub fn to_dot(&self) -> String { Dot::new(&self.graph).to_string() }
}
