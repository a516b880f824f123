//! WorkflowBuilder - fluent construction and build-time validation of the
//! workflow graph.
//!
//! Graph invariants are checked once, in [`WorkflowBuilder::build`], and a
//! run is never started on an invalid graph:
//!
//! - a start executor is set and present,
//! - every edge and switch-group endpoint references a declared executor,
//! - every non-start executor is reachable from the start,
//! - no executor sources both a plain edge and a switch group,
//! - at most one switch group per source.
//!
//! A switch group without a default target is unrepresentable (the
//! constructor requires one), so the unmatched-case failure mode cannot
//! exist past build time.
//!
//! # Example
//!
//! ```rust,ignore
//! let definition = WorkflowBuilder::<TicketMessage>::new("support-triage")
//!     .set_start("store_input")
//!     .add_executor_id("classify")
//!     .add_edge("store_input", "classify")
//!     .add_switch_group(SwitchGroup::new("classify", cases, "generic_fallback"))
//!     .build()?;
//! ```

use std::collections::HashSet;

use crate::edge::{Edge, EdgeSet, SwitchGroup};
use crate::types::{ExecutorId, GraphError, GraphResult, WorkflowId};

// ============================================================================
// WORKFLOW DEFINITION
// ============================================================================

/// The immutable, validated topology of a workflow: executors, one start
/// executor, plain edges and switch groups.
#[derive(Debug)]
pub struct WorkflowDefinition<T> {
    id: WorkflowId,
    start: ExecutorId,
    executors: Vec<ExecutorId>,
    edges: EdgeSet<T>,
}

impl<T> WorkflowDefinition<T> {
    pub fn id(&self) -> &WorkflowId {
        &self.id
    }

    pub fn start(&self) -> &ExecutorId {
        &self.start
    }

    /// Executor ids in declaration order.
    pub fn executors(&self) -> &[ExecutorId] {
        &self.executors
    }

    pub fn edges(&self) -> &EdgeSet<T> {
        &self.edges
    }

    pub fn has_executor(&self, id: &ExecutorId) -> bool {
        self.executors.contains(id)
    }

    /// Terminal executors are exactly those with no outgoing connection;
    /// they end a path by yielding output.
    pub fn is_terminal(&self, id: &ExecutorId) -> bool {
        !self.edges.has_outgoing(id)
    }

    pub fn terminal_executors(&self) -> Vec<&ExecutorId> {
        self.executors
            .iter()
            .filter(|id| self.is_terminal(id))
            .collect()
    }
}

// ============================================================================
// WORKFLOW BUILDER
// ============================================================================

/// Builder for workflow graphs.
///
/// `T` is the message type that flows along edges; switch-case predicates
/// inspect it to pick a branch.
pub struct WorkflowBuilder<T> {
    id: WorkflowId,
    start: Option<ExecutorId>,
    executors: Vec<ExecutorId>,
    edges: Vec<Edge>,
    groups: Vec<SwitchGroup<T>>,
}

impl<T> WorkflowBuilder<T> {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: WorkflowId::new(id),
            start: None,
            executors: Vec::new(),
            edges: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Set the starting executor; it receives the run's initial input.
    pub fn set_start(mut self, executor_id: impl Into<ExecutorId>) -> Self {
        let id = executor_id.into();
        self.declare(id.clone());
        self.start = Some(id);
        self
    }

    /// Declare an executor. Endpoints of edges and switch groups must be
    /// declared explicitly; unknown references fail `build()`.
    pub fn add_executor_id(mut self, executor_id: impl Into<ExecutorId>) -> Self {
        self.declare(executor_id.into());
        self
    }

    /// Add a plain edge; it fires on every emission of its source.
    pub fn add_edge(
        mut self,
        source: impl Into<ExecutorId>,
        target: impl Into<ExecutorId>,
    ) -> Self {
        self.edges.push(Edge::new(source, target));
        self
    }

    /// Add a switch-case group (ordered cases plus a mandatory default).
    pub fn add_switch_group(mut self, group: SwitchGroup<T>) -> Self {
        self.groups.push(group);
        self
    }

    fn declare(&mut self, id: ExecutorId) {
        if !self.executors.contains(&id) {
            self.executors.push(id);
        }
    }

    /// Validate the graph and produce the immutable definition.
    pub fn build(self) -> GraphResult<WorkflowDefinition<T>> {
        let start = self
            .start
            .ok_or_else(|| GraphError::Structural("start executor not set".into()))?;

        let known: HashSet<&ExecutorId> = self.executors.iter().collect();
        let check = |id: &ExecutorId, role: &str| -> GraphResult<()> {
            if known.contains(id) {
                Ok(())
            } else {
                Err(GraphError::Structural(format!(
                    "{role} references undeclared executor '{id}'"
                )))
            }
        };

        for edge in &self.edges {
            check(&edge.source, "edge source")?;
            check(&edge.target, "edge target")?;
        }
        for group in &self.groups {
            check(group.source(), "switch group source")?;
            for target in group.targets() {
                check(target, "switch group target")?;
            }
        }

        // An executor may source plain edges or one switch group, never both.
        let mut edges = EdgeSet::new();
        for edge in self.edges {
            edges.add_edge(edge);
        }
        for group in self.groups {
            edges.add_group(group);
        }
        for id in &self.executors {
            if edges.group_count_from(id) > 1 {
                return Err(GraphError::Structural(format!(
                    "executor '{id}' sources more than one switch group"
                )));
            }
            if !edges.plain_from(id).is_empty() && edges.group_from(id).is_some() {
                return Err(GraphError::Structural(format!(
                    "executor '{id}' sources both a plain edge and a switch group"
                )));
            }
        }

        // Every non-start executor must be reachable from the start.
        let reachable = compute_reachable(&start, &edges);
        let unreachable: Vec<&str> = self
            .executors
            .iter()
            .filter(|id| !reachable.contains(*id))
            .map(ExecutorId::as_str)
            .collect();
        if !unreachable.is_empty() {
            return Err(GraphError::Structural(format!(
                "executors unreachable from start: {unreachable:?}"
            )));
        }

        Ok(WorkflowDefinition {
            id: self.id,
            start,
            executors: self.executors,
            edges,
        })
    }
}

/// Breadth-first reachability over static successors (predicates ignored).
fn compute_reachable<T>(start: &ExecutorId, edges: &EdgeSet<T>) -> HashSet<ExecutorId> {
    let mut reachable = HashSet::new();
    let mut queue = vec![start.clone()];

    while let Some(current) = queue.pop() {
        if !reachable.insert(current.clone()) {
            continue;
        }
        for successor in edges.static_successors(&current) {
            if !reachable.contains(successor) {
                queue.push(successor.clone());
            }
        }
    }

    reachable
}

// ============================================================================
// TESTS
// ============================================================================
