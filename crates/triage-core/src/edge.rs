//! Edges and switch-case groups - connections between executors.
//!
//! Two connection kinds exist:
//!
//! ```text
//! 1. Plain edge     A ──────────────────▶ B        (always fires)
//! 2. Switch group   A ── case 0 ────┬───▶ B
//!                      ── case 1 ───┼───▶ C        (first match wins)
//!                      ── default ──┴───▶ D        (mandatory)
//! ```
//!
//! A switch group evaluates its cases strictly in declared order and
//! short-circuits on the first predicate that returns true; if none match
//! the default target fires. Predicates must be pure; a panicking
//! predicate is logged and treated as false for that case.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

use crate::types::ExecutorId;

/// A predicate over the message, deciding whether a case fires.
pub type CasePredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

// ============================================================================
// PLAIN EDGE
// ============================================================================

/// A directed connection that always fires when the source emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source: ExecutorId,
    pub target: ExecutorId,
}

impl Edge {
    pub fn new(source: impl Into<ExecutorId>, target: impl Into<ExecutorId>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

// ============================================================================
// SWITCH CASE
// ============================================================================

/// One conditional arm of a switch group.
pub struct SwitchCase<T> {
    predicate: CasePredicate<T>,
    target: ExecutorId,
    label: Option<String>,
}

impl<T> SwitchCase<T> {
    pub fn new<F>(target: impl Into<ExecutorId>, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            target: target.into(),
            label: None,
        }
    }

    /// Attach a human-readable label (used in logs and diagram export).
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn target(&self) -> &ExecutorId {
        &self.target
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Evaluate the predicate. A panic inside the predicate is treated as
    /// a non-match and logged; it never aborts the run.
    pub fn matches(&self, message: &T) -> bool {
        match catch_unwind(AssertUnwindSafe(|| (self.predicate)(message))) {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    target = %self.target,
                    label = self.label.as_deref().unwrap_or("<unlabelled>"),
                    "switch case predicate panicked; treating as false"
                );
                false
            }
        }
    }
}

impl<T> fmt::Debug for SwitchCase<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchCase")
            .field("target", &self.target)
            .field("label", &self.label)
            .finish()
    }
}

// ============================================================================
// SWITCH GROUP
// ============================================================================

/// An ordered set of mutually exclusive conditional edges plus exactly one
/// default target. The default is mandatory at the type level, so a group
/// without one cannot be constructed.
pub struct SwitchGroup<T> {
    source: ExecutorId,
    cases: Vec<SwitchCase<T>>,
    default: ExecutorId,
}

impl<T> SwitchGroup<T> {
    pub fn new(
        source: impl Into<ExecutorId>,
        cases: Vec<SwitchCase<T>>,
        default: impl Into<ExecutorId>,
    ) -> Self {
        Self {
            source: source.into(),
            cases,
            default: default.into(),
        }
    }

    pub fn source(&self) -> &ExecutorId {
        &self.source
    }

    pub fn cases(&self) -> &[SwitchCase<T>] {
        &self.cases
    }

    pub fn default_target(&self) -> &ExecutorId {
        &self.default
    }

    /// All targets of the group, cases first, default last.
    pub fn targets(&self) -> impl Iterator<Item = &ExecutorId> {
        self.cases
            .iter()
            .map(SwitchCase::target)
            .chain(std::iter::once(&self.default))
    }

    /// Select the single target for a message: first matching case in
    /// declared order, or the default.
    pub fn select(&self, message: &T) -> &ExecutorId {
        self.cases
            .iter()
            .find(|case| case.matches(message))
            .map_or(&self.default, SwitchCase::target)
    }
}

impl<T> fmt::Debug for SwitchGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchGroup")
            .field("source", &self.source)
            .field("cases", &self.cases)
            .field("default", &self.default)
            .finish()
    }
}

// ============================================================================
// EDGE SET
// ============================================================================

/// All connections of a workflow graph.
#[derive(Debug)]
pub struct EdgeSet<T> {
    edges: Vec<Edge>,
    groups: Vec<SwitchGroup<T>>,
}

impl<T> Default for EdgeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EdgeSet<T> {
    pub fn new() -> Self {
        Self {
            edges: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn add_group(&mut self, group: SwitchGroup<T>) {
        self.groups.push(group);
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn groups(&self) -> &[SwitchGroup<T>] {
        &self.groups
    }

    /// Plain edges originating from an executor, in declared order.
    pub fn plain_from(&self, source: &ExecutorId) -> Vec<&Edge> {
        self.edges.iter().filter(|e| &e.source == source).collect()
    }

    /// The switch group sourced at an executor, if any.
    pub fn group_from(&self, source: &ExecutorId) -> Option<&SwitchGroup<T>> {
        self.groups.iter().find(|g| g.source() == source)
    }

    /// Number of switch groups sourced at an executor.
    pub fn group_count_from(&self, source: &ExecutorId) -> usize {
        self.groups.iter().filter(|g| g.source() == source).count()
    }

    /// All statically possible successors of an executor (used for
    /// reachability analysis, ignoring predicates).
    pub fn static_successors(&self, source: &ExecutorId) -> Vec<&ExecutorId> {
        let mut successors: Vec<&ExecutorId> = self
            .plain_from(source)
            .into_iter()
            .map(|e| &e.target)
            .collect();
        if let Some(group) = self.group_from(source) {
            successors.extend(group.targets());
        }
        successors
    }

    /// Whether an executor has any outgoing connection.
    pub fn has_outgoing(&self, source: &ExecutorId) -> bool {
        !self.plain_from(source).is_empty() || self.group_from(source).is_some()
    }
}

// ============================================================================
// TESTS
// ============================================================================
