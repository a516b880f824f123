//! Core identifiers, errors and run states for the workflow engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Unique identifier for an executor node in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutorId(String);

impl ExecutorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ExecutorId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ExecutorId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Unique identifier for a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkflowId(String);

impl WorkflowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one execution of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("run-{}", uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// RUN STATE
// ============================================================================

/// Lifecycle of a single run: `Pending → Running → {Completed, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Pending => write!(f, "pending"),
            RunState::Running => write!(f, "running"),
            RunState::Completed => write!(f, "completed"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Engine-level errors.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A graph invariant was violated, at build time or at run time
    /// (dead end, missing destination, dual edge/switch source, ...).
    #[error("structural error: {0}")]
    Structural(String),

    /// An executor referenced by the graph is missing from the registry.
    #[error("executor not found: {0}")]
    ExecutorNotFound(ExecutorId),

    /// An external collaborator call failed inside an executor.
    #[error("collaborator error in '{executor}': {message}")]
    Collaborator {
        executor: ExecutorId,
        message: String,
    },

    /// An executor invocation exceeded its deadline.
    #[error("executor '{0}' timed out")]
    Timeout(ExecutorId),

    /// A message or output could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The event consumer went away; the run was cancelled.
    #[error("run cancelled")]
    Cancelled,
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Classification of a run failure, surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Collaborator,
    Timeout,
    Structural,
}

/// Structured description of why a run failed: kind, offending executor
/// (when one can be named) and a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFailure {
    pub kind: FailureKind,
    pub executor: Option<ExecutorId>,
    pub message: String,
}

impl RunFailure {
    pub fn from_error(error: &GraphError) -> Self {
        match error {
            GraphError::Collaborator { executor, message } => Self {
                kind: FailureKind::Collaborator,
                executor: Some(executor.clone()),
                message: message.clone(),
            },
            GraphError::Timeout(executor) => Self {
                kind: FailureKind::Timeout,
                executor: Some(executor.clone()),
                message: "executor invocation timed out".into(),
            },
            GraphError::ExecutorNotFound(executor) => Self {
                kind: FailureKind::Structural,
                executor: Some(executor.clone()),
                message: "executor not registered".into(),
            },
            other => Self {
                kind: FailureKind::Structural,
                executor: None,
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.executor {
            Some(id) => write!(f, "{:?} in '{}': {}", self.kind, id, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

/// Error returned by an executor handler.
///
/// Collaborator failures are caught at the executor boundary and wrapped
/// here with the executor's name attached; the engine turns them into a
/// failed run without retrying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorError {
    pub executor_id: ExecutorId,
    pub message: String,
}

impl ExecutorError {
    pub fn new(executor_id: impl Into<ExecutorId>, message: impl Into<String>) -> Self {
        Self {
            executor_id: executor_id.into(),
            message: message.into(),
        }
    }

    /// Wrap a failed external call.
    pub fn collaborator(
        executor_id: impl Into<ExecutorId>,
        error: impl fmt::Display,
    ) -> Self {
        Self::new(executor_id, error.to_string())
    }

    /// An executor-internal error (bad input shape, serialization, ...).
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal", message)
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.executor_id, self.message)
    }
}

impl std::error::Error for ExecutorError {}

// ============================================================================
// TESTS
// ============================================================================
