//! # triage-core
//!
//! Directed-graph workflow engine for request triage pipelines.
//!
//! A workflow is a validated directed graph of named [`Executor`]s. Plain
//! edges always forward an emitted message; switch-case groups route it to
//! the first matching case or to a mandatory default. Running a workflow
//! drives one input along a single path until an executor yields the run's
//! output, and can optionally be observed through a finite event stream.
//!
//! ```rust,ignore
//! let definition = WorkflowBuilder::new("support-triage")
//!     .set_start("store_input")
//!     .add_executor_id("classify")
//!     .add_edge("store_input", "classify")
//!     .add_switch_group(SwitchGroup::new("classify", cases, "generic_fallback"))
//!     .build()?;
//!
//! let mut registry = ExecutorRegistry::new();
//! registry.register(StoreInput::new());
//! // ...
//!
//! let workflow = Workflow::new(definition, registry);
//! let report = workflow.run(query).await?;
//! ```

mod builder;
mod context;
mod edge;
mod executor;
mod types;
mod workflow;

pub use builder::{WorkflowBuilder, WorkflowDefinition};
pub use context::RunContext;
pub use edge::{CasePredicate, Edge, EdgeSet, SwitchCase, SwitchGroup};
pub use executor::{Executor, ExecutorContext};
pub use types::{
    ExecutorError, ExecutorId, FailureKind, GraphError, GraphResult, RunFailure, RunId, RunState,
    WorkflowId,
};
pub use workflow::{
    DynExecutor, ExecutorRegistry, RunConfig, RunEvent, RunReport, Workflow,
};
