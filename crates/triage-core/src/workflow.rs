//! Workflow - drives a single request through the graph.
//!
//! One run is a sequential chain of asynchronous steps: the initial
//! message is delivered to the start executor, every emission is routed
//! along matching edges (or through the source's switch group), and the
//! first yielded output completes the run. The engine never suspends
//! outside the executor invocation itself, so the only await points of a
//! run are the collaborator calls and their timeout wrapper.
//!
//! Multiple runs may execute concurrently against the same
//! `Arc<Workflow>`: executors are stateless closures over their
//! collaborators and each run owns its context exclusively.
//!
//! # Example
//!
//! ```rust,ignore
//! let workflow = Arc::new(Workflow::new(definition, registry));
//!
//! // Await the final output.
//! let report = workflow.run("No puedo acceder al servidor".to_string()).await?;
//! println!("{:?}", report.output);
//!
//! // Or consume the event stream.
//! let mut stream = workflow.clone().run_stream("¿Cuántos días de vacaciones?".to_string());
//! while let Some(event) = stream.next().await {
//!     println!("{event:?}");
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, instrument, warn};

use crate::builder::WorkflowDefinition;
use crate::context::RunContext;
use crate::executor::Executor;
use crate::types::{
    ExecutorError, ExecutorId, GraphError, GraphResult, RunFailure, RunId, RunState, WorkflowId,
};

// ============================================================================
// RUN CONFIGURATION
// ============================================================================

/// Per-run execution limits.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Upper bound on executor invocations per run; guards against a
    /// mis-built graph cycling forever.
    pub max_steps: u32,
    /// Deadline for a single executor invocation, external call included.
    /// Timing out fails the run; the engine never retries.
    pub step_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_steps: 32,
            step_timeout: Duration::from_secs(60),
        }
    }
}

impl RunConfig {
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = timeout;
        self
    }
}

// ============================================================================
// RUN EVENTS
// ============================================================================

/// Events emitted on the observability stream: one started/completed (or
/// failed) pair per executor invocation, one `Output` carrying the yielded
/// result, then a final `Completed` or `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RunEvent {
    Started {
        run_id: RunId,
        workflow_id: WorkflowId,
        timestamp: DateTime<Utc>,
    },
    ExecutorStarted {
        executor_id: ExecutorId,
        payload: serde_json::Value,
    },
    ExecutorCompleted {
        executor_id: ExecutorId,
        duration_ms: u64,
    },
    ExecutorFailed {
        executor_id: ExecutorId,
        error: String,
    },
    /// The terminal output yielded by an executor.
    Output {
        executor_id: ExecutorId,
        data: serde_json::Value,
    },
    Completed {
        duration_ms: u64,
        steps: u32,
    },
    Failed {
        failure: RunFailure,
        duration_ms: u64,
    },
}

// ============================================================================
// RUN REPORT
// ============================================================================

/// Outcome of one run: the yielded output on success, a structured
/// failure otherwise, plus the sequence of executors actually visited.
#[derive(Debug)]
pub struct RunReport<TOutput> {
    pub run_id: RunId,
    pub workflow_id: WorkflowId,
    pub state: RunState,
    pub output: Option<TOutput>,
    pub failure: Option<RunFailure>,
    /// Executors in invocation order along the path actually taken.
    pub visited: Vec<ExecutorId>,
    pub steps: u32,
    pub duration_ms: u64,
}

impl<TOutput> RunReport<TOutput> {
    pub fn is_success(&self) -> bool {
        self.state == RunState::Completed
    }

    /// Consume the report, returning the output or the structured failure.
    pub fn into_output(self) -> Result<TOutput, RunFailure> {
        match (self.output, self.failure) {
            (Some(output), _) => Ok(output),
            (None, Some(failure)) => Err(failure),
            (None, None) => Err(RunFailure {
                kind: crate::types::FailureKind::Structural,
                executor: None,
                message: "run produced no output".into(),
            }),
        }
    }
}

// ============================================================================
// EXECUTOR REGISTRY
// ============================================================================

/// Type-erased executor, invokable with a serialized payload.
#[async_trait]
pub trait DynExecutor<TMessage, TOutput>: Send + Sync
where
    TMessage: Send + Sync,
    TOutput: Send + Sync,
{
    fn id(&self) -> &ExecutorId;

    async fn handle_dyn(
        &self,
        input: serde_json::Value,
        ctx: &mut RunContext<TMessage, TOutput>,
    ) -> Result<(), ExecutorError>;
}

/// Maps executor ids to their implementations for one workflow.
pub struct ExecutorRegistry<TMessage, TOutput>
where
    TMessage: Serialize + DeserializeOwned + Send + Sync + 'static,
    TOutput: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    executors: HashMap<ExecutorId, Arc<dyn DynExecutor<TMessage, TOutput>>>,
}

impl<TMessage, TOutput> Default for ExecutorRegistry<TMessage, TOutput>
where
    TMessage: Serialize + DeserializeOwned + Send + Sync + 'static,
    TOutput: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<TMessage, TOutput> ExecutorRegistry<TMessage, TOutput>
where
    TMessage: Serialize + DeserializeOwned + Send + Sync + 'static,
    TOutput: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor under its own id.
    pub fn register<E>(&mut self, executor: E)
    where
        E: Executor<Message = TMessage, Output = TOutput> + 'static,
    {
        let id = executor.id().clone();
        self.executors
            .insert(id, Arc::new(ExecutorWrapper { executor }));
    }

    pub fn get(&self, id: &ExecutorId) -> Option<&Arc<dyn DynExecutor<TMessage, TOutput>>> {
        self.executors.get(id)
    }

    pub fn contains(&self, id: &ExecutorId) -> bool {
        self.executors.contains_key(id)
    }
}

/// Adapts a typed [`Executor`] to the type-erased registry interface: the
/// serialized payload is re-typed into the executor's own `Input`.
struct ExecutorWrapper<E: Executor> {
    executor: E,
}

#[async_trait]
impl<E, TMessage, TOutput> DynExecutor<TMessage, TOutput> for ExecutorWrapper<E>
where
    E: Executor<Message = TMessage, Output = TOutput>,
    TMessage: Serialize + DeserializeOwned + Send + Sync,
    TOutput: Serialize + DeserializeOwned + Send + Sync,
{
    fn id(&self) -> &ExecutorId {
        self.executor.id()
    }

    async fn handle_dyn(
        &self,
        input: serde_json::Value,
        ctx: &mut RunContext<TMessage, TOutput>,
    ) -> Result<(), ExecutorError> {
        let typed_input: E::Input = serde_json::from_value(input).map_err(|e| {
            ExecutorError::new(
                self.executor.id().clone(),
                format!("failed to deserialize input: {e}"),
            )
        })?;
        self.executor.handle(typed_input, ctx).await
    }
}

// ============================================================================
// WORKFLOW
// ============================================================================

/// A validated graph plus the executors that implement its nodes.
pub struct Workflow<TMessage, TOutput>
where
    TMessage: Serialize + DeserializeOwned + Send + Sync + 'static,
    TOutput: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    definition: WorkflowDefinition<TMessage>,
    registry: ExecutorRegistry<TMessage, TOutput>,
    config: RunConfig,
}

impl<TMessage, TOutput> Workflow<TMessage, TOutput>
where
    TMessage: Serialize + DeserializeOwned + Send + Sync + 'static,
    TOutput: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(
        definition: WorkflowDefinition<TMessage>,
        registry: ExecutorRegistry<TMessage, TOutput>,
    ) -> Self {
        Self {
            definition,
            registry,
            config: RunConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunConfig) -> Self {
        self.config = config;
        self
    }

    pub fn definition(&self) -> &WorkflowDefinition<TMessage> {
        &self.definition
    }

    pub fn id(&self) -> &WorkflowId {
        self.definition.id()
    }

    // ========================================================================
    // RUN (await completion)
    // ========================================================================

    /// Drive one input through the graph and await the final output.
    #[instrument(skip(self, input), fields(workflow = %self.definition.id()))]
    pub async fn run<TInput>(&self, input: TInput) -> GraphResult<RunReport<TOutput>>
    where
        TInput: Serialize + Send,
    {
        let run_id = RunId::generate();
        let input_json = serde_json::to_value(&input)
            .map_err(|e| GraphError::Serialization(format!("failed to serialize input: {e}")))?;
        self.drive(run_id, input_json, None).await
    }

    // ========================================================================
    // RUN_STREAM (observe while running)
    // ========================================================================

    /// Drive one input through the graph, streaming one event per executor
    /// invocation and a final output event.
    ///
    /// The stream is finite, single-consumer and not restartable; dropping
    /// it cancels the underlying run at its next event boundary.
    pub fn run_stream<TInput>(self: Arc<Self>, input: TInput) -> ReceiverStream<RunEvent>
    where
        TInput: Serialize + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            let run_id = RunId::generate();
            let input_json = match serde_json::to_value(&input) {
                Ok(json) => json,
                Err(e) => {
                    let failure = RunFailure::from_error(&GraphError::Serialization(format!(
                        "failed to serialize input: {e}"
                    )));
                    let _ = tx
                        .send(RunEvent::Failed {
                            failure,
                            duration_ms: 0,
                        })
                        .await;
                    return;
                }
            };

            match self.drive(run_id.clone(), input_json, Some(&tx)).await {
                Ok(_) => {}
                Err(GraphError::Cancelled) => {
                    debug!(run_id = %run_id, "event consumer dropped; run cancelled");
                }
                Err(e) => {
                    // drive() reports run failures through events; anything
                    // surfacing here is an engine-level defect.
                    error!(run_id = %run_id, error = %e, "run aborted");
                }
            }
        });

        ReceiverStream::new(rx)
    }

    // ========================================================================
    // EXECUTION LOOP
    // ========================================================================

    async fn emit(
        events: Option<&mpsc::Sender<RunEvent>>,
        event: RunEvent,
    ) -> GraphResult<()> {
        if let Some(tx) = events {
            tx.send(event).await.map_err(|_| GraphError::Cancelled)?;
        }
        Ok(())
    }

    /// The per-run state machine: `Pending → Running → {Completed, Failed}`.
    async fn drive(
        &self,
        run_id: RunId,
        input: serde_json::Value,
        events: Option<&mpsc::Sender<RunEvent>>,
    ) -> GraphResult<RunReport<TOutput>> {
        let started_at = Instant::now();
        let mut visited: Vec<ExecutorId> = Vec::new();
        let mut steps: u32 = 0;
        let mut output: Option<TOutput> = None;

        debug!(run_id = %run_id, state = %RunState::Running, "run started");
        Self::emit(
            events,
            RunEvent::Started {
                run_id: run_id.clone(),
                workflow_id: self.definition.id().clone(),
                timestamp: Utc::now(),
            },
        )
        .await?;

        let mut queue: VecDeque<(ExecutorId, serde_json::Value)> = VecDeque::new();
        queue.push_back((self.definition.start().clone(), input));

        let run_error: Option<GraphError> = loop {
            let Some((executor_id, payload)) = queue.pop_front() else {
                break None;
            };

            steps += 1;
            if steps > self.config.max_steps {
                break Some(GraphError::Structural(format!(
                    "step budget of {} exceeded",
                    self.config.max_steps
                )));
            }

            Self::emit(
                events,
                RunEvent::ExecutorStarted {
                    executor_id: executor_id.clone(),
                    payload: payload.clone(),
                },
            )
            .await?;

            let Some(executor) = self.registry.get(&executor_id) else {
                Self::emit(
                    events,
                    RunEvent::ExecutorFailed {
                        executor_id: executor_id.clone(),
                        error: "executor not registered".into(),
                    },
                )
                .await?;
                break Some(GraphError::ExecutorNotFound(executor_id));
            };

            let mut ctx = RunContext::new(run_id.clone(), executor_id.clone());
            let invocation_start = Instant::now();
            let outcome = tokio::time::timeout(
                self.config.step_timeout,
                executor.handle_dyn(payload, &mut ctx),
            )
            .await;

            let handled = match outcome {
                Ok(handled) => handled,
                Err(_) => {
                    Self::emit(
                        events,
                        RunEvent::ExecutorFailed {
                            executor_id: executor_id.clone(),
                            error: "invocation timed out".into(),
                        },
                    )
                    .await?;
                    break Some(GraphError::Timeout(executor_id));
                }
            };
            if let Err(err) = handled {
                Self::emit(
                    events,
                    RunEvent::ExecutorFailed {
                        executor_id: executor_id.clone(),
                        error: err.message.clone(),
                    },
                )
                .await?;
                break Some(GraphError::Collaborator {
                    executor: executor_id,
                    message: err.message,
                });
            }

            visited.push(executor_id.clone());
            Self::emit(
                events,
                RunEvent::ExecutorCompleted {
                    executor_id: executor_id.clone(),
                    duration_ms: invocation_start.elapsed().as_millis() as u64,
                },
            )
            .await?;

            let mut messages = ctx.take_messages();
            let mut outputs = ctx.take_outputs();

            // Contract: at most one emit or one yield per invocation.
            if !messages.is_empty() && !outputs.is_empty() {
                break Some(GraphError::Structural(format!(
                    "executor '{executor_id}' both emitted and yielded in one invocation"
                )));
            }

            if !outputs.is_empty() {
                if outputs.len() > 1 {
                    warn!(
                        run_id = %run_id,
                        executor = %executor_id,
                        count = outputs.len(),
                        "executor yielded more than once; keeping the first output"
                    );
                }
                outputs.truncate(1);
                let first = match outputs.pop() {
                    Some(first) => first,
                    None => break Some(GraphError::Structural("output vanished".into())),
                };
                if output.is_none() {
                    let data = match serde_json::to_value(&first) {
                        Ok(data) => data,
                        Err(e) => {
                            break Some(GraphError::Serialization(format!(
                                "failed to serialize output of '{executor_id}': {e}"
                            )))
                        }
                    };
                    Self::emit(
                        events,
                        RunEvent::Output {
                            executor_id: executor_id.clone(),
                            data,
                        },
                    )
                    .await?;
                    output = Some(first);
                } else {
                    warn!(
                        run_id = %run_id,
                        executor = %executor_id,
                        "output already recorded for this run; keeping the first"
                    );
                }
                // Yielding ends this path.
                continue;
            }

            if messages.len() > 1 {
                break Some(GraphError::Structural(format!(
                    "executor '{executor_id}' emitted more than one message"
                )));
            }
            let Some(message) = messages.pop() else {
                // Neither emitted nor yielded: a dead end.
                break Some(GraphError::Structural(format!(
                    "dead end: executor '{executor_id}' neither emitted nor yielded"
                )));
            };

            // Resolve destinations: plain edges, or the switch group's
            // single selected target. Both at once is re-checked here even
            // though build() already rejects it.
            let plain = self.definition.edges().plain_from(&executor_id);
            let group = self.definition.edges().group_from(&executor_id);
            let targets: Vec<ExecutorId> = match group {
                Some(_) if !plain.is_empty() => {
                    break Some(GraphError::Structural(format!(
                        "executor '{executor_id}' sources both a plain edge and a switch group"
                    )))
                }
                Some(group) => {
                    let target = group.select(&message).clone();
                    debug!(run_id = %run_id, source = %executor_id, target = %target, "switch selected");
                    vec![target]
                }
                None => plain.iter().map(|e| e.target.clone()).collect(),
            };

            if targets.is_empty() {
                break Some(GraphError::Structural(format!(
                    "executor '{executor_id}' emitted with no matching destination"
                )));
            }

            let message_json = match serde_json::to_value(&message) {
                Ok(json) => json,
                Err(e) => {
                    break Some(GraphError::Serialization(format!(
                        "failed to serialize message from '{executor_id}': {e}"
                    )))
                }
            };
            for target in targets {
                queue.push_back((target, message_json.clone()));
            }
        };

        let duration_ms = started_at.elapsed().as_millis() as u64;

        let failure = match run_error {
            Some(err) => Some(RunFailure::from_error(&err)),
            None if output.is_none() => Some(RunFailure::from_error(&GraphError::Structural(
                "run finished without yielding an output".into(),
            ))),
            None => None,
        };

        match failure {
            Some(failure) => {
                error!(run_id = %run_id, %failure, "run failed");
                Self::emit(
                    events,
                    RunEvent::Failed {
                        failure: failure.clone(),
                        duration_ms,
                    },
                )
                .await?;
                Ok(RunReport {
                    run_id,
                    workflow_id: self.definition.id().clone(),
                    state: RunState::Failed,
                    output,
                    failure: Some(failure),
                    visited,
                    steps,
                    duration_ms,
                })
            }
            None => {
                info!(run_id = %run_id, steps, duration_ms, "run completed");
                Self::emit(events, RunEvent::Completed { duration_ms, steps }).await?;
                Ok(RunReport {
                    run_id,
                    workflow_id: self.definition.id().clone(),
                    state: RunState::Completed,
                    output,
                    failure: None,
                    visited,
                    steps,
                    duration_ms,
                })
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
