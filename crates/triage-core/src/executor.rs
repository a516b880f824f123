//! Executor trait - the unit of work in the workflow graph.
//!
//! An executor consumes one typed input message and communicates through
//! its context: `send_message` forwards a message to the next stage,
//! `yield_output` terminates the path with the run's result. Per
//! invocation an executor makes at most one of the two calls; the engine
//! treats an invocation that makes neither as a dead end.
//!
//! # Example
//!
//! ```rust,ignore
//! struct Classify {
//!     id: ExecutorId,
//!     router: Arc<RouterService>,
//! }
//!
//! #[async_trait]
//! impl Executor for Classify {
//!     type Input = String;
//!     type Message = TicketMessage;
//!     type Output = String;
//!
//!     fn id(&self) -> &ExecutorId { &self.id }
//!
//!     async fn handle<Ctx>(&self, input: Self::Input, ctx: &mut Ctx) -> Result<(), ExecutorError>
//!     where
//!         Ctx: ExecutorContext<Self::Message, Self::Output> + Send,
//!     {
//!         let classification = self.router.classify(&input).await
//!             .map_err(|e| ExecutorError::collaborator(self.id.clone(), e))?;
//!         ctx.send_message(TicketMessage::from(classification)).await
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::types::{ExecutorError, ExecutorId};

/// The core trait for all graph executors.
///
/// # Type Parameters
///
/// - `Input`: what this executor receives from the previous stage
/// - `Message`: what it may forward along edges (uniform per workflow)
/// - `Output`: what it may yield as the run's terminal result
///
/// Executors are stateless across runs: any collaborator they need is
/// captured at construction time behind an `Arc`, so concurrent runs on
/// the same graph are safe.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Input type accepted by this executor.
    type Input: Serialize + DeserializeOwned + Send + Sync;

    /// Message type forwarded to connected executors.
    type Message: Serialize + DeserializeOwned + Send + Sync;

    /// Output type visible to the workflow caller.
    type Output: Serialize + DeserializeOwned + Send + Sync;

    /// Unique identifier for this executor.
    fn id(&self) -> &ExecutorId;

    /// Process one input message.
    ///
    /// May await at most one external call, then either
    /// `ctx.send_message(..)` or `ctx.yield_output(..)` - never both.
    async fn handle<Ctx>(&self, input: Self::Input, ctx: &mut Ctx) -> Result<(), ExecutorError>
    where
        Ctx: ExecutorContext<Self::Message, Self::Output> + Send;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        self.id().as_str()
    }
}

/// Context handed to an executor for the duration of one invocation.
#[async_trait]
pub trait ExecutorContext<TMessage, TOutput>: Send + Sync
where
    TMessage: Send,
    TOutput: Send,
{
    /// Forward a message to the executor(s) connected by outgoing edges.
    async fn send_message(&mut self, message: TMessage) -> Result<(), ExecutorError>;

    /// Yield the run's terminal output, ending this path.
    async fn yield_output(&mut self, output: TOutput) -> Result<(), ExecutorError>;
}
