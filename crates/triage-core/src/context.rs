//! RunContext - concrete [`ExecutorContext`] owned by a single run.
//!
//! One context is created per executor invocation and dropped right after
//! the engine drains it, so no state is shared between runs. The context
//! only collects; the engine enforces the one-emit-or-one-yield contract
//! after the invocation returns.

use async_trait::async_trait;

use crate::executor::ExecutorContext;
use crate::types::{ExecutorError, ExecutorId, RunId};

/// Collects the messages and outputs produced by one executor invocation.
pub struct RunContext<TMessage, TOutput>
where
    TMessage: Send,
    TOutput: Send,
{
    run_id: RunId,
    executor_id: ExecutorId,
    messages: Vec<TMessage>,
    outputs: Vec<TOutput>,
}

impl<TMessage, TOutput> RunContext<TMessage, TOutput>
where
    TMessage: Send,
    TOutput: Send,
{
    pub fn new(run_id: RunId, executor_id: ExecutorId) -> Self {
        Self {
            run_id,
            executor_id,
            messages: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn executor_id(&self) -> &ExecutorId {
        &self.executor_id
    }

    /// Take the messages emitted during the invocation.
    pub fn take_messages(&mut self) -> Vec<TMessage> {
        std::mem::take(&mut self.messages)
    }

    /// Take the outputs yielded during the invocation.
    pub fn take_outputs(&mut self) -> Vec<TOutput> {
        std::mem::take(&mut self.outputs)
    }

    pub fn has_messages(&self) -> bool {
        !self.messages.is_empty()
    }

    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }
}

#[async_trait]
impl<TMessage, TOutput> ExecutorContext<TMessage, TOutput> for RunContext<TMessage, TOutput>
where
    TMessage: Send + Sync,
    TOutput: Send + Sync,
{
    async fn send_message(&mut self, message: TMessage) -> Result<(), ExecutorError> {
        self.messages.push(message);
        Ok(())
    }

    async fn yield_output(&mut self, output: TOutput) -> Result<(), ExecutorError> {
        self.outputs.push(output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collects_emitted_message() {
        let mut ctx: RunContext<String, String> =
            RunContext::new(RunId::new("run-test"), ExecutorId::new("store_input"));

        ctx.send_message("hola".to_string()).await.unwrap();

        assert!(ctx.has_messages());
        assert!(!ctx.has_outputs());
        assert_eq!(ctx.take_messages(), vec!["hola".to_string()]);
        assert!(!ctx.has_messages());
    }

    #[tokio::test]
    async fn collects_yielded_output() {
        let mut ctx: RunContext<String, String> =
            RunContext::new(RunId::new("run-test"), ExecutorId::new("hr_handle"));

        ctx.yield_output("respuesta".to_string()).await.unwrap();

        assert!(ctx.has_outputs());
        assert_eq!(ctx.take_outputs(), vec!["respuesta".to_string()]);
    }
}
