//! Provider-agnostic chat completion interface.
//!
//! Agents depend on [`ChatClient`] rather than a concrete provider, so
//! tests substitute a scripted client and production wires in Azure
//! OpenAI. One call is one system/user exchange returning the assistant's
//! text; conversation state, retries and tool use live above this trait.

use async_trait::async_trait;

use crate::error::LlmError;

/// A chat completion backend.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// The model or deployment name answering the calls.
    fn model(&self) -> &str;

    /// Send one system/user exchange and return the assistant's text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}
