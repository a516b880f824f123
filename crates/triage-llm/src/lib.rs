//! # triage-llm
//!
//! Thin LLM provider layer: the [`ChatClient`] trait plus an Azure OpenAI
//! implementation. Everything above (prompts, parsing, routing) lives in
//! the consuming crates.

mod azure;
mod error;
mod traits;

pub use azure::AzureOpenAiClient;
pub use error::LlmError;
pub use traits::ChatClient;
