//! Error types for LLM provider calls.

use async_openai::error::OpenAIError;
use thiserror::Error;

/// Failure modes of a chat completion call.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider rejected the request.
    #[error("api error: {0}")]
    Api(String),

    /// The request never reached the provider.
    #[error("connection error: {0}")]
    Connection(String),

    /// The credentials were rejected.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The provider throttled the request.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The provider answered with no usable content.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// The client was configured with invalid parameters.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<OpenAIError> for LlmError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Reqwest(e) => LlmError::Connection(e.to_string()),
            OpenAIError::ApiError(api) => {
                let message = api.message;
                if message.contains("API key") || message.contains("401") {
                    LlmError::Auth(message)
                } else if message.to_lowercase().contains("rate limit") {
                    LlmError::RateLimited(message)
                } else {
                    LlmError::Api(message)
                }
            }
            other => LlmError::Api(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = LlmError::Api("deployment not found".into());
        assert_eq!(err.to_string(), "api error: deployment not found");

        let err = LlmError::EmptyResponse;
        assert!(err.to_string().contains("empty response"));
    }
}
