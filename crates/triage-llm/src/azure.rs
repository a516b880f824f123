//! Azure OpenAI implementation of [`ChatClient`].

use async_openai::config::AzureConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::error::LlmError;
use crate::traits::ChatClient;

/// Chat client backed by an Azure OpenAI deployment.
pub struct AzureOpenAiClient {
    client: Client<AzureConfig>,
    deployment: String,
    temperature: f32,
}

impl AzureOpenAiClient {
    /// Build a client for one deployment. `endpoint` is the resource URL,
    /// `deployment` the model deployment name inside it.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        let deployment = deployment.into();
        let config = AzureConfig::new()
            .with_api_base(endpoint)
            .with_api_key(api_key)
            .with_deployment_id(deployment.clone())
            .with_api_version(api_version);

        Self {
            client: Client::with_config(config),
            deployment,
            temperature: 0.2,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl ChatClient for AzureOpenAiClient {
    fn model(&self) -> &str {
        &self.deployment
    }

    #[instrument(skip(self, system, user), fields(deployment = %self.deployment))]
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.deployment.as_str())
            .temperature(self.temperature)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        debug!(chars = content.len(), "completion received");
        Ok(content)
    }
}
