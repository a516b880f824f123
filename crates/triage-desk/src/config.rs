//! Environment-backed configuration for the support desk.

use thiserror::Error;

const ENV_ENDPOINT: &str = "AZURE_AI_PROJECT_ENDPOINT";
const ENV_DEPLOYMENT: &str = "AZURE_AI_MODEL_DEPLOYMENT_NAME";
const ENV_API_KEY: &str = "AZURE_OPENAI_API_KEY";
const ENV_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";

const DEFAULT_API_VERSION: &str = "2024-10-21";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Azure OpenAI connection settings.
#[derive(Debug, Clone)]
pub struct DeskConfig {
    pub endpoint: String,
    pub deployment: String,
    pub api_key: String,
    pub api_version: String,
}

impl DeskConfig {
    /// Load from the environment, reading a `.env` file first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            endpoint: require(ENV_ENDPOINT)?,
            deployment: require(ENV_DEPLOYMENT)?,
            api_key: require(ENV_API_KEY)?,
            api_version: std::env::var(ENV_API_VERSION)
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_var_names_the_variable() {
        let err = ConfigError::MissingVar(ENV_API_KEY);
        assert!(err.to_string().contains("AZURE_OPENAI_API_KEY"));
    }
}
