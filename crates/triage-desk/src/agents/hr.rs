//! HR branch.

use std::sync::Arc;
use tracing::debug;

use triage_llm::{ChatClient, LlmError};

const INSTRUCTIONS: &str = "Eres un asistente profesional de Recursos Humanos. \
    Responde de forma breve, clara y profesional a consultas sobre: \
    vacaciones, permisos, beneficios, políticas laborales, contratos, sueldos, etc. \
    Mantén un tono cordial pero formal.";

/// Answers HR queries in a single exchange.
pub struct HrService {
    client: Arc<dyn ChatClient>,
}

impl HrService {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    pub async fn handle(&self, user_input: &str) -> Result<String, LlmError> {
        let prompt = format!("Consulta: {user_input}\n\nRespuesta:");
        let response = self.client.complete(INSTRUCTIONS, &prompt).await?;
        debug!(chars = response.len(), "hr answer produced");
        Ok(response.trim().to_string())
    }
}
