//! IT branch: diagnosis followed by resolution.

use std::sync::Arc;
use tracing::debug;

use triage_llm::{ChatClient, LlmError};

const DIAGNOSE_INSTRUCTIONS: &str = "Eres un especialista técnico en diagnóstico de problemas IT. \
    Tu trabajo es analizar problemas técnicos y describir la posible causa raíz. \
    Menciona qué logs, datos o información adicional serían necesarios para investigar. \
    Sé conciso pero preciso en tu análisis.";

const RESOLVE_INSTRUCTIONS: &str = "Eres un especialista técnico en resolución de problemas IT. \
    Basándote en el diagnóstico previo, proporciona pasos concretos y seguros \
    para resolver el problema. Genera una lista numerada de acciones claras. \
    Prioriza soluciones que no comprometan la seguridad o estabilidad del sistema.";

/// First IT stage: name the likely root cause and what to look at next.
pub struct ItDiagnoseService {
    client: Arc<dyn ChatClient>,
}

impl ItDiagnoseService {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    pub async fn diagnose(&self, user_input: &str) -> Result<String, LlmError> {
        let prompt = format!("Problema: {user_input}\n\nDiagnóstico:");
        let response = self.client.complete(DIAGNOSE_INSTRUCTIONS, &prompt).await?;
        debug!(chars = response.len(), "diagnosis produced");
        Ok(response.trim().to_string())
    }
}

/// Second IT stage: turn the diagnosis into concrete numbered steps.
pub struct ItResolveService {
    client: Arc<dyn ChatClient>,
}

impl ItResolveService {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    pub async fn resolve(&self, diagnostic: &str, user_input: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "Descripción del usuario: {user_input}\n\
             Diagnóstico previo: {diagnostic}\n\n\
             Solución propuesta:"
        );
        let response = self.client.complete(RESOLVE_INSTRUCTIONS, &prompt).await?;
        debug!(chars = response.len(), "resolution produced");
        Ok(response.trim().to_string())
    }
}
