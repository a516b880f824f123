//! Query classification.

use std::sync::Arc;
use tracing::{debug, warn};

use triage_llm::{ChatClient, LlmError};

use crate::model::{Classification, CATEGORY_HR, CATEGORY_IT, CATEGORY_OTHER};

const INSTRUCTIONS: &str = "Eres un clasificador de consultas empresariales. \
    Analiza el mensaje del usuario y determina si es una consulta técnica (IT), \
    de recursos humanos (HR) o de otro tipo. \
    Responde SIEMPRE en formato JSON con los campos: \
    tipo (it|hr|other), confidence (0-1) y details (breve explicación). \
    Ejemplo: {\"tipo\":\"it\",\"confidence\":0.95,\"details\":\"problema de acceso al servidor\"}";

const IT_KEYWORDS: &[&str] = &["error", "login", "servidor", "pantalla", "crash", "bug"];
const HR_KEYWORDS: &[&str] = &[
    "vacaciones",
    "permiso",
    "sueldo",
    "contrato",
    "rrhh",
    "recurso humano",
    "beneficios",
];

/// Classifies employee queries into `it`, `hr` or `other`.
pub struct RouterService {
    client: Arc<dyn ChatClient>,
}

impl RouterService {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    /// Ask the model for a classification. Output the model cannot be held
    /// to: unparseable responses fall back to a keyword heuristic instead
    /// of failing the query.
    pub async fn classify(&self, user_input: &str) -> Result<Classification, LlmError> {
        let prompt = format!("Mensaje: \"{user_input}\"");
        let response = self.client.complete(INSTRUCTIONS, &prompt).await?;
        let text = response.trim();
        debug!(raw = text, "classifier response");

        match serde_json::from_str::<Classification>(strip_code_fence(text)) {
            Ok(classification) => Ok(classification),
            Err(e) => {
                warn!(error = %e, "classifier output was not valid JSON; using keyword heuristic");
                Ok(heuristic_classification(user_input))
            }
        }
    }
}

/// Keyword fallback used when the model's answer is not parseable.
fn heuristic_classification(user_input: &str) -> Classification {
    let low = user_input.to_lowercase();
    let tipo = if IT_KEYWORDS.iter().any(|k| low.contains(k)) {
        CATEGORY_IT
    } else if HR_KEYWORDS.iter().any(|k| low.contains(k)) {
        CATEGORY_HR
    } else {
        CATEGORY_OTHER
    };

    Classification {
        tipo: tipo.to_string(),
        confidence: Some(0.5),
        details: Some("heuristic fallback".to_string()),
    }
}

/// Models often wrap JSON in a markdown code fence; strip it if present.
fn strip_code_fence(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_detects_it_keywords() {
        let c = heuristic_classification("Me da error 500 el servidor");
        assert_eq!(c.tipo, CATEGORY_IT);
        assert_eq!(c.confidence, Some(0.5));
        assert_eq!(c.details.as_deref(), Some("heuristic fallback"));
    }

    #[test]
    fn heuristic_detects_hr_keywords() {
        let c = heuristic_classification("¿Cuántos días de VACACIONES me quedan?");
        assert_eq!(c.tipo, CATEGORY_HR);
    }

    #[test]
    fn heuristic_defaults_to_other() {
        let c = heuristic_classification("¿Cuál es el sentido de la vida?");
        assert_eq!(c.tipo, CATEGORY_OTHER);
    }

    #[test]
    fn code_fence_is_stripped() {
        let fenced = "```json\n{\"tipo\":\"it\"}\n```";
        assert_eq!(strip_code_fence(fenced), "{\"tipo\":\"it\"}");
        assert_eq!(strip_code_fence("{\"tipo\":\"hr\"}"), "{\"tipo\":\"hr\"}");
    }
}
