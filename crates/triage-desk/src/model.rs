//! Domain types flowing through the support workflow.

use serde::{Deserialize, Serialize};

/// Category names the classifier may assign.
pub const CATEGORY_IT: &str = "it";
pub const CATEGORY_HR: &str = "hr";
pub const CATEGORY_OTHER: &str = "other";

/// Result of classifying one employee query.
///
/// `tipo` is one of `it`, `hr` or `other`. `confidence` is informational
/// only; routing never depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub tipo: String,
    pub confidence: Option<f32>,
    pub details: Option<String>,
}

/// Accumulated context of one support ticket as it moves through the
/// graph. Executors only add fields, never remove or rewrite earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketContext {
    /// The employee's query, verbatim.
    pub original_input: String,
    pub tipo: String,
    pub confidence: Option<f32>,
    pub details: Option<String>,
    /// Filled by the IT diagnose stage, consumed by the resolve stage.
    pub it_diagnostic: Option<String>,
}

impl TicketContext {
    pub fn from_classification(original_input: impl Into<String>, c: Classification) -> Self {
        Self {
            original_input: original_input.into(),
            tipo: c.tipo,
            confidence: c.confidence,
            details: c.details,
            it_diagnostic: None,
        }
    }
}

/// The single message type flowing along workflow edges.
///
/// Untagged on the wire: a bare JSON string is the raw query between the
/// intake and classify stages, an object is the enriched ticket context
/// everywhere after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TicketMessage {
    Raw(String),
    Context(TicketContext),
}

impl TicketMessage {
    /// The assigned category, once classification has happened.
    pub fn tipo(&self) -> Option<&str> {
        match self {
            TicketMessage::Raw(_) => None,
            TicketMessage::Context(ctx) => Some(ctx.tipo.as_str()),
        }
    }
}
