//! Graph executors of the support workflow.
//!
//! Every executor is a thin adapter: deserialize the stage's input, make
//! at most one service call, then either forward an enriched
//! [`TicketMessage`] or yield the final answer. All routing lives in the
//! graph definition, not here.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use triage_core::{Executor, ExecutorContext, ExecutorError, ExecutorId};

use crate::agents::{HrService, ItDiagnoseService, ItResolveService, RouterService};
use crate::model::{TicketContext, TicketMessage};

pub const STORE_INPUT: &str = "store_input";
pub const CLASSIFY: &str = "classify";
pub const EXTRACT_TYPE: &str = "extract_type";
pub const IT_DIAGNOSE: &str = "it_diagnose";
pub const IT_RESOLVE: &str = "it_resolve";
pub const HR_HANDLE: &str = "hr_handle";
pub const GENERIC_FALLBACK: &str = "generic_fallback";

/// Fixed answer of the fallback branch; no model is consulted for it.
pub const FALLBACK_MESSAGE: &str = "Lo siento, no pude clasificar tu consulta de manera precisa. \
    Por favor, reformula tu pregunta o contacta directamente con \
    el departamento correspondiente (IT o RRHH).";

// ============================================================================
// INTAKE
// ============================================================================

/// Start executor: records the query and hands it to the classifier.
pub struct StoreInput {
    id: ExecutorId,
}

impl StoreInput {
    pub fn new() -> Self {
        Self {
            id: ExecutorId::new(STORE_INPUT),
        }
    }
}

impl Default for StoreInput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for StoreInput {
    type Input = String;
    type Message = TicketMessage;
    type Output = String;

    fn id(&self) -> &ExecutorId {
        &self.id
    }

    async fn handle<Ctx>(&self, input: Self::Input, ctx: &mut Ctx) -> Result<(), ExecutorError>
    where
        Ctx: ExecutorContext<Self::Message, Self::Output> + Send,
    {
        info!(query = %truncate(&input, 50), "query received");
        ctx.send_message(TicketMessage::Raw(input)).await
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Runs the router service and turns its answer into a [`TicketContext`].
pub struct Classify {
    id: ExecutorId,
    router: Arc<RouterService>,
}

impl Classify {
    pub fn new(router: Arc<RouterService>) -> Self {
        Self {
            id: ExecutorId::new(CLASSIFY),
            router,
        }
    }
}

#[async_trait]
impl Executor for Classify {
    type Input = String;
    type Message = TicketMessage;
    type Output = String;

    fn id(&self) -> &ExecutorId {
        &self.id
    }

    async fn handle<Ctx>(&self, input: Self::Input, ctx: &mut Ctx) -> Result<(), ExecutorError>
    where
        Ctx: ExecutorContext<Self::Message, Self::Output> + Send,
    {
        let classification = self
            .router
            .classify(&input)
            .await
            .map_err(|e| ExecutorError::collaborator(self.id.clone(), e))?;

        info!(
            tipo = %classification.tipo,
            confidence = classification.confidence,
            "query classified"
        );

        let context = TicketContext::from_classification(input, classification);
        ctx.send_message(TicketMessage::Context(context)).await
    }
}

// ============================================================================
// SWITCH SOURCE
// ============================================================================

/// Forwards the classified context unchanged; the switch group sourced
/// here inspects the category to pick a branch.
pub struct ExtractType {
    id: ExecutorId,
}

impl ExtractType {
    pub fn new() -> Self {
        Self {
            id: ExecutorId::new(EXTRACT_TYPE),
        }
    }
}

impl Default for ExtractType {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for ExtractType {
    type Input = TicketContext;
    type Message = TicketMessage;
    type Output = String;

    fn id(&self) -> &ExecutorId {
        &self.id
    }

    async fn handle<Ctx>(&self, input: Self::Input, ctx: &mut Ctx) -> Result<(), ExecutorError>
    where
        Ctx: ExecutorContext<Self::Message, Self::Output> + Send,
    {
        info!(tipo = %input.tipo, "routing ticket");
        ctx.send_message(TicketMessage::Context(input)).await
    }
}

// ============================================================================
// IT BRANCH
// ============================================================================

/// First IT stage: attach a diagnosis to the ticket.
pub struct ItDiagnose {
    id: ExecutorId,
    service: Arc<ItDiagnoseService>,
}

impl ItDiagnose {
    pub fn new(service: Arc<ItDiagnoseService>) -> Self {
        Self {
            id: ExecutorId::new(IT_DIAGNOSE),
            service,
        }
    }
}

#[async_trait]
impl Executor for ItDiagnose {
    type Input = TicketContext;
    type Message = TicketMessage;
    type Output = String;

    fn id(&self) -> &ExecutorId {
        &self.id
    }

    async fn handle<Ctx>(&self, mut input: Self::Input, ctx: &mut Ctx) -> Result<(), ExecutorError>
    where
        Ctx: ExecutorContext<Self::Message, Self::Output> + Send,
    {
        let diagnostic = self
            .service
            .diagnose(&input.original_input)
            .await
            .map_err(|e| ExecutorError::collaborator(self.id.clone(), e))?;

        info!(diagnostic = %truncate(&diagnostic, 100), "diagnosis attached");
        input.it_diagnostic = Some(diagnostic);
        ctx.send_message(TicketMessage::Context(input)).await
    }
}

/// Second IT stage: yield the proposed resolution steps.
pub struct ItResolve {
    id: ExecutorId,
    service: Arc<ItResolveService>,
}

impl ItResolve {
    pub fn new(service: Arc<ItResolveService>) -> Self {
        Self {
            id: ExecutorId::new(IT_RESOLVE),
            service,
        }
    }
}

#[async_trait]
impl Executor for ItResolve {
    type Input = TicketContext;
    type Message = TicketMessage;
    type Output = String;

    fn id(&self) -> &ExecutorId {
        &self.id
    }

    async fn handle<Ctx>(&self, input: Self::Input, ctx: &mut Ctx) -> Result<(), ExecutorError>
    where
        Ctx: ExecutorContext<Self::Message, Self::Output> + Send,
    {
        let diagnostic = input.it_diagnostic.as_deref().unwrap_or_default();
        let solution = self
            .service
            .resolve(diagnostic, &input.original_input)
            .await
            .map_err(|e| ExecutorError::collaborator(self.id.clone(), e))?;

        info!(solution = %truncate(&solution, 100), "resolution proposed");
        ctx.yield_output(solution).await
    }
}

// ============================================================================
// HR BRANCH
// ============================================================================

/// HR stage: yield the HR assistant's answer.
pub struct HrHandle {
    id: ExecutorId,
    service: Arc<HrService>,
}

impl HrHandle {
    pub fn new(service: Arc<HrService>) -> Self {
        Self {
            id: ExecutorId::new(HR_HANDLE),
            service,
        }
    }
}

#[async_trait]
impl Executor for HrHandle {
    type Input = TicketContext;
    type Message = TicketMessage;
    type Output = String;

    fn id(&self) -> &ExecutorId {
        &self.id
    }

    async fn handle<Ctx>(&self, input: Self::Input, ctx: &mut Ctx) -> Result<(), ExecutorError>
    where
        Ctx: ExecutorContext<Self::Message, Self::Output> + Send,
    {
        let answer = self
            .service
            .handle(&input.original_input)
            .await
            .map_err(|e| ExecutorError::collaborator(self.id.clone(), e))?;

        info!(answer = %truncate(&answer, 100), "hr answer produced");
        ctx.yield_output(answer).await
    }
}

// ============================================================================
// FALLBACK BRANCH
// ============================================================================

/// Default branch: yields a fixed message, no model involved.
pub struct GenericFallback {
    id: ExecutorId,
}

impl GenericFallback {
    pub fn new() -> Self {
        Self {
            id: ExecutorId::new(GENERIC_FALLBACK),
        }
    }
}

impl Default for GenericFallback {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for GenericFallback {
    type Input = TicketContext;
    type Message = TicketMessage;
    type Output = String;

    fn id(&self) -> &ExecutorId {
        &self.id
    }

    async fn handle<Ctx>(&self, input: Self::Input, ctx: &mut Ctx) -> Result<(), ExecutorError>
    where
        Ctx: ExecutorContext<Self::Message, Self::Output> + Send,
    {
        info!(tipo = %input.tipo, "unclassified query; answering generically");
        ctx.yield_output(FALLBACK_MESSAGE.to_string()).await
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triage_core::RunContext;
    use triage_core::RunId;

    #[tokio::test]
    async fn store_input_forwards_the_raw_query() {
        let executor = StoreInput::new();
        let mut ctx: RunContext<TicketMessage, String> =
            RunContext::new(RunId::new("run-test"), executor.id().clone());

        executor
            .handle("no funciona el login".to_string(), &mut ctx)
            .await
            .unwrap();

        assert_eq!(
            ctx.take_messages(),
            vec![TicketMessage::Raw("no funciona el login".to_string())]
        );
    }

    #[tokio::test]
    async fn generic_fallback_yields_the_fixed_message() {
        let executor = GenericFallback::new();
        let mut ctx: RunContext<TicketMessage, String> =
            RunContext::new(RunId::new("run-test"), executor.id().clone());

        let ticket = TicketContext {
            original_input: "¿sentido de la vida?".into(),
            tipo: "other".into(),
            confidence: Some(0.5),
            details: None,
            it_diagnostic: None,
        };
        executor.handle(ticket, &mut ctx).await.unwrap();

        assert_eq!(ctx.take_outputs(), vec![FALLBACK_MESSAGE.to_string()]);
        assert!(!ctx.has_messages());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("señal", 10), "señal");
        assert_eq!(truncate("señal de error", 5), "señal...");
    }
}
