//! Assembly of the support triage workflow.
//!
//! Topology:
//!
//! ```text
//! store_input ──▶ classify ──▶ extract_type ──┬─ tipo == "it" ──▶ it_diagnose ──▶ it_resolve
//!                                             ├─ tipo == "hr" ──▶ hr_handle
//!                                             └─ default ───────▶ generic_fallback
//! ```

use std::sync::Arc;

use triage_core::{
    ExecutorRegistry, GraphResult, SwitchCase, SwitchGroup, Workflow, WorkflowBuilder,
};
use triage_llm::ChatClient;

use crate::agents::{HrService, ItDiagnoseService, ItResolveService, RouterService};
use crate::executors::{
    Classify, ExtractType, GenericFallback, HrHandle, ItDiagnose, ItResolve, StoreInput, CLASSIFY,
    EXTRACT_TYPE, GENERIC_FALLBACK, HR_HANDLE, IT_DIAGNOSE, IT_RESOLVE, STORE_INPUT,
};
use crate::model::{TicketMessage, CATEGORY_HR, CATEGORY_IT};

pub const WORKFLOW_ID: &str = "support-triage";

/// The services backing the workflow's executors, sharing one chat client.
pub struct SupportServices {
    pub router: Arc<RouterService>,
    pub it_diagnose: Arc<ItDiagnoseService>,
    pub it_resolve: Arc<ItResolveService>,
    pub hr: Arc<HrService>,
}

impl SupportServices {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self {
            router: Arc::new(RouterService::new(client.clone())),
            it_diagnose: Arc::new(ItDiagnoseService::new(client.clone())),
            it_resolve: Arc::new(ItResolveService::new(client.clone())),
            hr: Arc::new(HrService::new(client)),
        }
    }
}

/// Build the triage workflow over the given services.
pub fn build_support_workflow(
    services: SupportServices,
) -> GraphResult<Workflow<TicketMessage, String>> {
    let definition = WorkflowBuilder::new(WORKFLOW_ID)
        .set_start(STORE_INPUT)
        .add_executor_id(CLASSIFY)
        .add_executor_id(EXTRACT_TYPE)
        .add_executor_id(IT_DIAGNOSE)
        .add_executor_id(IT_RESOLVE)
        .add_executor_id(HR_HANDLE)
        .add_executor_id(GENERIC_FALLBACK)
        .add_edge(STORE_INPUT, CLASSIFY)
        .add_edge(CLASSIFY, EXTRACT_TYPE)
        .add_switch_group(SwitchGroup::new(
            EXTRACT_TYPE,
            vec![
                SwitchCase::new(IT_DIAGNOSE, |m: &TicketMessage| {
                    m.tipo() == Some(CATEGORY_IT)
                })
                .with_label("tipo == it"),
                SwitchCase::new(HR_HANDLE, |m: &TicketMessage| {
                    m.tipo() == Some(CATEGORY_HR)
                })
                .with_label("tipo == hr"),
            ],
            GENERIC_FALLBACK,
        ))
        .add_edge(IT_DIAGNOSE, IT_RESOLVE)
        .build()?;

    let mut registry = ExecutorRegistry::new();
    registry.register(StoreInput::new());
    registry.register(Classify::new(services.router));
    registry.register(ExtractType::new());
    registry.register(ItDiagnose::new(services.it_diagnose));
    registry.register(ItResolve::new(services.it_resolve));
    registry.register(HrHandle::new(services.hr));
    registry.register(GenericFallback::new());

    Ok(Workflow::new(definition, registry))
}
