//! End-to-end runs of the support workflow against a scripted chat client.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_stream::StreamExt;

use triage_core::{ExecutorId, RunEvent, RunState, Workflow};
use triage_desk::executors::{
    CLASSIFY, EXTRACT_TYPE, FALLBACK_MESSAGE, GENERIC_FALLBACK, HR_HANDLE, IT_DIAGNOSE,
    IT_RESOLVE, STORE_INPUT,
};
use triage_desk::{build_support_workflow, SupportServices, TicketMessage};
use triage_llm::{ChatClient, LlmError};

const IT_QUERY: &str = "No puedo acceder al servidor de producción, me da error 500";
const HR_QUERY: &str = "¿Cuántos días de vacaciones me corresponden este año?";
const OTHER_QUERY: &str = "¿Cuál es el sentido de la vida?";

const DIAGNOSIS: &str = "Posible sobrecarga del servidor; revisar los logs de acceso.";
const RESOLUTION: &str = "1. Revisar los logs del servidor\n2. Reiniciar el servicio afectado";
const HR_ANSWER: &str = "Te corresponden 23 días hábiles de vacaciones este año.";

/// Scripted client: answers by role, inferred from the instructions, and
/// counts the calls made to each role.
struct ScriptedClient {
    classification: String,
    classify_calls: AtomicUsize,
    branch_calls: AtomicUsize,
}

impl ScriptedClient {
    fn new(classification: impl Into<String>) -> Self {
        Self {
            classification: classification.into(),
            classify_calls: AtomicUsize::new(0),
            branch_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, system: &str, _user: &str) -> Result<String, LlmError> {
        // The resolve instructions mention the prior diagnosis, so the
        // resolver role must be matched before the diagnose role.
        if system.contains("clasificador") {
            self.classify_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.classification.clone())
        } else if system.contains("resolución") {
            self.branch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(RESOLUTION.to_string())
        } else if system.contains("diagnóstico") {
            self.branch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(DIAGNOSIS.to_string())
        } else {
            self.branch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(HR_ANSWER.to_string())
        }
    }
}

fn workflow_with(
    client: Arc<ScriptedClient>,
) -> Workflow<TicketMessage, String> {
    let services = SupportServices::new(client);
    build_support_workflow(services).unwrap()
}

fn visited_path(report: &triage_core::RunReport<String>) -> Vec<&str> {
    report.visited.iter().map(|id| id.as_str()).collect()
}

#[tokio::test]
async fn it_query_runs_diagnose_then_resolve() {
    let client = Arc::new(ScriptedClient::new(
        r#"{"tipo":"it","confidence":0.92,"details":"error de servidor"}"#,
    ));
    let workflow = workflow_with(client.clone());

    let report = workflow.run(IT_QUERY.to_string()).await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(
        visited_path(&report),
        vec![STORE_INPUT, CLASSIFY, EXTRACT_TYPE, IT_DIAGNOSE, IT_RESOLVE]
    );
    assert_eq!(report.output.as_deref(), Some(RESOLUTION));
    assert_eq!(client.classify_calls.load(Ordering::SeqCst), 1);
    // diagnose + resolve
    assert_eq!(client.branch_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn hr_query_runs_the_hr_branch() {
    let client = Arc::new(ScriptedClient::new(
        r#"{"tipo":"hr","confidence":0.88,"details":"consulta de vacaciones"}"#,
    ));
    let workflow = workflow_with(client.clone());

    let report = workflow.run(HR_QUERY.to_string()).await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(
        visited_path(&report),
        vec![STORE_INPUT, CLASSIFY, EXTRACT_TYPE, HR_HANDLE]
    );
    assert_eq!(report.output.as_deref(), Some(HR_ANSWER));
    assert_eq!(client.branch_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unclassified_query_gets_the_fixed_fallback() {
    let client = Arc::new(ScriptedClient::new(
        r#"{"tipo":"other","confidence":0.3,"details":"fuera de alcance"}"#,
    ));
    let workflow = workflow_with(client.clone());

    let report = workflow.run(OTHER_QUERY.to_string()).await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(
        visited_path(&report),
        vec![STORE_INPUT, CLASSIFY, EXTRACT_TYPE, GENERIC_FALLBACK]
    );
    assert_eq!(report.output.as_deref(), Some(FALLBACK_MESSAGE));
    // The fallback branch never consults the model.
    assert_eq!(client.branch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_classifier_output_falls_back_to_keywords() {
    // Not JSON at all; the router's keyword heuristic must take over and
    // still complete the run through the HR branch.
    let client = Arc::new(ScriptedClient::new("lo siento, no puedo ayudarte"));
    let workflow = workflow_with(client.clone());

    let report = workflow.run(HR_QUERY.to_string()).await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.output.as_deref(), Some(HR_ANSWER));
    assert_eq!(*report.visited.last().unwrap(), ExecutorId::new(HR_HANDLE));
}

#[tokio::test]
async fn malformed_output_without_keywords_completes_via_fallback() {
    let client = Arc::new(ScriptedClient::new("???"));
    let workflow = workflow_with(client);

    let report = workflow.run(OTHER_QUERY.to_string()).await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.output.as_deref(), Some(FALLBACK_MESSAGE));
}

#[tokio::test]
async fn low_confidence_does_not_change_the_route() {
    let client = Arc::new(ScriptedClient::new(
        r#"{"tipo":"it","confidence":0.05,"details":"poco claro"}"#,
    ));
    let workflow = workflow_with(client);

    let report = workflow.run(IT_QUERY.to_string()).await.unwrap();

    // Routing follows tipo alone; confidence is carried but never gates.
    assert_eq!(*report.visited.last().unwrap(), ExecutorId::new(IT_RESOLVE));
}

#[tokio::test]
async fn same_query_takes_the_same_path_twice() {
    let client = Arc::new(ScriptedClient::new(
        r#"{"tipo":"hr","confidence":0.8,"details":"permiso"}"#,
    ));
    let workflow = workflow_with(client);

    let first = workflow.run(HR_QUERY.to_string()).await.unwrap();
    let second = workflow.run(HR_QUERY.to_string()).await.unwrap();

    assert_eq!(first.visited, second.visited);
    assert_eq!(first.output, second.output);
}

#[tokio::test]
async fn streaming_run_reports_each_stage() {
    let client = Arc::new(ScriptedClient::new(
        r#"{"tipo":"it","confidence":0.9,"details":"bug"}"#,
    ));
    let workflow = Arc::new(workflow_with(client));

    let mut stream = workflow.run_stream(IT_QUERY.to_string());
    let mut events = Vec::new();
    while let Some(event) = stream.next().await {
        events.push(event);
    }

    assert!(matches!(events.first(), Some(RunEvent::Started { .. })));
    assert!(matches!(events.last(), Some(RunEvent::Completed { .. })));

    let stages: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::ExecutorStarted { executor_id, .. } => Some(executor_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![STORE_INPUT, CLASSIFY, EXTRACT_TYPE, IT_DIAGNOSE, IT_RESOLVE]
    );

    let output = events.iter().find_map(|e| match e {
        RunEvent::Output { data, .. } => data.as_str().map(str::to_string),
        _ => None,
    });
    assert_eq!(output.as_deref(), Some(RESOLUTION));
}

#[tokio::test]
async fn ticket_context_only_gains_fields_downstream() {
    let client = Arc::new(ScriptedClient::new(
        r#"{"tipo":"it","confidence":0.92,"details":"error de servidor"}"#,
    ));
    let workflow = Arc::new(workflow_with(client));

    let mut stream = workflow.run_stream(IT_QUERY.to_string());
    let mut payloads = Vec::new();
    while let Some(event) = stream.next().await {
        if let RunEvent::ExecutorStarted {
            executor_id,
            payload,
        } = event
        {
            payloads.push((executor_id.as_str().to_string(), payload));
        }
    }

    let payload_for = |id: &str| {
        payloads
            .iter()
            .find(|(executor, _)| executor == id)
            .map(|(_, payload)| payload.clone())
            .unwrap()
    };

    // Fields set at classification survive unchanged through every later
    // stage; the diagnose stage only adds to the context.
    for stage in [EXTRACT_TYPE, IT_DIAGNOSE, IT_RESOLVE] {
        let payload = payload_for(stage);
        assert_eq!(payload["original_input"], IT_QUERY);
        assert_eq!(payload["tipo"], "it");
        assert_eq!(payload["details"], "error de servidor");
    }
    assert!(payload_for(IT_DIAGNOSE)["it_diagnostic"].is_null());
    assert_eq!(payload_for(IT_RESOLVE)["it_diagnostic"], DIAGNOSIS);
}

#[tokio::test]
async fn provider_failure_fails_the_run_without_retry() {
    struct FailingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatClient for FailingClient {
        fn model(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _: &str, _: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Connection("connection refused".into()))
        }
    }

    let client = Arc::new(FailingClient {
        calls: AtomicUsize::new(0),
    });
    let services = SupportServices::new(client.clone());
    let workflow = build_support_workflow(services).unwrap();

    let report = workflow.run(IT_QUERY.to_string()).await.unwrap();

    assert_eq!(report.state, RunState::Failed);
    let failure = report.failure.unwrap();
    assert_eq!(failure.kind, triage_core::FailureKind::Collaborator);
    assert_eq!(failure.executor, Some(ExecutorId::new(CLASSIFY)));
    assert!(failure.message.contains("connection refused"));
    // One classify attempt, no retries.
    assert_eq!(client.calls.load(Ordering::SeqCst), 1);
}
