//! Support triage CLI: classify employee queries and answer them through
//! the IT, HR or fallback branch of the workflow.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use triage_core::RunEvent;
use triage_desk::{build_support_workflow, viz, DeskConfig, SupportServices};
use triage_llm::AzureOpenAiClient;

/// Sample queries exercising each branch of the workflow.
const SAMPLE_QUERIES: &[&str] = &[
    "No puedo acceder al servidor de producción, me da error 500",
    "¿Cuántos días de vacaciones me corresponden este año?",
    "¿Cuál es el sentido de la vida?",
];

#[derive(Parser)]
#[command(name = "triage", about = "Employee support triage workflow")]
struct Args {
    /// Queries to run; without any, three sample queries are used.
    queries: Vec<String>,

    /// Print the workflow diagrams (Mermaid and DOT) and exit.
    #[arg(long)]
    diagram: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = DeskConfig::from_env()?;
    let client = Arc::new(AzureOpenAiClient::new(
        config.endpoint,
        config.api_key,
        config.deployment,
        config.api_version,
    ));

    let services = SupportServices::new(client);
    let workflow = Arc::new(build_support_workflow(services)?);
    info!(workflow = %workflow.id(), "workflow ready");

    if args.diagram {
        println!("{}", viz::to_mermaid(workflow.definition()));
        println!("{}", viz::to_dot(workflow.definition()));
        return Ok(());
    }

    let queries: Vec<String> = if args.queries.is_empty() {
        SAMPLE_QUERIES.iter().map(|q| q.to_string()).collect()
    } else {
        args.queries
    };

    for query in queries {
        println!("{}", "=".repeat(60));
        println!("Consulta: {query}");
        println!("{}", "=".repeat(60));

        let mut final_output = None;
        let mut stream = workflow.clone().run_stream(query);
        while let Some(event) = stream.next().await {
            match event {
                RunEvent::Started { run_id, .. } => info!(%run_id, "run started"),
                RunEvent::ExecutorStarted { executor_id, .. } => {
                    info!(executor = %executor_id, "stage started")
                }
                RunEvent::ExecutorCompleted {
                    executor_id,
                    duration_ms,
                } => info!(executor = %executor_id, duration_ms, "stage completed"),
                RunEvent::ExecutorFailed { executor_id, error } => {
                    warn!(executor = %executor_id, %error, "stage failed")
                }
                RunEvent::Output { data, .. } => {
                    final_output = data.as_str().map(str::to_string);
                }
                RunEvent::Completed { duration_ms, steps } => {
                    info!(duration_ms, steps, "run completed")
                }
                RunEvent::Failed { failure, .. } => error!(%failure, "run failed"),
            }
        }

        match final_output {
            Some(answer) => println!("\nRespuesta:\n{answer}\n"),
            None => println!("\n(la consulta no produjo respuesta)\n"),
        }
    }

    Ok(())
}
