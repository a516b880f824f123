//! # triage-desk
//!
//! The employee support desk built on the triage-core engine: a classifier
//! routes each query to an IT branch (diagnose, then resolve), an HR
//! branch or a fixed fallback answer. All model access goes through the
//! [`triage_llm::ChatClient`] trait, so the whole desk runs against a
//! scripted client in tests.

pub mod agents;
pub mod config;
pub mod executors;
pub mod model;
pub mod viz;
pub mod workflow;

pub use config::{ConfigError, DeskConfig};
pub use model::{Classification, TicketContext, TicketMessage};
pub use workflow::{build_support_workflow, SupportServices, WORKFLOW_ID};
