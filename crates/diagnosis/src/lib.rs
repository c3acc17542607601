//! Diagnosis service.
//!
//! Receives Alertmanager webhooks, recovers the remediation target from the
//! alert labels, gathers log evidence, asks a reasoning service for a
//! root-cause analysis and a structured plan, and posts an interactive
//! approval request. The embedded approval gate hands approved plans to the
//! remediation service.

pub mod approval;
pub mod config;
pub mod evidence;
pub mod orchestrator;
pub mod prompt;
pub mod reasoning;
pub mod server;

pub use approval::{ApprovalGate, Decision, GateOutcome, InteractionPayload};
pub use config::Config;
pub use orchestrator::{AlertOutcome, Diagnoser, DiagnosisSettings};
pub use reasoning::{ChatMessage, ChatRole, OpenAiReasoner, ReasoningError, ReasoningService};
pub use server::{build_router, ServerState};
