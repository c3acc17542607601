//! Data contract for the incident-response pipeline.
//!
//! Three services exchange the types in this crate:
//!
//! ```text
//! Alertmanager → diagnosis → Slack (approval) → diagnosis → remediation → verification → Slack
//! ```
//!
//! - [`AlertBatch`] / [`AlertEvent`] arrive from Alertmanager
//! - [`RemediationPlan`] is produced by diagnosis and threaded through every hop,
//!   carrying the [`DiagnosisReport`] the final report needs
//! - [`RemediationResult`] is produced by remediation
//! - [`VerificationReport`] is the terminal artifact posted back to the channel
//!
//! The crate also holds the pieces every service shares: the reasoning
//! response parser, target inference, the hand-off client and the liveness
//! handler.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod alert;
pub mod handoff;
pub mod health;
pub mod parse;
pub mod plan;
pub mod report;
pub mod result;
pub mod target;
pub mod telemetry;
pub mod text;

pub use alert::{AlertBatch, AlertEvent};
pub use handoff::{HandoffClient, HandoffError};
pub use parse::{parse_reasoning_response, ParsedResponse};
pub use plan::{DiagnosisReport, PodRef, RemediationAction, RemediationPlan, ABSENT_POD};
pub use report::{ReportStatus, VerificationOutcome, VerificationReport};
pub use result::{RemediationResult, RemediationStatus};
pub use target::{infer_target, InferredTarget};
