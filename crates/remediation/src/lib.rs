//! Remediation service.
//!
//! Accepts an approved [`incident::RemediationPlan`], performs its action
//! against the cluster, and reports the [`incident::RemediationResult`] to
//! the verification service.

pub mod config;
pub mod executor;
pub mod server;

pub use config::Config;
pub use executor::Executor;
pub use server::{build_router, ServerState};
