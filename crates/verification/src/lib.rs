//! Verification service.
//!
//! Receives a [`incident::RemediationResult`], waits for the cluster to
//! settle, polls until the action's post-condition holds or a deadline
//! passes, and publishes one consolidated report to the human channel.
//! Failed remediations are reported straight away without touching the
//! cluster.

pub mod config;
pub mod poll;
pub mod server;
pub mod verifier;

pub use config::Config;
pub use poll::{poll_until, Backoff, Probe};
pub use server::{build_router, ServerState};
pub use verifier::{Verifier, VerifySettings};
