//! Human channel for the incident pipeline.
//!
//! Diagnosis posts interactive approval requests here, the approval gate
//! replaces those messages once a decision arrives, and verification posts
//! the final incident report.
//!
//! # Architecture
//!
//! - [`NotifyChannel`] trait defines the interface for channels
//! - [`SlackChannel`] implements it on the Slack Web API
//! - [`Notifier`] dispatches events to all enabled channels
//!
//! The notifier is built once at startup and shared by the components that
//! need it; nothing in this crate reads process-global state.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod events;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use channels::slack::{SlackChannel, APPROVE_ACTION_ID, DENY_ACTION_ID};
pub use channels::NotifyChannel;
pub use error::ChannelError;
pub use events::{ApprovalRequest, NotifyEvent, Severity};

use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Central notification dispatcher.
pub struct Notifier {
    channels: Vec<Arc<dyn NotifyChannel>>,
    disabled: bool,
}

impl Notifier {
    /// Notifier backed by Slack, or a disabled one when `disabled` is set.
    #[must_use]
    pub fn slack(slack: SlackChannel, disabled: bool) -> Self {
        if disabled {
            info!("Notifications disabled via NOTIFY_DISABLED");
            return Self::disabled();
        }

        let mut channels: Vec<Arc<dyn NotifyChannel>> = vec![];
        if slack.enabled() {
            info!("Slack notifications enabled");
            channels.push(Arc::new(slack));
        } else {
            warn!("No notification channels configured");
        }

        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a notifier with specific channels.
    #[must_use]
    pub fn with_channels(channels: Vec<Arc<dyn NotifyChannel>>) -> Self {
        Self {
            channels,
            disabled: false,
        }
    }

    /// Create a disabled notifier (for testing or when notifications are off).
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            channels: vec![],
            disabled: true,
        }
    }

    /// Check if any notification channels are enabled.
    #[must_use]
    pub fn has_channels(&self) -> bool {
        !self.disabled && !self.channels.is_empty()
    }

    /// Get the number of enabled channels.
    #[must_use]
    pub fn channel_count(&self) -> usize {
        if self.disabled {
            0
        } else {
            self.channels.len()
        }
    }

    /// Send an event to every enabled channel, waiting for each.
    pub async fn notify_and_wait(
        &self,
        event: NotifyEvent,
    ) -> Vec<(String, Result<(), ChannelError>)> {
        if self.disabled || self.channels.is_empty() {
            return vec![];
        }

        let mut results = vec![];

        for channel in self.channels.iter().filter(|c| c.enabled()) {
            let channel_name = channel.name().to_string();
            let result = channel.send(&event).await;
            results.push((channel_name, result));
        }

        results
    }

    /// Send an event once per channel, logging failures.
    ///
    /// Returns `true` when at least one channel accepted it. Failed posts are
    /// not retried.
    pub async fn deliver(&self, event: NotifyEvent) -> bool {
        let title = event.title();
        let results = self.notify_and_wait(event).await;

        if results.is_empty() {
            debug!(event = %title, "No channels to deliver to");
            return false;
        }

        let mut delivered = false;
        for (channel, result) in results {
            match result {
                Ok(()) => {
                    debug!(channel = %channel, event = %title, "Notification sent");
                    delivered = true;
                }
                Err(e) => {
                    error!(channel = %channel, event = %title, error = %e, "Failed to send notification");
                }
            }
        }
        delivered
    }

    /// Replace an interactive message through the first channel that supports it.
    pub async fn update_message(&self, reference: &str, text: &str) -> Result<(), ChannelError> {
        if self.disabled {
            debug!("Notifications disabled, skipping message update");
            return Ok(());
        }

        for channel in &self.channels {
            match channel.update_message(reference, text).await {
                Err(ChannelError::Unsupported(name)) => {
                    debug!(channel = name, "Channel cannot update messages");
                }
                other => return other,
            }
        }

        Err(ChannelError::NotConfigured(
            "no channel supports message updates".to_string(),
        ))
    }
}
