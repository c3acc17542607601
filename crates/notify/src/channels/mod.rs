//! Notification channel implementations.

pub mod slack;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::events::NotifyEvent;

/// Trait for human-facing channels.
#[async_trait]
pub trait NotifyChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Check if this channel is enabled/configured.
    fn enabled(&self) -> bool;

    /// Send a notification event to this channel.
    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError>;

    /// Replace a previously posted interactive message.
    ///
    /// `reference` is the channel-specific handle delivered with the decision
    /// callback (a Slack `response_url`).
    async fn update_message(&self, reference: &str, text: &str) -> Result<(), ChannelError> {
        let _ = (reference, text);
        Err(ChannelError::Unsupported(self.name()))
    }
}
