//! Recording channel for tests.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{ChannelError, NotifyChannel, NotifyEvent};

/// Channel that keeps everything sent to it.
#[derive(Default)]
pub struct RecordingChannel {
    events: Mutex<Vec<NotifyEvent>>,
    updates: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel whose sends and updates all fail (after being recorded).
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Events sent so far.
    #[must_use]
    pub fn events(&self) -> Vec<NotifyEvent> {
        lock(&self.events).clone()
    }

    /// `(reference, text)` pairs of message updates so far.
    #[must_use]
    pub fn updates(&self) -> Vec<(String, String)> {
        lock(&self.updates).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl NotifyChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn enabled(&self) -> bool {
        true
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        lock(&self.events).push(event.clone());
        if self.fail {
            return Err(ChannelError::Other("recording channel set to fail".to_string()));
        }
        Ok(())
    }

    async fn update_message(&self, reference: &str, text: &str) -> Result<(), ChannelError> {
        lock(&self.updates).push((reference.to_string(), text.to_string()));
        if self.fail {
            return Err(ChannelError::Other("recording channel set to fail".to_string()));
        }
        Ok(())
    }
}
