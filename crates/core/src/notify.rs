//! Change notification port
//!
//! The orchestration service emits task lifecycle events through a
//! `Notifier` injected at construction. Emission is best-effort: the
//! service logs failures and never fails the triggering operation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::task::TaskWithCategory;
use crate::Result;

/// Task lifecycle event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    Created { task: TaskWithCategory },
}

/// Port for emitting task events
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: TaskEvent) -> Result<()>;
}

/// Broadcast-channel notifier
///
/// Fans events out to any number of subscribers. Sending with no live
/// subscriber is a successful no-op.
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: broadcast::Sender<TaskEvent>,
}

impl ChannelNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    /// Subscribe to future events
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, event: TaskEvent) -> Result<()> {
        // A send error only means nobody is listening right now
        let _ = self.tx.send(event);
        Ok(())
    }
}
