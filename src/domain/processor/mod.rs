pub mod event_processor;
pub mod event_queue;
pub mod iteration_observer;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use event_processor::EventProcessor;
pub use event_queue::{EventQueue, MemoryEventQueue};
pub use iteration_observer::IterationObserver;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where events produced by a handler go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchStrategy {
    /// Handled right away by the sender, in FIFO order.
    #[default]
    Inline,
    /// Appended to the queue for the consumer.
    Queued,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// How long the consumer sleeps when the queue is empty.
    pub poll_interval: Duration,
    pub dispatch: DispatchStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { poll_interval: DEFAULT_POLL_INTERVAL, dispatch: DispatchStrategy::default() }
    }
}
