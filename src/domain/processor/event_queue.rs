use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// FIFO store of serialized events.
pub trait EventQueue: std::fmt::Debug + Send + Sync {
    fn push(&self, payload: Vec<u8>);
    fn pop(&self) -> Option<Vec<u8>>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local queue. Events do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryEventQueue {
    payloads: Mutex<VecDeque<Vec<u8>>>,
}

impl MemoryEventQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventQueue for MemoryEventQueue {
    fn push(&self, payload: Vec<u8>) {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner).push_back(payload);
    }

    fn pop(&self) -> Option<Vec<u8>> {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner).pop_front()
    }

    fn len(&self) -> usize {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
