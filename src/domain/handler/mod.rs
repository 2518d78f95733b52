//! Per event-kind state transitions over the record stores.
//!
//! Handlers never call each other. Follow-up work is pushed onto the outbox and
//! routed by the event processor once the current event has been handled.

pub mod context_status_handler;
pub mod init_handler;
pub mod input_handler;
pub mod job_status_handler;
pub mod output_handler;

use crate::domain::dag::GraphStore;
use crate::domain::event::Event;
use crate::domain::model::{ContextStore, JobStore, LinkStore, VariableStore};
use crate::error::Result;

pub use context_status_handler::ContextStatusHandler;
pub use init_handler::InitEventHandler;
pub use input_handler::InputEventHandler;
pub use job_status_handler::JobStatusHandler;
pub use output_handler::OutputEventHandler;

/// All records of the engine process, mutated by one event at a time.
#[derive(Debug, Default)]
pub struct EngineState {
    pub graphs: GraphStore,
    pub contexts: ContextStore,
    pub jobs: JobStore,
    pub variables: VariableStore,
    pub links: LinkStore,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }
}

pub trait EventHandler<E> {
    /// Applies `event` to `state`. Events produced as a consequence are appended to `outbox`.
    fn handle(&self, event: &E, state: &mut EngineState, outbox: &mut Vec<Event>) -> Result<()>;
}

/// Routes every event kind to its handler.
#[derive(Debug, Default)]
pub struct HandlerController {
    init: InitEventHandler,
    input: InputEventHandler,
    output: OutputEventHandler,
    job_status: JobStatusHandler,
    context_status: ContextStatusHandler,
}

impl HandlerController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, event: &Event, state: &mut EngineState, outbox: &mut Vec<Event>) -> Result<()> {
        match event {
            Event::Init(e) => self.init.handle(e, state, outbox),
            Event::InputUpdate(e) => self.input.handle(e, state, outbox),
            Event::OutputUpdate(e) => self.output.handle(e, state, outbox),
            Event::JobStatusUpdate(e) => self.job_status.handle(e, state, outbox),
            Event::ContextStatusUpdate(e) => self.context_status.handle(e, state, outbox),
        }
    }
}
