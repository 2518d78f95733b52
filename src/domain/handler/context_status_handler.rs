use crate::domain::event::{ContextStatusEvent, Event};
use crate::domain::handler::{EngineState, EventHandler};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct ContextStatusHandler;

impl EventHandler<ContextStatusEvent> for ContextStatusHandler {
    fn handle(&self, event: &ContextStatusEvent, state: &mut EngineState, _outbox: &mut Vec<Event>) -> Result<()> {
        let context = state.contexts.get_mut(&event.context_id)?;
        if context.set_status(event.status) {
            log::info!("Context {} is now {:?}.", context.id, context.status);
        }
        Ok(())
    }
}
