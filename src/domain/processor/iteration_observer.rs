use crate::domain::utils::id::ContextId;

/// Notified once per successfully handled event.
pub trait IterationObserver: Send + Sync {
    fn on_iteration(&self, context_id: &ContextId, iteration: u64);
}

impl<F> IterationObserver for F
where
    F: Fn(&ContextId, u64) + Send + Sync,
{
    fn on_iteration(&self, context_id: &ContextId, iteration: u64) {
        self(context_id, iteration)
    }
}
