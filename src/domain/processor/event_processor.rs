use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use crate::domain::event::{ContextStatusEvent, Event};
use crate::domain::handler::{EngineState, HandlerController};
use crate::domain::model::ContextStatus;
use crate::domain::processor::event_queue::{EventQueue, MemoryEventQueue};
use crate::domain::processor::iteration_observer::IterationObserver;
use crate::domain::processor::{DispatchStrategy, EngineConfig};
use crate::domain::utils::id::ContextId;
use crate::error::{Error, Result};

/// Drains the event queue and dispatches every event to its handler.
///
/// A handler error fails the context of the event. If the context cannot be
/// failed either, the processor stops and drops everything sent afterwards.
pub struct EventProcessor {
    state: Mutex<EngineState>,
    handlers: HandlerController,
    queue: Arc<dyn EventQueue>,
    config: EngineConfig,

    stopped: AtomicBool,
    idle: AtomicBool,
    /// Successfully handled events per context.
    iterations: Mutex<HashMap<ContextId, u64>>,
    observers: RwLock<Vec<Box<dyn IterationObserver>>>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for EventProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventProcessor")
            .field("queue", &self.queue)
            .field("config", &self.config)
            .field("stopped", &self.is_stopped())
            .field("idle", &self.is_idle())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EventProcessor {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_queue(config, Arc::new(MemoryEventQueue::new()))
    }

    pub fn with_queue(config: EngineConfig, queue: Arc<dyn EventQueue>) -> Self {
        Self {
            state: Mutex::new(EngineState::new()),
            handlers: HandlerController::new(),
            queue,
            config,
            stopped: AtomicBool::new(false),
            idle: AtomicBool::new(true),
            iterations: Mutex::new(HashMap::new()),
            observers: RwLock::new(Vec::new()),
            consumer: Mutex::new(None),
        }
    }

    pub fn add_observer(&self, observer: impl IterationObserver + 'static) {
        self.observers.write().unwrap_or_else(PoisonError::into_inner).push(Box::new(observer));
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn is_idle(&self) -> bool {
        self.idle.load(Ordering::SeqCst)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn iteration(&self, context_id: &ContextId) -> u64 {
        lock(&self.iterations).get(context_id).copied().unwrap_or(0)
    }

    /// Read access to the records, e.g. to build runnable jobs or collect outputs.
    pub fn with_state<R>(&self, f: impl FnOnce(&EngineState) -> R) -> R {
        f(&lock(&self.state))
    }

    /// Accepts an event. Init events always go through the queue, everything else
    /// follows the dispatch strategy. Dropped silently once stopped.
    pub fn send(&self, event: Event) -> Result<()> {
        if self.is_stopped() {
            log::debug!("Processor stopped, dropping {} event for context {}.", event.event_type(), event.context_id());
            return Ok(());
        }
        match event {
            Event::Init(_) => self.add_to_queue(&event),
            event => self.route(vec![event]),
        }
    }

    /// Serializes the event onto the queue. A serialization failure stops the processor.
    pub fn add_to_queue(&self, event: &Event) -> Result<()> {
        if self.is_stopped() {
            return Ok(());
        }
        match serde_json::to_vec(event) {
            Ok(payload) => {
                self.queue.push(payload);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to serialize {} event for context {}: {}", event.event_type(), event.context_id(), e);
                self.stop();
                Err(Error::EventSerializationError(e))
            }
        }
    }

    /// Handles the next queued event. Returns `false` when the queue was empty.
    pub fn process_next(&self) -> Result<bool> {
        if self.is_stopped() {
            return Ok(false);
        }
        let Some(payload) = self.queue.pop() else {
            self.idle.store(true, Ordering::SeqCst);
            return Ok(false);
        };

        let event: Event = match serde_json::from_slice(&payload) {
            Ok(event) => event,
            Err(e) => {
                log::error!("Discarding event that cannot be decoded: {}", e);
                return Ok(true);
            }
        };
        let outbox = self.handle(event);
        self.route(outbox)?;
        Ok(true)
    }

    /// Processes queued events until the queue is empty or the processor stops.
    pub fn run_until_idle(&self) -> Result<usize> {
        let mut processed = 0;
        while self.process_next()? {
            processed += 1;
        }
        Ok(processed)
    }

    /// Spawns the background consumer that polls the queue.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        let mut consumer = lock(&self.consumer);
        if consumer.is_some() || self.is_stopped() {
            return Ok(());
        }

        let processor = Arc::clone(self);
        let handle = thread::Builder::new().name("event-processor".to_string()).spawn(move || processor.consume())?;
        *consumer = Some(handle);
        Ok(())
    }

    /// Idempotent. The consumer notices within one poll interval.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.idle.store(true, Ordering::SeqCst);
        lock(&self.iterations).clear();
        log::info!("Event processor stopped.");
    }

    /// Waits for the consumer thread after `stop`. No-op on the consumer thread itself.
    pub fn join(&self) {
        let Some(handle) = lock(&self.consumer).take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            log::error!("Event processor thread panicked.");
        }
    }

    fn consume(&self) {
        log::info!("Event processor consuming, polling every {:?}.", self.config.poll_interval);
        while !self.is_stopped() {
            match self.process_next() {
                Ok(true) => {}
                Ok(false) => thread::sleep(self.config.poll_interval),
                Err(e) => log::error!("Event processing failed: {}", e),
            }
        }
    }

    fn route(&self, events: Vec<Event>) -> Result<()> {
        match self.config.dispatch {
            DispatchStrategy::Queued => {
                for event in &events {
                    self.add_to_queue(event)?;
                }
            }
            DispatchStrategy::Inline => {
                let mut pending = VecDeque::from(events);
                while let Some(event) = pending.pop_front() {
                    if self.is_stopped() {
                        break;
                    }
                    if matches!(event, Event::Init(_)) {
                        self.add_to_queue(&event)?;
                        continue;
                    }
                    pending.extend(self.handle(event));
                }
            }
        }
        Ok(())
    }

    /// Handles one event and returns the events it produced.
    fn handle(&self, event: Event) -> Vec<Event> {
        let context_id = event.context_id().clone();
        let event_type = event.event_type();
        let mut state = lock(&self.state);

        if state.contexts.find(&context_id).is_some_and(|context| context.is_failed()) {
            tracing::info!(context_id = %context_id, event_type = %event_type, "Skip event {}. Context {} has been invalidated.", event_type, context_id);
            return Vec::new();
        }

        self.idle.store(false, Ordering::SeqCst);
        let mut outbox = Vec::new();
        match self.handlers.handle(&event, &mut state, &mut outbox) {
            Ok(()) => {
                drop(state);
                let iteration = self.next_iteration(&context_id);
                tracing::debug!(context_id = %context_id, event_type = %event_type, iteration, emitted = outbox.len(), "Event handled");
                self.notify(&context_id, iteration);
                outbox
            }
            Err(error) => {
                log::error!("Failed to handle {} event for context {}: {}", event_type, context_id, error);
                let invalidate = Event::from(ContextStatusEvent { context_id: context_id.clone(), status: ContextStatus::Failed });
                let result = self.handlers.handle(&invalidate, &mut state, &mut Vec::new());
                drop(state);

                if let Err(error) = result {
                    log::error!("Failed to invalidate context {}: {}", context_id, error);
                    self.stop();
                }
                Vec::new()
            }
        }
    }

    fn next_iteration(&self, context_id: &ContextId) -> u64 {
        let mut iterations = lock(&self.iterations);
        let iteration = iterations.entry(context_id.clone()).or_insert(0);
        *iteration += 1;
        *iteration
    }

    fn notify(&self, context_id: &ContextId, iteration: u64) {
        for observer in self.observers.read().unwrap_or_else(PoisonError::into_inner).iter() {
            observer.on_iteration(context_id, iteration);
        }
    }
}
