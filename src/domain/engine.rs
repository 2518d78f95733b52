use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::application_store::{ApplicationStore, MemoryApplicationStore};
use crate::domain::dag::{DagGraph, PortType};
use crate::domain::event::{Event, InitEvent, JobStatusEvent};
use crate::domain::job_helper::{Job, JobHelper};
use crate::domain::model::{ContextStatus, JobRecord, JobState, VariableRecord};
use crate::domain::processor::{EngineConfig, EventProcessor, IterationObserver};
use crate::domain::utils::id::{ContextId, JobId, PortId, generate_external_id};
use crate::error::Result;

/// Entry point for callers: starts runs, reports job results and reads back state.
#[derive(Debug, Clone)]
pub struct WorkflowEngine {
    processor: Arc<EventProcessor>,
    applications: Arc<dyn ApplicationStore>,
}

impl WorkflowEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_applications(config, Arc::new(MemoryApplicationStore::new()))
    }

    pub fn with_applications(config: EngineConfig, applications: Arc<dyn ApplicationStore>) -> Self {
        Self { processor: Arc::new(EventProcessor::new(config)), applications }
    }

    pub fn processor(&self) -> &Arc<EventProcessor> {
        &self.processor
    }

    pub fn add_observer(&self, observer: impl IterationObserver + 'static) {
        self.processor.add_observer(observer);
    }

    /// Queues a new run under a fresh context id.
    pub fn start_run(&self, graph: DagGraph, inputs: Map<String, Value>, config: Value) -> Result<ContextId> {
        let context_id = ContextId::new(generate_external_id());
        self.start_run_with_id(context_id.clone(), graph, inputs, config)?;
        Ok(context_id)
    }

    pub fn start_run_with_id(&self, context_id: ContextId, graph: DagGraph, inputs: Map<String, Value>, config: Value) -> Result<()> {
        log::info!("Starting run {} of {}.", context_id, graph.root);
        self.processor.send(Event::Init(InitEvent { context_id, graph, inputs, config }))
    }

    pub fn send(&self, event: Event) -> Result<()> {
        self.processor.send(event)
    }

    pub fn run_until_idle(&self) -> Result<usize> {
        self.processor.run_until_idle()
    }

    pub fn ready_jobs(&self, context_id: &ContextId) -> Result<Vec<Job>> {
        self.processor.with_state(|state| JobHelper::create_ready_jobs(state, self.applications.as_ref(), context_id))
    }

    pub fn mark_running(&self, context_id: &ContextId, job_id: &JobId) -> Result<()> {
        self.report(context_id, job_id, JobState::Running, Map::new())
    }

    pub fn complete_job(&self, context_id: &ContextId, job_id: &JobId, outputs: Map<String, Value>) -> Result<()> {
        self.report(context_id, job_id, JobState::Completed, outputs)
    }

    pub fn fail_job(&self, context_id: &ContextId, job_id: &JobId) -> Result<()> {
        self.report(context_id, job_id, JobState::Failed, Map::new())
    }

    fn report(&self, context_id: &ContextId, job_id: &JobId, state: JobState, outputs: Map<String, Value>) -> Result<()> {
        self.processor.send(Event::JobStatusUpdate(JobStatusEvent { context_id: context_id.clone(), job_id: job_id.clone(), state, outputs }))
    }

    pub fn outputs(&self, context_id: &ContextId) -> Result<Map<String, Value>> {
        self.processor.with_state(|state| JobHelper::fill_outputs(state, context_id))
    }

    pub fn context_status(&self, context_id: &ContextId) -> Option<ContextStatus> {
        self.processor.with_state(|state| state.contexts.find(context_id).map(|context| context.status))
    }

    pub fn job(&self, context_id: &ContextId, job_id: &JobId) -> Option<JobRecord> {
        self.processor.with_state(|state| state.jobs.find(context_id, job_id).cloned())
    }

    pub fn jobs(&self, context_id: &ContextId) -> Vec<JobRecord> {
        self.processor.with_state(|state| state.jobs.find_by_context(context_id).into_iter().cloned().collect())
    }

    pub fn variable(&self, context_id: &ContextId, job_id: &JobId, port_id: &PortId, port_type: PortType) -> Option<VariableRecord> {
        self.processor.with_state(|state| state.variables.find(context_id, job_id, port_id, port_type).cloned())
    }

    /// Starts the background consumer.
    pub fn start(&self) -> Result<()> {
        self.processor.start()
    }

    pub fn stop(&self) {
        self.processor.stop();
        self.processor.join();
    }
}
