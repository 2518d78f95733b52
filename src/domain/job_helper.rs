use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::application_store::ApplicationStore;
use crate::domain::dag::PortType;
use crate::domain::handler::EngineState;
use crate::domain::model::{JobRecord, JobState};
use crate::domain::utils::id::{ContextId, JobId};
use crate::error::{Error, Result};

/// A READY leaf job as handed to the task runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// External id, unique across runs.
    pub id: String,
    pub parent_id: Option<JobId>,
    pub context_id: ContextId,
    pub name: JobId,
    /// Resolved application payload, null when the node has none.
    pub app: Value,
    pub status: JobState,
    pub inputs: Map<String, Value>,
    pub config: Value,
}

pub struct JobHelper;

impl JobHelper {
    /// Runnable views of every READY leaf job in the context, in creation order.
    pub fn create_ready_jobs(state: &EngineState, applications: &dyn ApplicationStore, context_id: &ContextId) -> Result<Vec<Job>> {
        state
            .jobs
            .find_ready(context_id)
            .into_iter()
            .filter(|job| !job.is_container)
            .map(|job| Self::create_ready_job(state, applications, job))
            .collect()
    }

    pub fn create_ready_job(state: &EngineState, applications: &dyn ApplicationStore, job: &JobRecord) -> Result<Job> {
        let (_, node) = state.graphs.node(&job.context_id, &job.node_id)?;
        let context = state.contexts.get(&job.context_id)?;

        let inputs = state
            .variables
            .find_by_job(&job.context_id, &job.id, PortType::Input)
            .into_iter()
            .map(|variable| (variable.port_id.to_string(), variable.value.clone()))
            .collect();

        let app = match &node.app_hash {
            Some(hash) => applications.find(hash).unwrap_or_else(|| {
                log::warn!("Application {} of job {} is unknown.", hash, job.id);
                Value::Null
            }),
            None => Value::Null,
        };

        Ok(Job {
            id: job.external_id.clone(),
            parent_id: job.parent_id.clone(),
            context_id: job.context_id.clone(),
            name: job.id.clone(),
            app,
            status: JobState::Ready,
            inputs,
            config: context.config.clone(),
        })
    }

    /// Output values of the root job, keyed by port id.
    pub fn fill_outputs(state: &EngineState, context_id: &ContextId) -> Result<Map<String, Value>> {
        let root = state.jobs.find_root(context_id).ok_or_else(|| Error::ContextNotFound(context_id.to_string()))?;
        Ok(state
            .variables
            .find_by_job(context_id, &root.id, PortType::Output)
            .into_iter()
            .map(|variable| (variable.port_id.to_string(), variable.value.clone()))
            .collect())
    }
}
