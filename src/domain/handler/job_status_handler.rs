use serde_json::Value;

use crate::domain::event::{ContextStatusEvent, Event, JobStatusEvent, OutputUpdateEvent};
use crate::domain::handler::output_handler::mark_completed;
use crate::domain::handler::{EngineState, EventHandler};
use crate::domain::model::{ContextStatus, JobRecord, JobState};
use crate::error::{Error, Result};

/// Applies status reports of leaf jobs coming back from the task runner.
#[derive(Debug, Default)]
pub struct JobStatusHandler;

impl EventHandler<JobStatusEvent> for JobStatusHandler {
    fn handle(&self, event: &JobStatusEvent, state: &mut EngineState, outbox: &mut Vec<Event>) -> Result<()> {
        let mut job = state.jobs.get(&event.context_id, &event.job_id)?.clone();

        match event.state {
            JobState::Running => {
                check_transition(&job, &[JobState::Ready], event.state)?;
                job.state = JobState::Running;
            }
            JobState::Completed => {
                check_transition(&job, &[JobState::Ready, JobState::Running], event.state)?;
                let (_, node) = state.graphs.node(&event.context_id, &job.node_id)?;

                job.state = JobState::Running;
                for port in &node.output_ports {
                    let value = event.outputs.get(port.id.as_str()).cloned().unwrap_or(Value::Null);
                    outbox.push(OutputUpdateEvent::new(event.context_id.clone(), job.id.clone(), port.id.clone(), value).into());
                }
                if node.output_ports.is_empty() {
                    mark_completed(&mut job, outbox);
                }
            }
            JobState::Failed => {
                job.state = JobState::Failed;
                log::error!("Job {} failed in context {}.", job.id, event.context_id);
                outbox.push(ContextStatusEvent { context_id: event.context_id.clone(), status: ContextStatus::Failed }.into());
            }
            JobState::Pending | JobState::Ready => check_transition(&job, &[], event.state)?,
        }

        state.jobs.update(job)
    }
}

fn check_transition(job: &JobRecord, allowed: &[JobState], to: JobState) -> Result<()> {
    if allowed.contains(&job.state) {
        Ok(())
    } else {
        Err(Error::InvalidTransition { job_id: job.id.to_string(), from: job.state.to_string(), to: to.to_string() })
    }
}
