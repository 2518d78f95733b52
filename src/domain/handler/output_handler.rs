use crate::domain::dag::PortType;
use crate::domain::event::{ContextStatusEvent, Event, InputUpdateEvent, OutputUpdateEvent};
use crate::domain::handler::{EngineState, EventHandler};
use crate::domain::model::{ContextStatus, JobRecord, JobState, LinkRecord, VariableRecord};
use crate::error::Result;

/// Collects output values and forwards them once a port has seen every expected value.
#[derive(Debug, Default)]
pub struct OutputEventHandler;

impl EventHandler<OutputUpdateEvent> for OutputEventHandler {
    fn handle(&self, event: &OutputUpdateEvent, state: &mut EngineState, outbox: &mut Vec<Event>) -> Result<()> {
        let context_id = &event.context_id;
        let port_id = &event.port_id;

        let mut job = state.jobs.get(context_id, &event.job_id)?.clone();
        let mut variable = state.variables.get(context_id, &event.job_id, port_id, PortType::Output)?.clone();

        if !job.has_pending_deliveries(port_id, PortType::Output) {
            log::warn!("Output {} of job {} is already complete, ignoring value.", port_id, job.id);
            return Ok(());
        }

        match event.position {
            Some(position) if job.is_scatter_wrapper => variable.set_at(position, event.value.clone()),
            _ => variable.add_value(event.value.clone()),
        }
        job.decrement_port_counter(port_id, PortType::Output);

        let links = state.links.find_by_source(context_id, &job.id, port_id, PortType::Output);
        if job.is_scatter_wrapper {
            if let Some(position) = event.position {
                for link in links.iter().filter(|link| is_look_ahead_link(state, link)) {
                    outbox.push(
                        InputUpdateEvent::look_ahead(
                            context_id.clone(),
                            link.destination_job_id.clone(),
                            link.destination_port_id.clone(),
                            event.value.clone(),
                            position,
                            variable.globals_count,
                        )
                        .into(),
                    );
                }
            }
        }

        if job.is_output_port_ready(port_id) {
            for link in &links {
                // Scattered aggregates already reached look-ahead consumers element by element.
                if variable.globals_count > 0 && job.is_scatter_wrapper && is_look_ahead_link(state, link) {
                    continue;
                }
                outbox.push(forward(&job, &variable, link));
            }
        }

        if job.is_completed() {
            mark_completed(&mut job, outbox);
        }

        state.variables.update(variable)?;
        state.jobs.update(job)
    }
}

/// A link from a wrapper output straight into the only incoming link of a scatter
/// port on a job that was not itself cloned.
fn is_look_ahead_link(state: &EngineState, link: &LinkRecord) -> bool {
    if link.destination_type != PortType::Input {
        return false;
    }
    let Some(destination) = state.jobs.find(&link.context_id, &link.destination_job_id) else {
        return false;
    };
    !destination.is_scattered
        && destination.is_scatter_port(&link.destination_port_id)
        && state.links.count_by_destination(&link.context_id, &link.destination_job_id, &link.destination_port_id, PortType::Input) == 1
}

fn forward(job: &JobRecord, variable: &VariableRecord, link: &LinkRecord) -> Event {
    let value = variable.value.clone();
    match link.destination_type {
        PortType::Input => {
            InputUpdateEvent::new(job.context_id.clone(), link.destination_job_id.clone(), link.destination_port_id.clone(), value).into()
        }
        PortType::Output => OutputUpdateEvent {
            from_scatter: job.is_scattered,
            position: if job.is_scattered { job.scatter_index } else { None },
            ..OutputUpdateEvent::new(job.context_id.clone(), link.destination_job_id.clone(), link.destination_port_id.clone(), value)
        }
        .into(),
    }
}

/// Completes a job; completing the root completes its context.
pub(crate) fn mark_completed(job: &mut JobRecord, outbox: &mut Vec<Event>) {
    if job.state == JobState::Completed {
        return;
    }
    job.state = JobState::Completed;
    log::info!("Job {} completed.", job.id);

    if job.is_root() {
        outbox.push(ContextStatusEvent { context_id: job.context_id.clone(), status: ContextStatus::Completed }.into());
    }
}
