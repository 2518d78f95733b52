use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::dag::DagGraph;
use crate::domain::model::{ContextStatus, JobState};
use crate::domain::utils::id::{ContextId, JobId, PortId};

/// Everything the event processor can dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Init(InitEvent),
    InputUpdate(InputUpdateEvent),
    OutputUpdate(OutputUpdateEvent),
    JobStatusUpdate(JobStatusEvent),
    ContextStatusUpdate(ContextStatusEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Init,
    InputUpdate,
    OutputUpdate,
    JobStatusUpdate,
    ContextStatusUpdate,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventType::Init => "INIT",
            EventType::InputUpdate => "INPUT_UPDATE",
            EventType::OutputUpdate => "OUTPUT_UPDATE",
            EventType::JobStatusUpdate => "JOB_STATUS_UPDATE",
            EventType::ContextStatusUpdate => "CONTEXT_STATUS_UPDATE",
        };
        write!(f, "{}", name)
    }
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Init(_) => EventType::Init,
            Event::InputUpdate(_) => EventType::InputUpdate,
            Event::OutputUpdate(_) => EventType::OutputUpdate,
            Event::JobStatusUpdate(_) => EventType::JobStatusUpdate,
            Event::ContextStatusUpdate(_) => EventType::ContextStatusUpdate,
        }
    }

    pub fn context_id(&self) -> &ContextId {
        match self {
            Event::Init(e) => &e.context_id,
            Event::InputUpdate(e) => &e.context_id,
            Event::OutputUpdate(e) => &e.context_id,
            Event::JobStatusUpdate(e) => &e.context_id,
            Event::ContextStatusUpdate(e) => &e.context_id,
        }
    }
}

/// Starts a run: registers the graph and instantiates the root job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitEvent {
    pub context_id: ContextId,
    pub graph: DagGraph,
    pub inputs: Map<String, Value>,
    pub config: Value,
}

/// Delivers a value to an input port of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputUpdateEvent {
    pub context_id: ContextId,
    pub job_id: JobId,
    pub port_id: PortId,
    pub value: Value,

    /// Produced by scatter expansion; the value was already counted.
    pub from_scatter: bool,
    /// One element of a scattered upstream output, sent before its siblings finished.
    pub look_ahead: bool,
    /// Enables one element of a scatter port on the target job itself.
    pub in_place: bool,
    /// Number of scattered siblings behind this value, when known.
    pub scattered_nodes: Option<usize>,
    /// Element position for look-ahead deliveries.
    pub position: Option<usize>,
}

impl InputUpdateEvent {
    pub fn new(context_id: ContextId, job_id: JobId, port_id: PortId, value: Value) -> Self {
        Self { context_id, job_id, port_id, value, from_scatter: false, look_ahead: false, in_place: false, scattered_nodes: None, position: None }
    }

    /// Re-delivery of element `position` of a scatter sequence to its own job.
    pub fn in_place(context_id: ContextId, job_id: JobId, port_id: PortId, value: Value, position: usize, total: usize) -> Self {
        Self {
            from_scatter: true,
            in_place: true,
            scattered_nodes: Some(total),
            position: Some(position),
            ..Self::new(context_id, job_id, port_id, value)
        }
    }

    /// Early delivery of element `position` out of `total` scattered siblings.
    pub fn look_ahead(context_id: ContextId, job_id: JobId, port_id: PortId, value: Value, position: usize, total: usize) -> Self {
        Self {
            from_scatter: true,
            look_ahead: true,
            scattered_nodes: Some(total),
            position: Some(position),
            ..Self::new(context_id, job_id, port_id, value)
        }
    }
}

/// Delivers a value to an output port of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputUpdateEvent {
    pub context_id: ContextId,
    pub job_id: JobId,
    pub port_id: PortId,
    pub value: Value,
    /// Sent by a scattered clone to its wrapper.
    pub from_scatter: bool,
    /// Row index of the sending clone.
    pub position: Option<usize>,
}

impl OutputUpdateEvent {
    pub fn new(context_id: ContextId, job_id: JobId, port_id: PortId, value: Value) -> Self {
        Self { context_id, job_id, port_id, value, from_scatter: false, position: None }
    }
}

/// Status report of a leaf job from the task execution layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusEvent {
    pub context_id: ContextId,
    pub job_id: JobId,
    pub state: JobState,
    #[serde(default)]
    pub outputs: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextStatusEvent {
    pub context_id: ContextId,
    pub status: ContextStatus,
}

impl From<InputUpdateEvent> for Event {
    fn from(event: InputUpdateEvent) -> Self {
        Event::InputUpdate(event)
    }
}

impl From<OutputUpdateEvent> for Event {
    fn from(event: OutputUpdateEvent) -> Self {
        Event::OutputUpdate(event)
    }
}

impl From<ContextStatusEvent> for Event {
    fn from(event: ContextStatusEvent) -> Self {
        Event::ContextStatusUpdate(event)
    }
}
