use serde::{Deserialize, Serialize};

use crate::domain::dag::{DagNode, LinkMerge, PortType};
use crate::domain::scatter::ScatterMapping;
use crate::domain::utils::id::{ContextId, JobId, NodeId, PortId, generate_external_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Ready,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobState::Pending => "PENDING",
            JobState::Ready => "READY",
            JobState::Running => "RUNNING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

/// Outstanding deliveries for one port of a job.
#[derive(Debug, Clone, PartialEq)]
pub struct PortCounter {
    pub port_id: PortId,
    pub counter: usize,
    /// Deliveries merged into the port so far.
    pub updates: usize,
    pub scatter: bool,
    pub link_merge: LinkMerge,
}

impl PortCounter {
    fn new(port_id: PortId, scatter: bool, link_merge: LinkMerge) -> Self {
        Self { port_id, counter: 0, updates: 0, scatter, link_merge }
    }

    /// Blocking ports need every expected delivery, non-blocking ones any single delivery.
    pub fn is_satisfied(&self) -> bool {
        self.counter == 0 || (!self.link_merge.is_blocking() && self.updates > 0)
    }
}

/// One node instance within a context.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: JobId,
    pub external_id: String,
    pub parent_id: Option<JobId>,
    pub context_id: ContextId,
    /// Static node this job instantiates; scattered clones share their wrapper's node.
    pub node_id: NodeId,
    pub state: JobState,

    pub is_container: bool,
    pub is_scattered: bool,
    pub is_scatter_wrapper: bool,
    /// Row index of a scattered clone within its wrapper.
    pub scatter_index: Option<usize>,
    pub scatter_mapping: Option<ScatterMapping>,

    input_counters: Vec<PortCounter>,
    output_counters: Vec<PortCounter>,
}

impl JobRecord {
    /// Creates a PENDING job for `node` with a counter slot for every declared port.
    ///
    /// Input counters start at zero and are raised once per expected delivery. Leaf
    /// outputs expect one value each; container outputs are counted per internal link.
    pub fn new(context_id: ContextId, id: JobId, parent_id: Option<JobId>, node: &DagNode) -> Self {
        let input_counters = node.input_ports.iter().map(|p| PortCounter::new(p.id.clone(), p.scatter, p.link_merge)).collect();
        let output_counters = node
            .output_ports
            .iter()
            .map(|p| {
                let mut counter = PortCounter::new(p.id.clone(), false, LinkMerge::MergeNested);
                if !node.is_container() {
                    counter.counter = 1;
                }
                counter
            })
            .collect();

        Self {
            id,
            external_id: generate_external_id(),
            parent_id,
            context_id,
            node_id: node.id.clone(),
            state: JobState::Pending,
            is_container: node.is_container(),
            is_scattered: false,
            is_scatter_wrapper: false,
            scatter_index: None,
            scatter_mapping: None,
            input_counters,
            output_counters,
        }
    }

    /// Creates the clone of `wrapper` for scatter row `index`.
    pub fn scattered(wrapper: &JobRecord, index: usize, node: &DagNode) -> Self {
        let mut job = Self::new(wrapper.context_id.clone(), wrapper.id.child(index + 1), Some(wrapper.id.clone()), node);
        job.is_scattered = true;
        job.scatter_index = Some(index);
        job
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    fn counters(&self, port_type: PortType) -> &[PortCounter] {
        match port_type {
            PortType::Input => &self.input_counters,
            PortType::Output => &self.output_counters,
        }
    }

    fn counter_mut(&mut self, port_id: &PortId, port_type: PortType) -> Option<&mut PortCounter> {
        let counters = match port_type {
            PortType::Input => &mut self.input_counters,
            PortType::Output => &mut self.output_counters,
        };
        counters.iter_mut().find(|c| &c.port_id == port_id)
    }

    pub fn port_counter(&self, port_id: &PortId, port_type: PortType) -> Option<&PortCounter> {
        self.counters(port_type).iter().find(|c| &c.port_id == port_id)
    }

    pub fn increment_port_counter(&mut self, port_id: &PortId, port_type: PortType) {
        match self.counter_mut(port_id, port_type) {
            Some(counter) => counter.counter += 1,
            None => log::warn!("Job {} has no {} port {} to count.", self.id, port_type, port_id),
        }
    }

    /// Records one delivery on the port.
    pub fn decrement_port_counter(&mut self, port_id: &PortId, port_type: PortType) {
        if let Some(counter) = self.counter_mut(port_id, port_type) {
            counter.counter = counter.counter.saturating_sub(1);
            counter.updates += 1;
        }
    }

    /// Whether the port still waits for at least one delivery.
    pub fn has_pending_deliveries(&self, port_id: &PortId, port_type: PortType) -> bool {
        self.port_counter(port_id, port_type).map(|c| c.counter > 0).unwrap_or(false)
    }

    pub fn is_input_port_ready(&self, port_id: &PortId) -> bool {
        self.port_counter(port_id, PortType::Input).map(PortCounter::is_satisfied).unwrap_or(true)
    }

    pub fn is_output_port_ready(&self, port_id: &PortId) -> bool {
        self.port_counter(port_id, PortType::Output).map(|c| c.counter == 0).unwrap_or(true)
    }

    pub fn is_scatter_port(&self, port_id: &PortId) -> bool {
        self.port_counter(port_id, PortType::Input).map(|c| c.scatter).unwrap_or(false)
    }

    /// All inputs satisfied.
    pub fn is_ready(&self) -> bool {
        self.input_counters.iter().all(PortCounter::is_satisfied)
    }

    /// All outputs delivered.
    pub fn is_completed(&self) -> bool {
        self.output_counters.iter().all(|c| c.counter == 0)
    }

    /// Sets the expected delivery count of one input port, e.g. once the number of
    /// scattered upstream siblings is known.
    pub fn reset_input_port_counter(&mut self, port_id: &PortId, expected: usize) {
        if let Some(counter) = self.counter_mut(port_id, PortType::Input) {
            counter.counter = expected;
        }
    }

    /// A scatter wrapper awaits one value per scattered child on every output.
    pub fn reset_output_port_counters(&mut self, expected: usize) {
        for counter in &mut self.output_counters {
            counter.counter = expected;
        }
    }

    pub fn input_counters(&self) -> &[PortCounter] {
        &self.input_counters
    }

    pub fn output_counters(&self) -> &[PortCounter] {
        &self.output_counters
    }
}
