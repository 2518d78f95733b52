use serde::{Deserialize, Serialize};

use crate::domain::dag::PortType;
use crate::domain::utils::id::{ContextId, JobId, PortId};

/// Directed edge between two job ports of a context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkRecord {
    pub context_id: ContextId,

    pub source_job_id: JobId,
    pub source_port_id: PortId,
    pub source_type: PortType,

    pub destination_job_id: JobId,
    pub destination_port_id: PortId,
    pub destination_type: PortType,
}

impl LinkRecord {
    pub fn new(
        context_id: ContextId,
        source: (JobId, PortId, PortType),
        destination: (JobId, PortId, PortType),
    ) -> Self {
        let (source_job_id, source_port_id, source_type) = source;
        let (destination_job_id, destination_port_id, destination_type) = destination;
        Self { context_id, source_job_id, source_port_id, source_type, destination_job_id, destination_port_id, destination_type }
    }
}
