use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::dag::{DagPort, LinkMerge, PortType};
use crate::domain::utils::id::{ContextId, JobId, PortId};

/// Accumulated value of one (job, port) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableRecord {
    pub context_id: ContextId,
    pub job_id: JobId,
    pub port_id: PortId,
    pub port_type: PortType,
    pub link_merge: LinkMerge,

    pub value: Value,
    /// Value has been coerced into a sequence.
    pub is_wrapped: bool,
    /// Number of scattered siblings sharing this logical port.
    pub globals_count: usize,
    pub times_updated: usize,
    /// Still holding the initial (default or null) value.
    pub is_default: bool,
}

impl VariableRecord {
    pub fn new(context_id: ContextId, job_id: JobId, port: &DagPort) -> Self {
        Self {
            context_id,
            job_id,
            port_id: port.id.clone(),
            port_type: port.port_type,
            link_merge: port.link_merge,
            value: port.default.clone().unwrap_or(Value::Null),
            is_wrapped: false,
            globals_count: 0,
            times_updated: 0,
            is_default: true,
        }
    }

    /// Merges one delivery.
    ///
    /// The first delivery replaces the default. Later ones turn the value into a
    /// sequence: nested merge appends each delivery as one element, flattened merge
    /// splices sequences in element by element.
    pub fn add_value(&mut self, value: Value) {
        if self.is_default {
            self.value = value;
            self.is_default = false;
            self.times_updated += 1;
            return;
        }

        if !self.is_wrapped {
            let current = self.value.take();
            self.value = match self.link_merge {
                LinkMerge::MergeNested => Value::Array(vec![current]),
                LinkMerge::MergeFlattened => Value::Array(flatten(current)),
            };
            self.is_wrapped = true;
        }

        if let Value::Array(items) = &mut self.value {
            match self.link_merge {
                LinkMerge::MergeNested => items.push(value),
                LinkMerge::MergeFlattened => items.extend(flatten(value)),
            }
        }
        self.times_updated += 1;
    }

    /// Places `value` at `position` of the aggregate sequence of a scattered port.
    pub fn set_at(&mut self, position: usize, value: Value) {
        let length = self.globals_count.max(position + 1);
        let mut items = match (self.is_default, self.value.take()) {
            (false, Value::Array(items)) => items,
            _ => Vec::with_capacity(length),
        };
        if items.len() < length {
            items.resize(length, Value::Null);
        }
        items[position] = value;

        self.value = Value::Array(items);
        self.is_wrapped = true;
        self.is_default = false;
        self.times_updated += 1;
    }
}

/// Splits a value into scatter elements; scalars become a single element.
pub fn as_sequence(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn flatten(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}
