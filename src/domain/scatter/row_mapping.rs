use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::domain::scatter::ScatterError;
use crate::domain::utils::id::PortId;

/// One resolved input combination for one scattered job.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMapping {
    /// Zero based row index; the scattered job is named after `index + 1`.
    pub index: usize,
    pub values: Vec<(PortId, Value)>,
}

impl RowMapping {
    pub fn value(&self, port_id: &PortId) -> Option<&Value> {
        self.values.iter().find(|(port, _)| port == port_id).map(|(_, value)| value)
    }
}

/// Values offered so far on the scatter ports of one job, plus committed rows.
#[derive(Debug, Clone)]
pub(crate) struct ScatterValues {
    /// Scatter ports in declaration order.
    ports: Vec<PortId>,
    /// Per port the full sequence; `None` marks an element that has not arrived yet.
    values: HashMap<PortId, Vec<Option<Value>>>,
    committed: BTreeSet<usize>,
}

impl ScatterValues {
    pub(crate) fn new(ports: Vec<PortId>) -> Self {
        Self { ports, values: HashMap::new(), committed: BTreeSet::new() }
    }

    fn check_port(&self, port_id: &PortId) -> Result<(), ScatterError> {
        if self.ports.contains(port_id) { Ok(()) } else { Err(ScatterError::UnknownPort(port_id.to_string())) }
    }

    pub(crate) fn enable(&mut self, port_id: &PortId, values: Vec<Value>) -> Result<(), ScatterError> {
        self.check_port(port_id)?;
        self.values.insert(port_id.clone(), values.into_iter().map(Some).collect());
        Ok(())
    }

    pub(crate) fn enable_at(&mut self, port_id: &PortId, position: usize, total: usize, value: Value) -> Result<(), ScatterError> {
        self.check_port(port_id)?;
        if position >= total {
            return Err(ScatterError::PositionOutOfRange { port: port_id.to_string(), position, total });
        }

        let slots = self.values.entry(port_id.clone()).or_insert_with(|| vec![None; total]);
        if slots.len() != total {
            return Err(ScatterError::CardinalityChanged { port: port_id.to_string(), known: slots.len(), offered: total });
        }
        slots[position] = Some(value);
        Ok(())
    }

    pub(crate) fn is_enabled(&self, port_id: &PortId) -> bool {
        self.values.contains_key(port_id)
    }

    pub(crate) fn ports(&self) -> &[PortId] {
        &self.ports
    }

    /// Sequence length of every scatter port, once all of them are enabled.
    pub(crate) fn lengths(&self) -> Option<Vec<usize>> {
        self.ports.iter().map(|port| self.values.get(port).map(Vec::len)).collect()
    }

    pub(crate) fn known_lengths(&self) -> impl Iterator<Item = usize> + '_ {
        self.values.values().map(Vec::len)
    }

    /// Builds the row for the given element positions, if every element has arrived.
    pub(crate) fn row(&self, index: usize, positions: &[usize]) -> Option<RowMapping> {
        let mut values = Vec::with_capacity(self.ports.len());
        for (port, position) in self.ports.iter().zip(positions) {
            let value = self.values.get(port)?.get(*position)?.clone()?;
            values.push((port.clone(), value));
        }
        Some(RowMapping { index, values })
    }

    pub(crate) fn is_committed(&self, index: usize) -> bool {
        self.committed.contains(&index)
    }

    pub(crate) fn commit(&mut self, rows: &[RowMapping]) {
        self.committed.extend(rows.iter().map(|row| row.index));
    }

    pub(crate) fn committed_count(&self) -> usize {
        self.committed.len()
    }
}
