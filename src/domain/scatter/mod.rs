//! Assignment of scatter-port values to scattered job instances ("rows").

pub mod cartesian;
pub mod one_to_one;
pub mod row_mapping;

use serde_json::Value;
use thiserror::Error;

use crate::domain::dag::{DagNode, ScatterMethod};
use crate::domain::utils::id::PortId;
use crate::error::Error;

pub use cartesian::CartesianMapping;
pub use one_to_one::OneToOneMapping;
pub use row_mapping::RowMapping;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScatterError {
    #[error("port {0} is not a scatter port")]
    UnknownPort(String),

    #[error("port {port} has {found} values, expected {expected}")]
    LengthMismatch { port: String, expected: usize, found: usize },

    #[error("position {position} is outside the {total} values of port {port}")]
    PositionOutOfRange { port: String, position: usize, total: usize },

    #[error("port {port} was announced with {known} values, now {offered}")]
    CardinalityChanged { port: String, known: usize, offered: usize },

    #[error("cross product is too large")]
    TooManyRows,
}

/// Scatter strategy of one job, selected once from the node's scatter method.
#[derive(Debug, Clone)]
pub enum ScatterMapping {
    OneToOne(OneToOneMapping),
    Cartesian(CartesianMapping),
}

impl ScatterMapping {
    /// Dot product is the default when a node scatters without naming a method.
    pub fn for_node(node: &DagNode) -> Result<Self, Error> {
        let ports = node.scatter_ports();
        match node.scatter_method {
            None | Some(ScatterMethod::DotProduct) => Ok(ScatterMapping::OneToOne(OneToOneMapping::new(ports))),
            Some(ScatterMethod::FlatCrossProduct) => Ok(ScatterMapping::Cartesian(CartesianMapping::new(ports))),
            Some(method) => Err(Error::UnsupportedScatterMethod(method.to_string())),
        }
    }

    fn values(&self) -> &row_mapping::ScatterValues {
        match self {
            ScatterMapping::OneToOne(mapping) => &mapping.values,
            ScatterMapping::Cartesian(mapping) => &mapping.values,
        }
    }

    fn values_mut(&mut self) -> &mut row_mapping::ScatterValues {
        match self {
            ScatterMapping::OneToOne(mapping) => &mut mapping.values,
            ScatterMapping::Cartesian(mapping) => &mut mapping.values,
        }
    }

    /// Records the full value sequence of a scatter port.
    pub fn enable(&mut self, port_id: &PortId, values: Vec<Value>) -> Result<(), ScatterError> {
        self.values_mut().enable(port_id, values)
    }

    /// Records a single element of a scatter port whose cardinality is already known.
    pub fn enable_at(&mut self, port_id: &PortId, position: usize, total: usize, value: Value) -> Result<(), ScatterError> {
        self.values_mut().enable_at(port_id, position, total, value)
    }

    pub fn is_enabled(&self, port_id: &PortId) -> bool {
        self.values().is_enabled(port_id)
    }

    /// Every scatter port has a known sequence.
    pub fn is_complete(&self) -> bool {
        self.values().lengths().is_some()
    }

    /// Rows whose values have all arrived and that were not committed yet.
    pub fn enabled_rows(&self) -> Result<Vec<RowMapping>, ScatterError> {
        match self {
            ScatterMapping::OneToOne(mapping) => mapping.enabled_rows(),
            ScatterMapping::Cartesian(mapping) => mapping.enabled_rows(),
        }
    }

    /// Marks rows as consumed; they are never returned again.
    pub fn commit(&mut self, rows: &[RowMapping]) {
        self.values_mut().commit(rows);
    }

    pub fn committed_count(&self) -> usize {
        self.values().committed_count()
    }

    /// Number of scattered jobs this mapping resolves to, as far as known.
    pub fn row_count(&self) -> usize {
        match self {
            ScatterMapping::OneToOne(mapping) => mapping.row_count(),
            ScatterMapping::Cartesian(mapping) => mapping.row_count(),
        }
    }
}
