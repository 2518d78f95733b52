use crate::domain::scatter::ScatterError;
use crate::domain::scatter::row_mapping::{RowMapping, ScatterValues};
use crate::domain::utils::id::PortId;

/// Dot product: row `i` pairs the `i`-th element of every scatter port.
#[derive(Debug, Clone)]
pub struct OneToOneMapping {
    pub(crate) values: ScatterValues,
}

impl OneToOneMapping {
    pub fn new(ports: Vec<PortId>) -> Self {
        Self { values: ScatterValues::new(ports) }
    }

    pub fn enabled_rows(&self) -> Result<Vec<RowMapping>, ScatterError> {
        let Some(lengths) = self.values.lengths() else {
            return Ok(Vec::new());
        };
        let Some(&length) = lengths.first() else {
            return Ok(Vec::new());
        };

        if let Some((port, found)) = self.values.ports().iter().zip(&lengths).find(|(_, len)| **len != length) {
            return Err(ScatterError::LengthMismatch { port: port.to_string(), expected: length, found: *found });
        }

        Ok((0..length)
            .filter(|index| !self.values.is_committed(*index))
            .filter_map(|index| self.values.row(index, &vec![index; lengths.len()]))
            .collect())
    }

    pub fn row_count(&self) -> usize {
        self.values.known_lengths().max().unwrap_or(0)
    }
}
