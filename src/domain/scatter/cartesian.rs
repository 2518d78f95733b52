use crate::domain::scatter::ScatterError;
use crate::domain::scatter::row_mapping::{RowMapping, ScatterValues};
use crate::domain::utils::id::PortId;

/// Flat cross product over all scatter ports.
///
/// Rows are numbered in row-major order: the first declared port varies slowest
/// and the last declared port fastest, so with `A=[a1,a2]` and `B=[b1,b2,b3]`
/// row 0 is `(a1,b1)`, row 2 is `(a1,b3)` and row 3 is `(a2,b1)`.
#[derive(Debug, Clone)]
pub struct CartesianMapping {
    pub(crate) values: ScatterValues,
}

impl CartesianMapping {
    pub fn new(ports: Vec<PortId>) -> Self {
        Self { values: ScatterValues::new(ports) }
    }

    pub fn enabled_rows(&self) -> Result<Vec<RowMapping>, ScatterError> {
        let Some(lengths) = self.values.lengths() else {
            return Ok(Vec::new());
        };
        if lengths.is_empty() {
            return Ok(Vec::new());
        }

        let total = lengths.iter().try_fold(1usize, |acc, len| acc.checked_mul(*len)).ok_or(ScatterError::TooManyRows)?;
        let mut rows = Vec::new();
        for index in (0..total).filter(|index| !self.values.is_committed(*index)) {
            let positions = positions(index, &lengths);
            if let Some(row) = self.values.row(index, &positions) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    /// Product of the sequence lengths, zero until every scatter port is known.
    pub fn row_count(&self) -> usize {
        self.values.lengths().map(|lengths| lengths.iter().product()).unwrap_or(0)
    }
}

/// Decomposes a row index into per-port element positions, last port fastest.
fn positions(index: usize, lengths: &[usize]) -> Vec<usize> {
    let mut positions = vec![0; lengths.len()];
    let mut remainder = index;
    for (slot, length) in lengths.iter().enumerate().rev() {
        positions[slot] = remainder % length;
        remainder /= length;
    }
    positions
}
