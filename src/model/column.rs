//! Named per-event arrays (branches) inside a batch.

use serde::{Deserialize, Serialize};

use super::Jagged;
use crate::{Error, Result};

/// One branch of an event batch.
///
/// Covers the three shapes the converters read:
/// - `Count`: one non-negative integer per event (`nJet`)
/// - `Scalar`: one float per event (`PuppiMET_pt`)
/// - `Jagged`: a variable-length float row per event (`Jet_pt`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Column {
    Count(Vec<u32>),
    Scalar(Vec<f64>),
    Jagged(Jagged<f64>),
}

impl Column {
    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Count(_) => "COUNT",
            Column::Scalar(_) => "SCALAR",
            Column::Jagged(_) => "JAGGED",
        }
    }

    /// Number of events covered by this column.
    pub fn len(&self) -> usize {
        match self {
            Column::Count(v) => v.len(),
            Column::Scalar(v) => v.len(),
            Column::Jagged(j) => j.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_counts(&self) -> Option<&[u32]> {
        match self {
            Column::Count(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_scalars(&self) -> Option<&[f64]> {
        match self {
            Column::Scalar(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_jagged(&self) -> Option<&Jagged<f64>> {
        match self {
            Column::Jagged(j) => Some(j),
            _ => None,
        }
    }

    /// Per-event value as a float, for `Count` and `Scalar` columns.
    pub fn scalar_at(&self, event: usize) -> Option<f64> {
        match self {
            Column::Count(v) => v.get(event).map(|&c| f64::from(c)),
            Column::Scalar(v) => v.get(event).copied(),
            Column::Jagged(_) => None,
        }
    }

    /// Append the events of `other` to this column. Both must have the
    /// same shape.
    pub fn append(&mut self, name: &str, other: Column) -> Result<()> {
        match (self, other) {
            (Column::Count(a), Column::Count(b)) => a.extend(b),
            (Column::Scalar(a), Column::Scalar(b)) => a.extend(b),
            (Column::Jagged(a), Column::Jagged(b)) => a.extend_rows(b),
            (this, other) => {
                return Err(Error::ColumnType {
                    column: name.to_string(),
                    expected: this.type_name(),
                    got: other.type_name(),
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<u32>> for Column {
    fn from(v: Vec<u32>) -> Self {
        Column::Count(v)
    }
}

impl From<Vec<f64>> for Column {
    fn from(v: Vec<f64>) -> Self {
        Column::Scalar(v)
    }
}

impl From<Jagged<f64>> for Column {
    fn from(j: Jagged<f64>) -> Self {
        Column::Jagged(j)
    }
}

impl From<Vec<Vec<f64>>> for Column {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        Column::Jagged(rows.into_iter().collect())
    }
}
