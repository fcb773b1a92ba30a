//! Flat per-event tables: event multiplicities and padded jet attributes.

use serde::{Deserialize, Serialize};

use crate::model::{attribute_column, count_column, EventBatch};
use crate::{Error, Result};

/// Fixed dataset name for the multiplicity table.
pub const MULTIPLICITY_DATASET: &str = "basic_event_data";

/// Fixed dataset name for the jet table.
pub const JET_DATASET: &str = "jet_event_data";

/// Per-event scalar branches of the multiplicity table, in column order.
pub const MULTIPLICITY_COLUMNS: [&str; 8] = [
    "nJet",
    "nMuon",
    "nElectron",
    "nPhoton",
    "nTau",
    "nFatJet",
    "nboostedTau",
    "PuppiMET_pt",
];

/// Per-jet attributes of the jet table, in column order.
pub const JET_ATTRIBUTES: [&str; 17] = [
    "pt",
    "eta",
    "phi",
    "mass",
    "nConstituents",
    "nElectrons",
    "nMuons",
    "chHEF",
    "neHEF",
    "btagDeepB",
    "btagDeepCvB",
    "btagDeepCvL",
    "area",
    "btagDeepFlavB",
    "btagDeepFlavCvB",
    "btagDeepFlavCvL",
    "btagDeepFlavQG",
];

// ============================================================================
// Table
// ============================================================================

/// Append-only `(rows, width)` matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    width: usize,
    rows: usize,
    data: Vec<f64>,
}

impl Table {
    pub fn new(width: usize) -> Self {
        Self { width, rows: 0, data: Vec::new() }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn reserve(&mut self, rows: usize) {
        self.data.reserve(rows * self.width);
    }

    pub fn push_row(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.width {
            return Err(Error::ShapeMismatch { column: "<row>".into(), expected: self.width, got: row.len() });
        }
        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        let start = index.checked_mul(self.width)?;
        self.data.get(start..start + self.width)
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.rows, self.width]
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }
}

// ============================================================================
// Multiplicities
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplicityConfig {
    pub columns: Vec<String>,
}

impl Default for MultiplicityConfig {
    fn default() -> Self {
        Self { columns: MULTIPLICITY_COLUMNS.iter().map(|c| c.to_string()).collect() }
    }
}

impl MultiplicityConfig {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// One row per event: each configured count or scalar branch.
    pub fn convert_batch(&self, batch: &EventBatch, out: &mut Table) -> Result<()> {
        out.reserve(batch.len());
        let mut row = vec![0.0; self.width()];
        for event in 0..batch.len() {
            for (slot, name) in row.iter_mut().zip(&self.columns) {
                *slot = batch.scalar(name, event)?;
            }
            out.push_row(&row)?;
        }
        Ok(())
    }
}

// ============================================================================
// Jets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JetTableConfig {
    pub collection: String,
    /// Jets kept per event in array order; missing slots are zero.
    pub max_jets: usize,
    pub attributes: Vec<String>,
}

impl Default for JetTableConfig {
    fn default() -> Self {
        Self {
            collection: "Jet".into(),
            max_jets: 8,
            attributes: JET_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl JetTableConfig {
    /// `max_jets × attributes`, flattened jet-major.
    pub fn width(&self) -> usize {
        self.max_jets * self.attributes.len()
    }

    pub fn convert_batch(&self, batch: &EventBatch, out: &mut Table) -> Result<()> {
        let counts = batch.counts(&count_column(&self.collection))?;
        let columns = self
            .attributes
            .iter()
            .map(|a| {
                let name = attribute_column(&self.collection, a);
                batch.jagged(&name).map(|column| (name, column))
            })
            .collect::<Result<Vec<_>>>()?;

        out.reserve(batch.len());
        let stride = self.attributes.len();
        let mut row = vec![0.0; self.width()];
        for (event, &count) in counts.iter().enumerate() {
            row.fill(0.0);
            let kept = (count as usize).min(self.max_jets);
            for (a, (name, column)) in columns.iter().enumerate() {
                let values = column.row(event).unwrap_or(&[]);
                if values.len() != count as usize {
                    return Err(Error::ShapeMismatch {
                        column: name.clone(),
                        expected: count as usize,
                        got: values.len(),
                    });
                }
                for (jet, &value) in values.iter().take(kept).enumerate() {
                    row[jet * stride + a] = value;
                }
            }
            out.push_row(&row)?;
        }
        Ok(())
    }
}
