//! Equal-width binning of one continuous coordinate.
//!
//! Bins are half-open `[edge_i, edge_{i+1})`. A value on the upper edge,
//! or any value past it, lands in the last bin after clamping.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What happens to a value outside `[lo, hi]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRange {
    /// The particle is excluded from the grid.
    Drop,
    /// The value is pulled into the nearest edge bin.
    Clamp,
}

/// Serializable description of one grid axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub lo: f64,
    pub hi: f64,
    pub bins: usize,
    pub out_of_range: OutOfRange,
}

impl AxisSpec {
    /// 16 bins over `[-3.0, 3.0]`, out-of-range values dropped.
    pub const fn eta() -> Self {
        Self { lo: -3.0, hi: 3.0, bins: 16, out_of_range: OutOfRange::Drop }
    }

    /// 16 bins over `[-3.1415, 3.1415]`, out-of-range values clamped.
    pub const fn phi() -> Self {
        Self { lo: -3.1415, hi: 3.1415, bins: 16, out_of_range: OutOfRange::Clamp }
    }
}

/// Precomputed bin edges for an [`AxisSpec`].
#[derive(Debug, Clone, PartialEq)]
pub struct AxisBinning {
    spec: AxisSpec,
    edges: Vec<f64>,
}

impl AxisBinning {
    pub fn new(spec: AxisSpec) -> Result<Self> {
        if spec.bins == 0 {
            return Err(Error::Config("axis must have at least one bin".into()));
        }
        if !(spec.lo < spec.hi) {
            return Err(Error::Config(format!(
                "axis range [{}, {}] is empty",
                spec.lo, spec.hi
            )));
        }
        let step = (spec.hi - spec.lo) / spec.bins as f64;
        let mut edges: Vec<f64> = (0..spec.bins).map(|i| spec.lo + i as f64 * step).collect();
        edges.push(spec.hi);
        Ok(Self { spec, edges })
    }

    pub fn bins(&self) -> usize {
        self.spec.bins
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Bin index for `x`, or `None` when the axis drops out-of-range values
    /// and `x` lies strictly outside `[lo, hi]`.
    pub fn bin(&self, x: f64) -> Option<usize> {
        if self.spec.out_of_range == OutOfRange::Drop && (x < self.spec.lo || x > self.spec.hi) {
            return None;
        }
        Some(self.index(x))
    }

    /// Unclamped edge search followed by the `[0, bins - 1]` clamp.
    fn index(&self, x: f64) -> usize {
        let last = self.spec.bins - 1;
        // NaN sorts after every edge.
        if x.is_nan() {
            return last;
        }
        let at_or_below = self.edges.partition_point(|&edge| edge <= x);
        at_or_below.saturating_sub(1).min(last)
    }
}
