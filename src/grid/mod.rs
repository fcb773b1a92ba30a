//! # Grid Binning Engine
//!
//! Projects every particle of an event onto a fixed `phi × eta` grid and
//! keeps one winner per cell.
//!
//! ```text
//!  Jet ──┐
//!  Ele ──┤  (in configured order)     phi_bin = bin(phi)   clamp
//!  Pho ──┼──► particle ──────────────► eta_bin = bin(eta)   drop if |eta| > 3
//!  Muo ──┤                                   │
//!  Tau ──┘                                   ▼
//!                              cell empty  OR  pt > stored pt  ──► overwrite
//! ```
//!
//! ## Tie-break
//!
//! Replacement needs a strictly larger pt, so on equal pt the particle
//! processed first keeps the cell: earlier object types in
//! [`GridConfig::objects`] beat later ones, earlier array positions beat
//! later ones.
//!
//! ## Occupancy
//!
//! Cells carry an explicit occupancy flag. A particle with `pt == 0.0`
//! claims an empty cell and is only displaced by a strictly larger pt.

pub mod binning;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{EventBatch, ObjectType, Particle};
use crate::Result;

pub use binning::{AxisBinning, AxisSpec, OutOfRange};

/// Feature channels per cell: `[pt, eta, phi, mass, type_id]`.
pub const GRID_FEATURES: usize = 5;

/// Fixed dataset name for stacked grids.
pub const GRID_DATASET: &str = "event_image_data";

// ============================================================================
// Configuration
// ============================================================================

/// Grid geometry and the ordered list of object types to project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub phi: AxisSpec,
    pub eta: AxisSpec,
    /// Processing order. Also the tie-break order.
    pub objects: Vec<ObjectType>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            phi: AxisSpec::phi(),
            eta: AxisSpec::eta(),
            objects: ObjectType::standard_order(),
        }
    }
}

// ============================================================================
// EventGrid
// ============================================================================

/// One event's grid, indexed `(phi_bin, eta_bin)`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventGrid {
    phi_bins: usize,
    eta_bins: usize,
    cells: Vec<[f64; GRID_FEATURES]>,
    occupied: Vec<bool>,
}

impl EventGrid {
    pub fn new(phi_bins: usize, eta_bins: usize) -> Self {
        let size = phi_bins * eta_bins;
        Self {
            phi_bins,
            eta_bins,
            cells: vec![[0.0; GRID_FEATURES]; size],
            occupied: vec![false; size],
        }
    }

    pub fn shape(&self) -> [usize; 3] {
        [self.phi_bins, self.eta_bins, GRID_FEATURES]
    }

    fn offset(&self, phi_bin: usize, eta_bin: usize) -> usize {
        phi_bin * self.eta_bins + eta_bin
    }

    /// Features of one cell. Unoccupied cells are all zero.
    pub fn cell(&self, phi_bin: usize, eta_bin: usize) -> &[f64; GRID_FEATURES] {
        &self.cells[self.offset(phi_bin, eta_bin)]
    }

    pub fn is_occupied(&self, phi_bin: usize, eta_bin: usize) -> bool {
        self.occupied[self.offset(phi_bin, eta_bin)]
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }

    /// Apply the winner-take-all rule. Returns `true` if the particle now
    /// holds the cell.
    pub fn offer(&mut self, phi_bin: usize, eta_bin: usize, particle: &Particle) -> bool {
        let at = self.offset(phi_bin, eta_bin);
        if !self.occupied[at] || particle.pt > self.cells[at][0] {
            self.cells[at] = particle.features();
            self.occupied[at] = true;
            return true;
        }
        false
    }

    /// Row-major `(phi, eta, feature)` values.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().flatten().copied()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Per-call placement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillStats {
    /// Particles that landed in a cell (winning or not).
    pub binned: usize,
    /// Particles rejected by a dropping axis.
    pub dropped: usize,
}

impl std::ops::AddAssign for FillStats {
    fn add_assign(&mut self, other: Self) {
        self.binned += other.binned;
        self.dropped += other.dropped;
    }
}

/// Validated grid configuration with precomputed bin edges.
#[derive(Debug, Clone)]
pub struct GridEngine {
    phi: AxisBinning,
    eta: AxisBinning,
    objects: Vec<ObjectType>,
}

impl GridEngine {
    pub fn new(config: &GridConfig) -> Result<Self> {
        Ok(Self {
            phi: AxisBinning::new(config.phi)?,
            eta: AxisBinning::new(config.eta)?,
            objects: config.objects.clone(),
        })
    }

    pub fn objects(&self) -> &[ObjectType] {
        &self.objects
    }

    pub fn empty_grid(&self) -> EventGrid {
        EventGrid::new(self.phi.bins(), self.eta.bins())
    }

    /// `(phi_bin, eta_bin)` for a particle, `None` if an axis drops it.
    pub fn cell_for(&self, particle: &Particle) -> Option<(usize, usize)> {
        let eta_bin = self.eta.bin(particle.eta)?;
        let phi_bin = self.phi.bin(particle.phi)?;
        Some((phi_bin, eta_bin))
    }

    /// Offer particles to `grid` in iteration order.
    pub fn fill<I>(&self, grid: &mut EventGrid, particles: I) -> FillStats
    where
        I: IntoIterator<Item = Particle>,
    {
        let mut stats = FillStats::default();
        for particle in particles {
            match self.cell_for(&particle) {
                Some((phi_bin, eta_bin)) => {
                    grid.offer(phi_bin, eta_bin, &particle);
                    stats.binned += 1;
                }
                None => stats.dropped += 1,
            }
        }
        stats
    }

    /// Build one event's grid from already-tagged particle lists, processed
    /// in the order given.
    pub fn convert_event<L, I>(&self, lists: L) -> (EventGrid, FillStats)
    where
        L: IntoIterator<Item = I>,
        I: IntoIterator<Item = Particle>,
    {
        let mut grid = self.empty_grid();
        let mut stats = FillStats::default();
        for list in lists {
            stats += self.fill(&mut grid, list);
        }
        (grid, stats)
    }

    /// Convert every event of `batch` and append the grids to `out`.
    pub fn convert_batch(&self, batch: &EventBatch, out: &mut GridStack) -> Result<FillStats> {
        let views = self
            .objects
            .iter()
            .map(|object| batch.objects(object))
            .collect::<Result<Vec<_>>>()?;

        out.reserve(batch.len());
        let mut stats = FillStats::default();
        for event in 0..batch.len() {
            let (grid, event_stats) = self.convert_event(views.iter().map(|v| v.particles(event)));
            out.push(&grid);
            stats += event_stats;
        }
        debug!(
            events = batch.len(),
            binned = stats.binned,
            dropped = stats.dropped,
            "grid batch converted"
        );
        Ok(stats)
    }
}

// ============================================================================
// GridStack: the accumulated (N, phi, eta, 5) array
// ============================================================================

/// Owned, append-only stack of event grids.
#[derive(Debug, Clone, PartialEq)]
pub struct GridStack {
    phi_bins: usize,
    eta_bins: usize,
    events: usize,
    data: Vec<f64>,
}

impl GridStack {
    pub fn new(phi_bins: usize, eta_bins: usize) -> Self {
        Self { phi_bins, eta_bins, events: 0, data: Vec::new() }
    }

    pub fn for_engine(engine: &GridEngine) -> Self {
        Self::new(engine.phi.bins(), engine.eta.bins())
    }

    fn event_size(&self) -> usize {
        self.phi_bins * self.eta_bins * GRID_FEATURES
    }

    /// Make room for `additional` more events.
    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional * self.event_size());
    }

    pub fn push(&mut self, grid: &EventGrid) {
        debug_assert_eq!(grid.shape(), [self.phi_bins, self.eta_bins, GRID_FEATURES]);
        self.data.extend(grid.values());
        self.events += 1;
    }

    pub fn len(&self) -> usize {
        self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.events, self.phi_bins, self.eta_bins, GRID_FEATURES]
    }

    /// Flat values of one event.
    pub fn event(&self, index: usize) -> Option<&[f64]> {
        let size = self.event_size();
        let start = index.checked_mul(size)?;
        self.data.get(start..start + size)
    }

    /// One cell of one event.
    pub fn cell(&self, event: usize, phi_bin: usize, eta_bin: usize) -> Option<&[f64]> {
        if phi_bin >= self.phi_bins || eta_bin >= self.eta_bins {
            return None;
        }
        let start = (phi_bin * self.eta_bins + eta_bin) * GRID_FEATURES;
        self.event(event)?.get(start..start + GRID_FEATURES)
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }
}
