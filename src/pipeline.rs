//! Batch-sequential conversion driver.
//!
//! Pulls one batch, converts all of it, appends to the output buffer, then
//! pulls the next. The event ceiling is checked only between batches, so
//! the last batch may carry the total past it.

use tracing::{debug, info};

use crate::graph::{EventGraph, GraphEngine};
use crate::grid::{GridEngine, GridStack};
use crate::model::EventBatch;
use crate::source::BatchSource;
use crate::tables::{JetTableConfig, MultiplicityConfig, Table};
use crate::Result;

/// What one batch contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Output entries appended (grids, graphs or table rows).
    pub produced: usize,
    /// Events consumed without producing output.
    pub skipped: usize,
    /// Particles excluded during conversion.
    pub dropped_particles: usize,
    /// Graph nodes appended.
    pub nodes: usize,
}

/// Totals for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    /// Events pulled from the source.
    pub events: usize,
    pub produced: usize,
    pub skipped: usize,
    pub dropped_particles: usize,
    pub nodes: usize,
    /// The ceiling ended the run before the source was exhausted.
    pub hit_ceiling: bool,
}

impl RunSummary {
    /// Mean graph nodes per produced graph.
    pub fn mean_nodes(&self) -> Option<f64> {
        (self.produced > 0 && self.nodes > 0).then(|| self.nodes as f64 / self.produced as f64)
    }

    fn record(&mut self, events: usize, report: BatchReport) {
        self.batches += 1;
        self.events += events;
        self.produced += report.produced;
        self.skipped += report.skipped;
        self.dropped_particles += report.dropped_particles;
        self.nodes += report.nodes;
    }
}

/// One representation the driver can accumulate.
pub trait Converter {
    type Output;

    /// Pipeline name for log lines.
    fn name(&self) -> &'static str;

    /// Empty output buffer.
    fn new_output(&self) -> Self::Output;

    /// Convert every event of `batch`, appending to `out`.
    fn convert_batch(&self, batch: &EventBatch, out: &mut Self::Output) -> Result<BatchReport>;
}

/// Drain `source` through `converter`.
///
/// Stops when the source is exhausted or, checked after each batch, once
/// at least `limit` events have been pulled. Any error aborts the run.
pub fn run<S, C>(source: &mut S, converter: &C, limit: Option<usize>) -> Result<(C::Output, RunSummary)>
where
    S: BatchSource + ?Sized,
    C: Converter + ?Sized,
{
    let mut output = converter.new_output();
    let mut summary = RunSummary::default();
    info!(pipeline = converter.name(), source = %source.describe(), ?limit, "conversion started");

    while let Some(batch) = source.next_batch()? {
        info!(pipeline = converter.name(), batch = summary.batches, events = batch.len(), "processing batch");
        let report = converter.convert_batch(&batch, &mut output)?;
        summary.record(batch.len(), report);
        debug!(?report, total_events = summary.events, "batch appended");

        if limit.is_some_and(|limit| summary.events >= limit) {
            summary.hit_ceiling = true;
            break;
        }
    }

    info!(
        pipeline = converter.name(),
        batches = summary.batches,
        events = summary.events,
        produced = summary.produced,
        skipped = summary.skipped,
        "conversion finished"
    );
    Ok((output, summary))
}

// ============================================================================
// Converter impls
// ============================================================================

impl Converter for GridEngine {
    type Output = GridStack;

    fn name(&self) -> &'static str {
        "grid"
    }

    fn new_output(&self) -> GridStack {
        GridStack::for_engine(self)
    }

    fn convert_batch(&self, batch: &EventBatch, out: &mut GridStack) -> Result<BatchReport> {
        let stats = GridEngine::convert_batch(self, batch, out)?;
        Ok(BatchReport { produced: batch.len(), dropped_particles: stats.dropped, ..BatchReport::default() })
    }
}

impl Converter for GraphEngine {
    type Output = Vec<EventGraph>;

    fn name(&self) -> &'static str {
        "graph"
    }

    fn new_output(&self) -> Vec<EventGraph> {
        Vec::new()
    }

    fn convert_batch(&self, batch: &EventBatch, out: &mut Vec<EventGraph>) -> Result<BatchReport> {
        let stats = GraphEngine::convert_batch(self, batch, out)?;
        Ok(BatchReport {
            produced: stats.graphs,
            skipped: stats.skipped_empty,
            nodes: stats.nodes,
            ..BatchReport::default()
        })
    }
}

impl Converter for MultiplicityConfig {
    type Output = Table;

    fn name(&self) -> &'static str {
        "basic"
    }

    fn new_output(&self) -> Table {
        Table::new(self.width())
    }

    fn convert_batch(&self, batch: &EventBatch, out: &mut Table) -> Result<BatchReport> {
        MultiplicityConfig::convert_batch(self, batch, out)?;
        Ok(BatchReport { produced: batch.len(), ..BatchReport::default() })
    }
}

impl Converter for JetTableConfig {
    type Output = Table;

    fn name(&self) -> &'static str {
        "jets"
    }

    fn new_output(&self) -> Table {
        Table::new(self.width())
    }

    fn convert_batch(&self, batch: &EventBatch, out: &mut Table) -> Result<BatchReport> {
        JetTableConfig::convert_batch(self, batch, out)?;
        Ok(BatchReport { produced: batch.len(), ..BatchReport::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfig;
    use crate::source::MemorySource;

    fn empty_events(n: usize) -> EventBatch {
        let mut batch = EventBatch::new(n);
        for object in crate::model::ObjectType::standard_order() {
            batch.insert(object.count_column(), vec![0u32; n]).unwrap();
            for attribute in ["pt", "eta", "phi", "mass"] {
                batch.insert(object.column(attribute), vec![Vec::<f64>::new(); n]).unwrap();
            }
        }
        batch
    }

    #[test]
    fn test_ceiling_overshoots_to_batch_boundary() {
        let engine = GridEngine::new(&GridConfig::default()).unwrap();
        let mut source = MemorySource::new((0..5).map(|_| empty_events(7)));
        let (grids, summary) = run(&mut source, &engine, Some(10)).unwrap();
        assert_eq!(grids.len(), 14);
        assert_eq!(summary.batches, 2);
        assert!(summary.hit_ceiling);
        assert_eq!(source.pulled(), 2);
    }

    #[test]
    fn test_no_limit_drains_source() {
        let engine = GridEngine::new(&GridConfig::default()).unwrap();
        let mut source = MemorySource::new((0..3).map(|_| empty_events(4)));
        let (grids, summary) = run(&mut source, &engine, None).unwrap();
        assert_eq!(grids.len(), 12);
        assert!(!summary.hit_ceiling);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn test_error_aborts_run() {
        let engine = GridEngine::new(&GridConfig::default()).unwrap();
        let mut source = MemorySource::new([empty_events(2), EventBatch::new(3)]);
        assert!(run(&mut source, &engine, None).is_err());
    }
}
