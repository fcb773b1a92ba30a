//! # Graph Construction Engine
//!
//! Turns one event's flat candidate list into a node-feature matrix and a
//! directed k-nearest-neighbor edge list.
//!
//! ```text
//! candidates ──► keep the `max_nodes` highest pt ──► order by ascending pt
//!                                                         │
//!                      node i = i-th row of this order ◄──┘
//!                                                         │
//!        k-NN over (eta, phi), self excluded  ◄───────────┘
//!                      │
//!                      ▼
//!        edges: i → each of its min(n, k+1) − 1 nearest other nodes
//! ```
//!
//! An event without candidates has no graph; callers skip it.

pub mod knn;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{EventBatch, Particle};
use crate::{Error, Result};

/// Node feature columns: `[pt, eta, phi, mass, pdg_id]`.
pub const GRAPH_FEATURES: usize = 5;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Collection prefix in the input batches.
    pub collection: String,
    /// Per-candidate identity branch, stored in the last feature column.
    pub id_attribute: String,
    /// Candidates kept per event, highest pt first.
    pub max_nodes: usize,
    /// Neighbors per node before small-event adaptation.
    pub k: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            collection: "PFCands".into(),
            id_attribute: "pdgId".into(),
            max_nodes: 40,
            k: 3,
        }
    }
}

// ============================================================================
// EventGraph
// ============================================================================

/// Directed edges as parallel source and destination lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeIndex {
    pub src: Vec<usize>,
    pub dst: Vec<usize>,
}

impl EdgeIndex {
    pub fn push(&mut self, src: usize, dst: usize) {
        self.src.push(src);
        self.dst.push(dst);
    }

    pub fn len(&self) -> usize {
        self.src.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.src.iter().copied().zip(self.dst.iter().copied())
    }
}

/// One event as a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventGraph {
    pub nodes: Vec<[f64; GRAPH_FEATURES]>,
    pub edges: EdgeIndex,
}

impl EventGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of edges leaving `node`.
    pub fn out_degree(&self, node: usize) -> usize {
        self.edges.src.iter().filter(|&&s| s == node).count()
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Per-batch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphBatchStats {
    pub graphs: usize,
    pub skipped_empty: usize,
    pub nodes: usize,
}

#[derive(Debug, Clone)]
pub struct GraphEngine {
    config: GraphConfig,
}

impl GraphEngine {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        if config.max_nodes == 0 {
            return Err(Error::Config("graph max_nodes must be at least 1".into()));
        }
        Ok(Self { config: config.clone() })
    }

    /// Keep the `max_nodes` highest-pt candidates, ordered by ascending pt.
    pub fn select(&self, mut candidates: Vec<Particle>) -> Vec<Particle> {
        candidates.sort_by(|a, b| b.pt.total_cmp(&a.pt));
        candidates.truncate(self.config.max_nodes);
        candidates.reverse();
        candidates
    }

    /// Build the graph for one event.
    ///
    /// # Errors
    /// `Error::EmptyEvent` when `candidates` is empty.
    pub fn build(&self, candidates: Vec<Particle>) -> Result<EventGraph> {
        if candidates.is_empty() {
            return Err(Error::EmptyEvent);
        }
        let selected = self.select(candidates);
        let points: Vec<[f64; 2]> = selected.iter().map(|p| [p.eta, p.phi]).collect();

        let mut edges = EdgeIndex::default();
        for (node, neighbors) in knn::nearest_neighbors(&points, self.config.k).iter().enumerate() {
            for &other in neighbors {
                edges.push(node, other);
            }
        }

        Ok(EventGraph {
            nodes: selected.iter().map(Particle::features).collect(),
            edges,
        })
    }

    /// Build graphs for every non-empty event of `batch`, appending to `out`.
    pub fn convert_batch(&self, batch: &EventBatch, out: &mut Vec<EventGraph>) -> Result<GraphBatchStats> {
        let view = batch.candidates(&self.config.collection, &self.config.id_attribute)?;
        out.reserve(batch.len());

        let mut stats = GraphBatchStats::default();
        for event in 0..batch.len() {
            if view.count(event) == 0 {
                debug!(event, "skipping event without candidates");
                stats.skipped_empty += 1;
                continue;
            }
            let graph = self.build(view.particles(event).collect())?;
            stats.nodes += graph.node_count();
            stats.graphs += 1;
            out.push(graph);
        }
        Ok(stats)
    }
}
