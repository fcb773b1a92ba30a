//! # nanoaod-convert: fixed-size representations of collision events
//!
//! Converts variable-length NanoAOD-style event records into the fixed
//! shapes anomaly-detection models train on.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `BatchSource` is the contract between converters and input
//! 2. **Plain data**: `EventBatch`, `Jagged`, `Particle` cross every boundary
//! 3. **Engines own nothing**: grid and graph conversion are pure per-event functions
//! 4. **Driver owns the output**: one buffer, amortized appends, batch-boundary ceiling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nanoaod_convert::{GridConfig, GridEngine, JsonLinesSource, pipeline};
//!
//! # fn example() -> nanoaod_convert::Result<()> {
//! let engine = GridEngine::new(&GridConfig::default())?;
//! let mut source = JsonLinesSource::open(["events.jsonl"]);
//! let (grids, summary) = pipeline::run(&mut source, &engine, Some(10_000))?;
//! println!("{} events -> {:?}", summary.events, grids.shape());
//! # Ok(())
//! # }
//! ```
//!
//! ## Representations
//!
//! | Pipeline | Engine | Output |
//! |----------|--------|--------|
//! | grid | `GridEngine` | `(N, 16, 16, 5)` occupancy grid |
//! | graph | `GraphEngine` | per-event node matrix + k-NN edge list |
//! | basic | `MultiplicityConfig` | `(N, 8)` multiplicities |
//! | jets | `JetTableConfig` | `(N, 136)` padded jet attributes |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod source;
pub mod grid;
pub mod graph;
pub mod tables;
pub mod pipeline;
pub mod export;
pub mod config;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{Column, EventBatch, Jagged, ObjectType, Particle, TypeId};
pub use source::{BatchSource, JsonLinesSource, MemorySource};
pub use grid::{EventGrid, GridConfig, GridEngine, GridStack};
pub use graph::{EdgeIndex, EventGraph, GraphConfig, GraphEngine};
pub use tables::{JetTableConfig, MultiplicityConfig, Table};
pub use pipeline::{Converter, RunSummary};
pub use export::{Dataset, GraphDataset, OutputFormat};
pub use config::ConvertConfig;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}' has wrong type: expected {expected}, got {got}")]
    ColumnType { column: String, expected: &'static str, got: &'static str },

    #[error("Shape mismatch in '{column}': expected {expected}, got {got}")]
    ShapeMismatch { column: String, expected: usize, got: usize },

    #[error("Graph construction needs at least one candidate")]
    EmptyEvent,

    #[error("Parse error in {input} at line {line}: {message}")]
    Parse { input: String, line: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
