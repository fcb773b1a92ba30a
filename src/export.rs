//! Output containers: persist converted datasets.
//!
//! Every array output is a [`Dataset`]: a fixed name, a shape and the
//! row-major values. Graph output is a [`GraphDataset`]. Both are written
//! as JSON or bincode.
//!
//! ```text
//! GridStack ─┐
//! Table ─────┼──► Dataset { name, shape, data } ──► <dir>/<file>
//!            │
//! graphs ────┴──► GraphDataset { graphs }       ──► <dir>/<file>.graphs
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::graph::EventGraph;
use crate::grid::{GridStack, GRID_DATASET};
use crate::tables::Table;
use crate::{Error, Result};

/// Extension appended to graph output files.
pub const GRAPH_EXTENSION: &str = "graphs";

// ============================================================================
// Format
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Bincode,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "bincode" | "bin" => Ok(OutputFormat::Bincode),
            other => Err(Error::Config(format!("unknown output format `{other}`"))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Bincode => write!(f, "bincode"),
        }
    }
}

// ============================================================================
// Containers
// ============================================================================

/// A named n-dimensional array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub name: String,
    pub shape: Vec<usize>,
    pub created_at: DateTime<Utc>,
    pub data: Vec<f64>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::ShapeMismatch { column: "<dataset>".into(), expected, got: data.len() });
        }
        Ok(Self { name: name.into(), shape, created_at: Utc::now(), data })
    }

    /// Stacked grids under the fixed grid dataset name.
    pub fn from_grids(grids: GridStack) -> Result<Self> {
        let shape = grids.shape();
        Self::new(GRID_DATASET, shape, grids.into_data())
    }

    pub fn from_table(name: impl Into<String>, table: &Table) -> Result<Self> {
        Self::new(name, table.shape(), table.data().to_vec())
    }

    /// Number of events (first axis).
    pub fn len(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Ordered per-event graphs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDataset {
    pub created_at: DateTime<Utc>,
    pub graphs: Vec<EventGraph>,
}

impl GraphDataset {
    pub fn new(graphs: Vec<EventGraph>) -> Self {
        Self { created_at: Utc::now(), graphs }
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

// ============================================================================
// Writing / reading
// ============================================================================

/// Serialize `value` to `writer`.
pub fn write_to<T: Serialize>(value: &T, format: OutputFormat, writer: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Json => serde_json::to_writer(&mut *writer, value)?,
        OutputFormat::Bincode => bincode::serialize_into(&mut *writer, value)?,
    }
    writer.flush()?;
    Ok(())
}

/// Deserialize a value written by [`write_to`].
pub fn read_from<T: DeserializeOwned>(format: OutputFormat, reader: &mut dyn Read) -> Result<T> {
    Ok(match format {
        OutputFormat::Json => serde_json::from_reader(reader)?,
        OutputFormat::Bincode => bincode::deserialize_from(reader)?,
    })
}

/// `<dir>/<file>`, with `extension` appended when given.
pub fn output_path(dir: &Path, file: &str, extension: Option<&str>) -> PathBuf {
    match extension {
        Some(ext) => dir.join(format!("{file}.{ext}")),
        None => dir.join(file),
    }
}

/// Write `value` to `path`, creating parent directories.
pub fn write_file<T: Serialize>(value: &T, format: OutputFormat, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write_to(value, format, &mut writer)?;
    info!(path = %path.display(), %format, "output written");
    Ok(())
}

pub fn read_file<T: DeserializeOwned>(format: OutputFormat, path: &Path) -> Result<T> {
    let mut reader = BufReader::new(File::open(path)?);
    read_from(format, &mut reader)
}
