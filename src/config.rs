//! Run configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```json
//! { "batch_size": 500, "graph": { "max_nodes": 60 }, "grid": { "objects": [
//!     { "name": "Muon", "type_id": 4 }, { "name": "Jet", "type_id": 1 } ] } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::export::OutputFormat;
use crate::graph::GraphConfig;
use crate::grid::{AxisBinning, GridConfig};
use crate::source::DEFAULT_BATCH_SIZE;
use crate::tables::{JetTableConfig, MultiplicityConfig};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Events per batch for file sources.
    pub batch_size: usize,
    /// Event ceiling, checked at batch boundaries.
    pub limit_events: Option<usize>,
    pub format: OutputFormat,
    pub grid: GridConfig,
    pub graph: GraphConfig,
    pub multiplicity: MultiplicityConfig,
    pub jets: JetTableConfig,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            limit_events: None,
            format: OutputFormat::default(),
            grid: GridConfig::default(),
            graph: GraphConfig::default(),
            multiplicity: MultiplicityConfig::default(),
            jets: JetTableConfig::default(),
        }
    }
}

impl ConvertConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: ConvertConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject settings no engine could run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        AxisBinning::new(self.grid.phi)?;
        AxisBinning::new(self.grid.eta)?;
        if self.grid.objects.is_empty() {
            return Err(Error::Config("grid needs at least one object type".into()));
        }
        if let Some(dup) = self
            .grid
            .objects
            .iter()
            .enumerate()
            .find(|(i, o)| self.grid.objects[..*i].iter().any(|p| p.name == o.name))
            .map(|(_, o)| o)
        {
            return Err(Error::Config(format!("object type `{}` listed twice", dup.name)));
        }
        if self.graph.max_nodes == 0 {
            return Err(Error::Config("graph max_nodes must be at least 1".into()));
        }
        if self.jets.max_jets == 0 || self.jets.attributes.is_empty() {
            return Err(Error::Config("jet table needs at least one jet and one attribute".into()));
        }
        if self.multiplicity.columns.is_empty() {
            return Err(Error::Config("multiplicity table needs at least one column".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(ConvertConfig::from_json_str("{}").unwrap(), ConvertConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = ConvertConfig::from_json_str(
            r#"{ "batch_size": 7, "format": "bincode", "graph": { "k": 5 } }"#,
        )
        .unwrap();
        assert_eq!(config.batch_size, 7);
        assert_eq!(config.format, OutputFormat::Bincode);
        assert_eq!(config.graph.k, 5);
        assert_eq!(config.graph.max_nodes, 40);
    }

    #[test]
    fn test_custom_object_order() {
        let config = ConvertConfig::from_json_str(
            r#"{ "grid": { "objects": [ { "name": "Muon", "type_id": 4 }, { "name": "Jet", "type_id": 1 } ] } }"#,
        )
        .unwrap();
        let names: Vec<&str> = config.grid.objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Muon", "Jet"]);
    }

    #[test]
    fn test_invalid_values() {
        assert!(ConvertConfig::from_json_str(r#"{ "batch_size": 0 }"#).is_err());
        assert!(ConvertConfig::from_json_str(r#"{ "grid": { "objects": [] } }"#).is_err());
        assert!(ConvertConfig::from_json_str(
            r#"{ "grid": { "objects": [ { "name": "Jet", "type_id": 1 }, { "name": "Jet", "type_id": 2 } ] } }"#
        )
        .is_err());
        assert!(ConvertConfig::from_json_str(r#"{ "bogus": 1 }"#).is_err());
    }
}
