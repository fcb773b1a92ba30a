//! Particle and object-type descriptors.

use serde::{Deserialize, Serialize};

/// Identity code carried into the feature channels of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeId(pub u16);

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One reconstructed object, only alive while its event is being converted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pt: f64,
    pub eta: f64,
    pub phi: f64,
    pub mass: f64,
    /// Object-type code for grid conversion, PDG id for graph conversion.
    pub type_id: f64,
}

impl Particle {
    pub fn new(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        Self { pt, eta, phi, mass, type_id: 0.0 }
    }

    pub fn with_type_id(mut self, type_id: impl Into<f64>) -> Self {
        self.type_id = type_id.into();
        self
    }

    /// Feature row in channel order `[pt, eta, phi, mass, type_id]`.
    pub fn features(&self) -> [f64; 5] {
        [self.pt, self.eta, self.phi, self.mass, self.type_id]
    }
}

/// Per-event count branch of a collection: `Jet` → `nJet`.
pub fn count_column(collection: &str) -> String {
    format!("n{collection}")
}

/// Per-object branch of a collection: `Jet`, `pt` → `Jet_pt`.
pub fn attribute_column(collection: &str, attribute: &str) -> String {
    format!("{collection}_{attribute}")
}

/// A named collection of reconstructed objects in the input batches.
///
/// `name` is the branch prefix: `Jet` resolves to `nJet`, `Jet_pt`,
/// `Jet_eta`, `Jet_phi` and `Jet_mass`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectType {
    pub name: String,
    pub type_id: TypeId,
}

impl ObjectType {
    pub fn new(name: impl Into<String>, type_id: u16) -> Self {
        Self { name: name.into(), type_id: TypeId(type_id) }
    }

    pub fn count_column(&self) -> String {
        count_column(&self.name)
    }

    pub fn column(&self, attribute: &str) -> String {
        attribute_column(&self.name, attribute)
    }

    /// Jets, electrons, photons, muons and taus, coded 1 through 5.
    ///
    /// The order of this list is the grid tie-break order.
    pub fn standard_order() -> Vec<ObjectType> {
        vec![
            ObjectType::new("Jet", 1),
            ObjectType::new("Electron", 2),
            ObjectType::new("Photon", 3),
            ObjectType::new("Muon", 4),
            ObjectType::new("Tau", 5),
        ]
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.type_id)
    }
}
