//! EventBatch: the named per-event arrays produced by a batch source.

use hashbrown::HashMap;

use super::{attribute_column, count_column, Column, Jagged, ObjectType, Particle};
use crate::{Error, Result};

/// A contiguous group of events, stored column-wise.
///
/// Every column covers exactly `len()` events; `insert` enforces it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBatch {
    len: usize,
    columns: HashMap<String, Column>,
}

impl EventBatch {
    pub fn new(len: usize) -> Self {
        Self { len, columns: HashMap::new() }
    }

    /// Number of events in the batch.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<()> {
        let name = name.into();
        let column = column.into();
        if column.len() != self.len {
            return Err(Error::ShapeMismatch { column: name, expected: self.len, got: column.len() });
        }
        self.columns.insert(name, column);
        Ok(())
    }

    /// Builder form of [`EventBatch::insert`].
    pub fn with_column(mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<Self> {
        self.insert(name, column)?;
        Ok(self)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.keys().map(String::as_str)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns.get(name).ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    pub fn counts(&self, name: &str) -> Result<&[u32]> {
        let column = self.column(name)?;
        column.as_counts().ok_or_else(|| Error::ColumnType {
            column: name.to_string(),
            expected: "COUNT",
            got: column.type_name(),
        })
    }

    pub fn jagged(&self, name: &str) -> Result<&Jagged<f64>> {
        let column = self.column(name)?;
        column.as_jagged().ok_or_else(|| Error::ColumnType {
            column: name.to_string(),
            expected: "JAGGED",
            got: column.type_name(),
        })
    }

    /// Per-event float from a `Count` or `Scalar` column.
    pub fn scalar(&self, name: &str, event: usize) -> Result<f64> {
        let column = self.column(name)?;
        column.scalar_at(event).ok_or_else(|| Error::ColumnType {
            column: name.to_string(),
            expected: "COUNT or SCALAR",
            got: column.type_name(),
        })
    }

    /// Resolve the columns of one object type, tagging every particle with
    /// the type's code.
    pub fn objects(&self, object: &ObjectType) -> Result<CollectionView<'_>> {
        let id = IdSource::Constant(f64::from(object.type_id.0));
        self.collection(&object.name, id)
    }

    /// Resolve a collection whose particles carry a per-particle id column
    /// (`PFCands_pdgId`).
    pub fn candidates(&self, name: &str, id_attribute: &str) -> Result<CollectionView<'_>> {
        let id_column = attribute_column(name, id_attribute);
        let ids = self.jagged(&id_column)?;
        let view = self.collection(name, IdSource::Column(ids))?;
        view.check_rows(&id_column, ids)?;
        Ok(view)
    }

    fn collection<'b>(&'b self, name: &str, id: IdSource<'b>) -> Result<CollectionView<'b>> {
        let view = CollectionView {
            counts: self.counts(&count_column(name))?,
            pt: self.jagged(&attribute_column(name, "pt"))?,
            eta: self.jagged(&attribute_column(name, "eta"))?,
            phi: self.jagged(&attribute_column(name, "phi"))?,
            mass: self.jagged(&attribute_column(name, "mass"))?,
            id,
        };
        for (attribute, column) in [
            ("pt", view.pt),
            ("eta", view.eta),
            ("phi", view.phi),
            ("mass", view.mass),
        ] {
            view.check_rows(&attribute_column(name, attribute), column)?;
        }
        Ok(view)
    }

    /// Append the events of `other`. Both batches must carry the same
    /// column names and shapes; on error `self` is left untouched.
    pub fn append(&mut self, other: EventBatch) -> Result<()> {
        if self.columns.is_empty() && self.len == 0 {
            *self = other;
            return Ok(());
        }
        if let Some(missing) = self.columns.keys().find(|k| !other.columns.contains_key(*k)) {
            return Err(Error::MissingColumn(missing.clone()));
        }
        if let Some(extra) = other.columns.keys().find(|k| !self.columns.contains_key(*k)) {
            return Err(Error::MissingColumn(extra.clone()));
        }
        for (name, column) in &other.columns {
            let Some(existing) = self.columns.get(name) else {
                return Err(Error::MissingColumn(name.clone()));
            };
            if existing.type_name() != column.type_name() {
                return Err(Error::ColumnType {
                    column: name.clone(),
                    expected: existing.type_name(),
                    got: column.type_name(),
                });
            }
        }
        for (name, column) in other.columns {
            if let Some(existing) = self.columns.get_mut(&name) {
                existing.append(&name, column)?;
            }
        }
        self.len += other.len;
        Ok(())
    }
}

/// Where a collection's per-particle identity comes from.
#[derive(Debug, Clone, Copy)]
pub enum IdSource<'b> {
    Constant(f64),
    Column(&'b Jagged<f64>),
}

/// Borrowed, shape-checked view over one collection's columns.
#[derive(Debug, Clone, Copy)]
pub struct CollectionView<'b> {
    counts: &'b [u32],
    pt: &'b Jagged<f64>,
    eta: &'b Jagged<f64>,
    phi: &'b Jagged<f64>,
    mass: &'b Jagged<f64>,
    id: IdSource<'b>,
}

impl<'b> CollectionView<'b> {
    /// Every event's attribute row must have `n<name>` entries.
    fn check_rows(&self, column: &str, values: &Jagged<f64>) -> Result<()> {
        if values.len() != self.counts.len() {
            return Err(Error::ShapeMismatch {
                column: column.to_string(),
                expected: self.counts.len(),
                got: values.len(),
            });
        }
        for (event, &count) in self.counts.iter().enumerate() {
            let got = values.row_len(event).unwrap_or(0);
            if got != count as usize {
                return Err(Error::ShapeMismatch { column: column.to_string(), expected: count as usize, got });
            }
        }
        Ok(())
    }

    /// Number of objects in `event`.
    pub fn count(&self, event: usize) -> usize {
        self.counts.get(event).map_or(0, |&c| c as usize)
    }

    /// The particles of one event, in array order.
    pub fn particles(&self, event: usize) -> impl Iterator<Item = Particle> + 'b {
        let empty: &'b [f64] = &[];
        let pt = self.pt.row(event).unwrap_or(empty);
        let eta = self.eta.row(event).unwrap_or(empty);
        let phi = self.phi.row(event).unwrap_or(empty);
        let mass = self.mass.row(event).unwrap_or(empty);
        let ids = match self.id {
            IdSource::Constant(_) => None,
            IdSource::Column(col) => Some(col.row(event).unwrap_or(empty)),
        };
        let constant = match self.id {
            IdSource::Constant(c) => c,
            IdSource::Column(_) => 0.0,
        };
        (0..self.count(event)).map(move |i| {
            let type_id = ids.map_or(constant, |row| row[i]);
            Particle::new(pt[i], eta[i], phi[i], mass[i]).with_type_id(type_id)
        })
    }
}
