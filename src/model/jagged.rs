//! Ragged per-event arrays.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Variable-length rows stored as one flat buffer plus row offsets.
///
/// Row `i` is `values[offsets[i]..offsets[i + 1]]`. `offsets` always has
/// one more element than there are rows and starts at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jagged<T> {
    offsets: Vec<usize>,
    values: Vec<T>,
}

impl<T> Default for Jagged<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Jagged<T> {
    pub fn new() -> Self {
        Self { offsets: vec![0], values: Vec::new() }
    }

    /// Build from explicit offsets. Offsets must start at zero, be
    /// non-decreasing and end at `values.len()`.
    pub fn from_parts(offsets: Vec<usize>, values: Vec<T>) -> Result<Self> {
        let valid = offsets.first() == Some(&0)
            && offsets.windows(2).all(|w| w[0] <= w[1])
            && offsets.last() == Some(&values.len());
        if !valid {
            return Err(Error::ShapeMismatch {
                column: "<offsets>".into(),
                expected: values.len(),
                got: offsets.last().copied().unwrap_or(0),
            });
        }
        Ok(Self { offsets, values })
    }

    /// Append one row.
    pub fn push_row(&mut self, row: impl IntoIterator<Item = T>) {
        self.values.extend(row);
        self.offsets.push(self.values.len());
    }

    /// Number of rows (events).
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn row(&self, index: usize) -> Option<&[T]> {
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some(&self.values[start..end])
    }

    pub fn row_len(&self, index: usize) -> Option<usize> {
        self.row(index).map(<[T]>::len)
    }

    /// Total number of values across all rows.
    pub fn flat_len(&self) -> usize {
        self.values.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.offsets.windows(2).map(|w| &self.values[w[0]..w[1]])
    }

    /// Append all rows of `other` after the rows of `self`.
    pub fn extend_rows(&mut self, other: Jagged<T>) {
        let base = self.values.len();
        self.offsets.extend(other.offsets.iter().skip(1).map(|o| o + base));
        self.values.extend(other.values);
    }
}

impl<T, R> FromIterator<R> for Jagged<T>
where
    R: IntoIterator<Item = T>,
{
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        let mut jagged = Jagged::new();
        for row in iter {
            jagged.push_row(row);
        }
        jagged
    }
}
