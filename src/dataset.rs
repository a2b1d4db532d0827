//! src/dataset.rs
//!
//! A column-major numeric matrix with a variable-hash-to-column lookup.
//! Building a `Dataset` from a CSV or other on-disk format is out of scope
//! here (that lives with the outer evolutionary loop); this module only
//! implements the in-memory contract the interpreter needs.

use std::collections::HashMap;

/// Immutable column-major dataset. `GetIndex` is a total function over
/// known variables by design: an unknown hash is a programming error in the
/// caller (the tree references a variable the dataset does not have) and
/// panics rather than threading a `Result` through the hot path.
#[derive(Clone, Debug)]
pub struct Dataset {
    columns: Vec<Vec<f64>>,
    index: HashMap<u64, usize>,
}

impl Dataset {
    /// `hashes[k]` identifies the variable stored in `columns[k]`. All
    /// columns must have equal length (one entry per row).
    pub fn new(columns: Vec<Vec<f64>>, hashes: Vec<u64>) -> Self {
        assert_eq!(
            columns.len(),
            hashes.len(),
            "one hash is required per column"
        );
        if let Some(first) = columns.first() {
            assert!(
                columns.iter().all(|c| c.len() == first.len()),
                "all dataset columns must have equal length"
            );
        }
        let index = hashes.into_iter().enumerate().map(|(i, h)| (h, i)).collect();
        Self { columns, index }
    }

    /// Number of rows shared by every column.
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Resolve a variable's hash to its column index. Fatal if unknown.
    pub fn get_index(&self, hash: u64) -> usize {
        *self
            .index
            .get(&hash)
            .unwrap_or_else(|| panic!("dataset has no column for variable hash {hash}"))
    }

    /// `dataset.values().col(k).segment(offset, n)`.
    pub fn values(&self) -> Values<'_> {
        Values(self)
    }
}

/// Thin accessor mirroring the spec's `Values().col(k).segment(offset, n)`
/// surface.
#[derive(Clone, Copy)]
pub struct Values<'a>(&'a Dataset);

impl<'a> Values<'a> {
    pub fn col(&self, k: usize) -> Column<'a> {
        Column(&self.0.columns[k])
    }
}

#[derive(Clone, Copy)]
pub struct Column<'a>(&'a [f64]);

impl<'a> Column<'a> {
    /// A contiguous view of `n` scalars starting at `offset`.
    pub fn segment(&self, offset: usize, n: usize) -> &'a [f64] {
        &self.0[offset..offset + n]
    }
}
