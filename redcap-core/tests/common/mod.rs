use redcap_core::{Contiguity, DataSource, DataSourceError};
use redcap_test_support::lattice::Lattice;

/// One attribute per observation, with an optional set of missing rows.
#[derive(Clone)]
pub struct Scalars {
    values: Vec<f64>,
    missing: Vec<usize>,
}

impl Scalars {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            missing: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_missing(mut self, missing: Vec<usize>) -> Self {
        self.missing = missing;
        self
    }
}

impl DataSource for Scalars {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn name(&self) -> &str {
        "scalars"
    }

    fn dimension(&self) -> usize {
        1
    }

    fn attributes(&self, index: usize) -> Result<&[f64], DataSourceError> {
        self.values
            .get(index)
            .map(std::slice::from_ref)
            .ok_or(DataSourceError::OutOfBounds { index })
    }

    fn is_valid(&self, index: usize) -> bool {
        index < self.values.len() && !self.missing.contains(&index)
    }
}

/// Rook contiguity over a `rows` x `cols` grid.
#[must_use]
pub fn rook(rows: usize, cols: usize) -> Contiguity {
    Contiguity::from_neighbours(Lattice::new(rows, cols).rook())
}
