//! Synthetic lattices with patchy attributes.
//!
//! Cells are numbered row-major and linked to their rook neighbours. The
//! grid is tiled into square patches; every cell in a patch draws its
//! attributes around the patch mean, so good regionalizations follow the
//! patch boundaries.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use redcap_core::{AttributeMatrix, Contiguity, DataSourceError};

/// Lattice shape and attribute noise.
#[derive(Clone, Debug)]
pub struct SyntheticLatticeConfig {
    /// Grid rows.
    pub rows: usize,
    /// Grid columns.
    pub cols: usize,
    /// Attributes per cell.
    pub dimensions: usize,
    /// Side length of a patch, in cells.
    pub patch: usize,
    /// Half-width of the uniform noise added to patch means.
    pub noise: f64,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

/// Errors raised while generating a lattice.
#[derive(Debug, thiserror::Error)]
pub enum SyntheticError {
    /// The grid has no cells.
    #[error("lattice must have at least one cell (got {rows}x{cols})")]
    Empty {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },
    /// `dimensions` or `patch` was zero.
    #[error("{field} must be positive")]
    Zero {
        /// Offending configuration field.
        field: &'static str,
    },
    /// `rows * cols * dimensions` overflowed `usize`.
    #[error("lattice of {rows}x{cols} cells with {dimensions} attributes overflows")]
    Overflow {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
        /// Requested attributes per cell.
        dimensions: usize,
    },
    /// The generated rows were rejected.
    #[error(transparent)]
    Matrix(#[from] DataSourceError),
}

/// Attributes and rook contiguity for a generated lattice.
#[derive(Clone, Debug)]
pub struct SyntheticLattice {
    matrix: AttributeMatrix,
    contiguity: Contiguity,
}

impl SyntheticLattice {
    /// Generates a lattice from `config`.
    ///
    /// # Errors
    /// Returns [`SyntheticError`] when the configuration is empty, zero-sized
    /// or too large.
    pub fn generate(config: &SyntheticLatticeConfig) -> Result<Self, SyntheticError> {
        let SyntheticLatticeConfig {
            rows,
            cols,
            dimensions,
            patch,
            noise,
            seed,
        } = *config;
        if rows == 0 || cols == 0 {
            return Err(SyntheticError::Empty { rows, cols });
        }
        if dimensions == 0 {
            return Err(SyntheticError::Zero {
                field: "dimensions",
            });
        }
        if patch == 0 {
            return Err(SyntheticError::Zero { field: "patch" });
        }
        rows.checked_mul(cols)
            .and_then(|cells| cells.checked_mul(dimensions))
            .ok_or(SyntheticError::Overflow {
                rows,
                cols,
                dimensions,
            })?;

        let mut rng = SmallRng::seed_from_u64(seed);
        let patch_cols = cols.div_ceil(patch);
        let patch_count = rows.div_ceil(patch) * patch_cols;
        let means: Vec<Vec<f64>> = (0..patch_count)
            .map(|_| (0..dimensions).map(|_| rng.gen_range(0.0..10.0)).collect())
            .collect();

        let mut values = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let mean = &means[(row / patch) * patch_cols + col / patch];
                values.push(
                    mean.iter()
                        .map(|&centre| centre + noise * rng.gen_range(-1.0..=1.0))
                        .collect(),
                );
            }
        }

        Ok(Self {
            matrix: AttributeMatrix::try_from_rows("synthetic-lattice", values)?,
            contiguity: rook(rows, cols),
        })
    }

    /// Cell attributes.
    #[must_use]
    pub fn matrix(&self) -> &AttributeMatrix {
        &self.matrix
    }

    /// Rook neighbours of every cell.
    #[must_use]
    pub fn contiguity(&self) -> &Contiguity {
        &self.contiguity
    }
}

fn rook(rows: usize, cols: usize) -> Contiguity {
    let neighbours = (0..rows * cols)
        .map(|cell| {
            let (row, col) = (cell / cols, cell % cols);
            let mut around = Vec::with_capacity(4);
            if row > 0 {
                around.push(cell - cols);
            }
            if col > 0 {
                around.push(cell - 1);
            }
            if col + 1 < cols {
                around.push(cell + 1);
            }
            if row + 1 < rows {
                around.push(cell + cols);
            }
            around
        })
        .collect();
    Contiguity::from_neighbours(neighbours)
}
