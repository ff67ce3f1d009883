//! Benchmark setup error type.

use crate::source::SyntheticError;
use redcap_core::RedcapError;

/// Errors that may occur during benchmark setup.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Synthetic data generation failed.
    #[error("synthetic lattice generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// The engine rejected the generated inputs.
    #[error("regionalization failed: {0}")]
    Redcap(#[from] RedcapError),
}
