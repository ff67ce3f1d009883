//! Parquet-backed attribute and control providers for the REDCAP engine.
//!
//! Attributes are read from a `FixedSizeList<Float32 | Float64, D>` column;
//! null rows and rows holding NaN become invalid observations. Control
//! values are read from a scalar numeric column.

mod control;
mod errors;
mod ingest;
mod provider;

pub use control::{read_control_column, read_control_column_path};
pub use errors::DenseMatrixProviderError;
pub use provider::DenseMatrixProvider;

#[cfg(test)]
mod tests;
