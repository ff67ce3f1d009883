//! Benchmark support crate for redcap.
//!
//! Provides synthetic lattice data and parameter types used by the Criterion
//! benchmarks for the two engine stages: spanning-tree construction and
//! tree partitioning.

pub mod error;
pub mod params;
pub mod source;
