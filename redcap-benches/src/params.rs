//! Benchmark parameter types.

use std::fmt;

use redcap_core::Strategy;

/// Parameters for a spanning-tree benchmark run.
#[derive(Clone, Debug)]
pub struct TreeBenchParams {
    /// Number of lattice cells.
    pub observations: usize,
    /// Tree construction strategy.
    pub strategy: Strategy,
}

impl fmt::Display for TreeBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},{}", self.observations, self.strategy)
    }
}

/// Parameters for a partitioning benchmark run.
#[derive(Clone, Debug)]
pub struct PartitionBenchParams {
    /// Number of lattice cells.
    pub observations: usize,
    /// Requested region count.
    pub regions: usize,
    /// Split worker threads.
    pub workers: usize,
}

impl fmt::Display for PartitionBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={},k={},workers={}",
            self.observations, self.regions, self.workers
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_name_every_parameter() {
        let tree = TreeBenchParams {
            observations: 100,
            strategy: Strategy::FullOrderAverage,
        };
        assert_eq!(tree.to_string(), "n=100,full-order-average");

        let partition = PartitionBenchParams {
            observations: 400,
            regions: 8,
            workers: 2,
        };
        assert_eq!(partition.to_string(), "n=400,k=8,workers=2");
    }
}
