//! Partitioning and end-to-end benchmarks.
//!
//! `partition` times the recursive cuts alone on a prebuilt tree, varying
//! the region count and the split worker pool. `run` times the whole engine
//! from attribute snapshot to assembled result.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
use std::num::NonZeroUsize;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use redcap_benches::{
    error::BenchSetupError,
    params::PartitionBenchParams,
    source::{SyntheticLattice, SyntheticLatticeConfig},
};
use redcap_core::{
    DistanceMetric, PairwiseDistances, RedcapBuilder, SpatialGraph, SplitWorkers, SsdEvaluator,
    Strategy, build_spanning_tree, partition,
};

const SEED: u64 = 42;
const SIDE: usize = 20;
const REGIONS: &[usize] = &[4, 16];
const WORKERS: &[usize] = &[1, 4];

fn lattice() -> Result<SyntheticLattice, BenchSetupError> {
    Ok(SyntheticLattice::generate(&SyntheticLatticeConfig {
        rows: SIDE,
        cols: SIDE,
        dimensions: 3,
        patch: 5,
        noise: 0.5,
        seed: SEED,
    })?)
}

fn partition_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let lattice = lattice()?;
    let matrix = lattice.matrix();
    let distances = PairwiseDistances::compute(matrix, DistanceMetric::Euclidean)?;
    let graph = SpatialGraph::first_order(matrix.mask(), lattice.contiguity(), &distances)?;
    let tree = build_spanning_tree(Strategy::FullOrderComplete, &graph, &distances)?;
    let evaluator = SsdEvaluator::new(matrix, None);

    let mut group = c.benchmark_group("partition");
    group.sample_size(10);
    for &workers in WORKERS {
        let pool = SplitWorkers::new(NonZeroUsize::new(workers))?;
        for &regions in REGIONS {
            let params = PartitionBenchParams {
                observations: SIDE * SIDE,
                regions,
                workers,
            };
            group.bench_with_input(
                BenchmarkId::from_parameter(&params),
                &regions,
                |b, &regions| {
                    b.iter_batched(
                        || tree.clone(),
                        |tree| partition(tree, regions, &evaluator, &pool),
                        BatchSize::SmallInput,
                    );
                },
            );
        }
    }
    group.finish();
    Ok(())
}

fn run_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let lattice = lattice()?;
    let mut group = c.benchmark_group("run");
    group.sample_size(10);
    for &regions in REGIONS {
        let redcap = RedcapBuilder::new()
            .with_region_count(regions)
            .with_strategy(Strategy::FirstOrderAverage)
            .build()?;
        let params = PartitionBenchParams {
            observations: SIDE * SIDE,
            regions,
            workers: SplitWorkers::new(redcap.workers())?.workers(),
        };
        group.bench_with_input(BenchmarkId::from_parameter(&params), &redcap, |b, redcap| {
            b.iter(|| redcap.run(lattice.matrix(), lattice.contiguity()));
        });
    }
    group.finish();
    Ok(())
}

fn regionalization(c: &mut Criterion) {
    if let Err(err) = partition_impl(c) {
        panic!("partition benchmark setup failed: {err}");
    }
    if let Err(err) = run_impl(c) {
        panic!("run benchmark setup failed: {err}");
    }
}

criterion_group!(benches, regionalization);
criterion_main!(benches);
