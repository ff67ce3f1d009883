//! Tests for the `Redcap` orchestration API.

mod common;

use std::{collections::HashSet, num::NonZeroUsize};

use common::{Scalars, rook};
use redcap_core::{
    Contiguity, ControlConstraint, DataSource, RedcapBuilder, RedcapError, Regionalization,
    Strategy, read_contiguity_edge_list,
};
use redcap_test_support::tracing::RecordingLayer;
use rstest::{fixture, rstest};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

/// Two plateaus along a line of six cells.
#[fixture]
fn plateaus() -> Scalars {
    Scalars::new(vec![1.0, 1.1, 1.2, 9.0, 9.1, 9.2])
}

fn members(result: &Regionalization) -> Vec<Vec<usize>> {
    result
        .regions()
        .iter()
        .map(|region| region.members().to_vec())
        .collect()
}

fn assert_contiguous(result: &Regionalization, contiguity: &Contiguity) {
    for region in result.regions() {
        let inside: HashSet<usize> = region.members().iter().copied().collect();
        let mut seen = HashSet::from([region.members()[0]]);
        let mut stack = vec![region.members()[0]];
        while let Some(id) = stack.pop() {
            for (next, _) in contiguity.neighbours(id) {
                if inside.contains(&next) && seen.insert(next) {
                    stack.push(next);
                }
            }
        }
        assert_eq!(seen, inside, "region {:?} is not contiguous", region.id());
    }
}

#[rstest]
fn plateaus_are_found_by_every_strategy(
    plateaus: Scalars,
    #[values(
        Strategy::FirstOrderSingle,
        Strategy::FirstOrderAverage,
        Strategy::FirstOrderComplete,
        Strategy::FullOrderSingle,
        Strategy::FullOrderAverage,
        Strategy::FullOrderComplete
    )]
    strategy: Strategy,
) {
    let redcap = RedcapBuilder::new()
        .with_region_count(2)
        .with_strategy(strategy)
        .build()
        .expect("configuration must be valid");
    let result = redcap.run(&plateaus, &rook(1, 6)).expect("line is connected");
    assert_eq!(members(&result), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    assert_eq!(result.strategy(), strategy);
    assert!(!result.is_short());
    let quality = result.quality();
    assert!(quality.ratio() > 0.99, "ratio {}", quality.ratio());
}

#[rstest]
fn identical_values_still_split_into_contiguous_regions() {
    let source = Scalars::new(vec![4.0; 6]);
    let contiguity = rook(2, 3);
    let redcap = RedcapBuilder::new()
        .with_region_count(2)
        .build()
        .expect("configuration must be valid");
    let result = redcap.run(&source, &contiguity).expect("lattice is connected");

    assert_eq!(result.region_count(), 2);
    let sizes: Vec<usize> = result.regions().iter().map(|r| r.len()).collect();
    assert_eq!(sizes.iter().sum::<usize>(), 6);
    assert!(sizes.iter().all(|&size| size >= 2));
    assert!(result.labels().iter().all(Option::is_some));
    assert_contiguous(&result, &contiguity);
    assert_eq!(result.quality().total_ssd(), 0.0);
}

#[rstest]
fn results_do_not_depend_on_worker_count() {
    let values: Vec<f64> = (0..20_u32)
        .map(|i| f64::from((i * 7 + 3) % 11) + f64::from(i) * 0.01)
        .collect();
    let source = Scalars::new(values);
    let contiguity = rook(4, 5);
    let run = |workers: usize| {
        RedcapBuilder::new()
            .with_region_count(5)
            .with_strategy(Strategy::FullOrderComplete)
            .with_workers(NonZeroUsize::new(workers))
            .build()
            .expect("configuration must be valid")
            .run(&source, &contiguity)
            .expect("lattice is connected")
    };
    let baseline = run(1);
    assert_contiguous(&baseline, &contiguity);
    for workers in [2, 3, 8] {
        assert_eq!(run(workers), baseline, "{workers} workers diverged");
    }
}

#[rstest]
fn control_threshold_limits_the_region_count(plateaus: Scalars) {
    let control = ControlConstraint::new(vec![1.0; 6], 2.5).expect("finite control");
    let redcap = RedcapBuilder::new()
        .with_region_count(3)
        .with_control(control)
        .build()
        .expect("configuration must be valid");
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    let result = tracing::subscriber::with_default(subscriber, || {
        redcap.run(&plateaus, &rook(1, 6))
    })
    .expect("run must succeed");

    assert_eq!(members(&result), vec![vec![0, 1, 2], vec![3, 4, 5]]);
    assert_eq!(result.requested_regions(), 3);
    assert!(result.is_short());

    let warnings = layer.events_at(Level::WARN);
    let short = warnings
        .iter()
        .find(|event| event.message() == Some("constraints allowed fewer regions than requested"))
        .expect("short run must warn");
    assert_eq!(short.fields.get("requested"), Some(&"3".to_owned()));
    assert_eq!(short.fields.get("produced"), Some(&"2".to_owned()));
    assert!(
        warnings
            .iter()
            .any(|event| event.message() == Some("tree cannot be split further"))
    );
}

#[rstest]
fn invalid_observations_are_unlabelled() {
    // 1 is missing; 0-3-4-5-2 still connects the rest
    let source = Scalars::new(vec![1.0, 50.0, 8.0, 1.5, 2.0, 8.5]).with_missing(vec![1]);
    let contiguity = rook(2, 3);
    let redcap = RedcapBuilder::new()
        .with_region_count(2)
        .build()
        .expect("configuration must be valid");
    let result = redcap.run(&source, &contiguity).expect("remaining cells connect");
    assert_eq!(result.labels()[1], None);
    assert_eq!(members(&result), vec![vec![0, 3, 4], vec![2, 5]]);
    assert_eq!(result.spanning_tree().len(), 4);
}

#[rstest]
fn disconnected_contiguity_is_an_error(plateaus: Scalars) {
    let contiguity =
        Contiguity::from_links(6, [(0, 1, None), (1, 2, None), (3, 4, None), (4, 5, None)])
            .expect("links in range");
    let redcap = RedcapBuilder::new().build().expect("configuration must be valid");
    let err = redcap
        .run(&plateaus, &contiguity)
        .expect_err("two islands cannot be spanned");
    assert!(matches!(
        err,
        RedcapError::GraphNotConnected {
            covered: 3,
            expected: 6
        }
    ));
}

#[rstest]
fn empty_sources_are_rejected() {
    let redcap = RedcapBuilder::new().build().expect("configuration must be valid");
    let err = redcap
        .run(&Scalars::new(Vec::new()), &Contiguity::from_neighbours(Vec::new()))
        .expect_err("nothing to regionalize");
    assert!(matches!(err, RedcapError::EmptySource { .. }));
}

#[rstest]
fn contiguity_must_match_the_source(plateaus: Scalars) {
    let redcap = RedcapBuilder::new().build().expect("configuration must be valid");
    let err = redcap
        .run(&plateaus, &rook(1, 4))
        .expect_err("four lists for six rows");
    assert_eq!(
        err,
        RedcapError::ContiguityLengthMismatch {
            expected: 6,
            actual: 4
        }
    );
}

#[rstest]
fn exported_tree_reads_back(plateaus: Scalars) {
    let redcap = RedcapBuilder::new()
        .with_strategy(Strategy::FullOrderAverage)
        .build()
        .expect("configuration must be valid");
    let result = redcap.run(&plateaus, &rook(1, 6)).expect("line is connected");
    let mut text = Vec::new();
    result.write_spanning_tree(&mut text).expect("writing to memory");

    let tree = read_contiguity_edge_list(text.as_slice()).expect("exported list parses");
    assert_eq!(tree.len(), plateaus.len());
    let edges: usize = (0..tree.len()).map(|id| tree.neighbours(id).count()).sum();
    assert_eq!(edges / 2, 5);
}

#[rstest]
fn run_records_core_tracing(plateaus: Scalars) {
    let redcap = RedcapBuilder::new()
        .with_region_count(2)
        .with_strategy(Strategy::FirstOrderComplete)
        .build()
        .expect("configuration must be valid");
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());

    tracing::subscriber::with_default(subscriber, || redcap.run(&plateaus, &rook(1, 6)))
        .expect("run must succeed");

    let run_span = layer.span("core.run").expect("core.run span must exist");
    assert_eq!(run_span.fields.get("data_source"), Some(&"scalars".to_owned()));
    assert_eq!(run_span.fields.get("observations"), Some(&"6".to_owned()));
    assert_eq!(run_span.fields.get("regions"), Some(&"2".to_owned()));
    assert_eq!(
        run_span.fields.get("strategy"),
        Some(&"first-order-complete".to_owned())
    );
    for name in ["core.build_graph", "core.build_tree", "core.partition"] {
        assert_eq!(layer.span_count(name), 1, "{name} must be recorded once");
    }
    assert!(layer.span_count("core.split") >= 1);

    let completed = layer
        .events_at(Level::INFO)
        .into_iter()
        .find(|event| event.message() == Some("regionalization completed"))
        .expect("completion must be logged");
    assert_eq!(completed.fields.get("regions"), Some(&"2".to_owned()));
}
