//! REDCAP core library.
//!
//! Regionalization with dynamically constrained agglomerative clustering
//! and partitioning: observations are joined into a spanning tree over their
//! contiguity graph, then the tree is cut into contiguous, homogeneous
//! regions.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod attributes;
mod builder;
mod cluster;
mod contiguity;
mod datasource;
mod distance;
mod edge_list;
mod error;
mod graph;
mod partition;
mod quality;
mod redcap;
mod result;
mod strategy;
mod tree;

pub use crate::{
    attributes::AttributeMatrix,
    builder::RedcapBuilder,
    contiguity::Contiguity,
    datasource::DataSource,
    distance::{DistanceMetric, PairwiseDistances, ParseMetricError},
    edge_list::{EDGE_LIST_KEY, read_contiguity_edge_list, write_edge_list},
    error::{
        ControlPosition, DataSourceError, DataSourceErrorCode, RedcapError, RedcapErrorCode,
        Result,
    },
    graph::{GraphEdge, SpatialGraph},
    partition::partition,
    quality::RegionQuality,
    redcap::Redcap,
    result::{Region, RegionId, Regionalization},
    strategy::{EdgeOrder, Linkage, ParseStrategyError, Strategy, build_spanning_tree},
    tree::{ControlConstraint, SpanningTree, SplitWorkers, SsdEvaluator, TreeEdge, TreeSplit},
};
