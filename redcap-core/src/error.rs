//! Error types for the REDCAP engine.
//!
//! Defines error enums exposed by the public API, their stable
//! machine-readable codes, and a convenient result alias.

use std::{fmt, sync::Arc};

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by [`crate::DataSource`] operations.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DataSourceError {
    /// Requested observation was outside the source's bounds.
    #[error("observation {index} is out of bounds")]
    OutOfBounds {
        /// The requested row that exceeded the source bounds.
        index: usize,
    },
    /// Two attribute rows had different dimensions.
    #[error("dimension mismatch: left={left}, right={right}")]
    DimensionMismatch {
        /// Dimensionality of the left-hand row.
        left: usize,
        /// Dimensionality of the right-hand row.
        right: usize,
    },
    /// Data source contained no rows.
    #[error("data source contains no rows")]
    EmptyData,
    /// Data source rows must have at least one attribute column.
    #[error("attribute rows must have positive dimension")]
    ZeroDimension,
    /// A valid observation carried a NaN or infinite attribute.
    #[error("observation {index} has a non-finite value in column {column}")]
    NonFinite {
        /// Row that contained the value.
        index: usize,
        /// Column that contained the value.
        column: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`DataSourceError`] variants.
    enum DataSourceErrorCode for DataSourceError {
        /// Requested observation was outside the source's bounds.
        OutOfBounds => OutOfBounds { .. } => "DATA_SOURCE_OUT_OF_BOUNDS",
        /// Two attribute rows had different dimensions.
        DimensionMismatch => DimensionMismatch { .. } => "DATA_SOURCE_DIMENSION_MISMATCH",
        /// Data source contained no rows.
        EmptyData => EmptyData => "DATA_SOURCE_EMPTY",
        /// Data source rows must have at least one attribute column.
        ZeroDimension => ZeroDimension => "DATA_SOURCE_ZERO_DIMENSION",
        /// A valid observation carried a NaN or infinite attribute.
        NonFinite => NonFinite { .. } => "DATA_SOURCE_NON_FINITE",
    }
}

/// Error type produced when configuring or running [`crate::Redcap`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RedcapError {
    /// The requested number of regions must be at least one.
    #[error("region count must be at least 1 (got {got})")]
    InvalidRegionCount {
        /// The invalid region count supplied by the caller.
        got: usize,
    },
    /// The supplied [`crate::DataSource`] contained no observations.
    #[error("data source `{data_source}` contains no observations")]
    EmptySource {
        /// Identifier for the empty data source.
        data_source: Arc<str>,
    },
    /// Every observation was flagged invalid.
    #[error("data source `{data_source}` has no valid observations")]
    NoValidObservations {
        /// Identifier for the data source.
        data_source: Arc<str>,
    },
    /// The contiguity model described a different number of observations.
    #[error("contiguity covers {actual} observations but the data source has {expected}")]
    ContiguityLengthMismatch {
        /// Observations in the data source.
        expected: usize,
        /// Observations described by the contiguity model.
        actual: usize,
    },
    /// A neighbour list referenced an observation that does not exist.
    #[error("observation {observation} lists neighbour {neighbour}, but only {observations} exist")]
    InvalidNeighbour {
        /// Observation owning the neighbour list.
        observation: usize,
        /// Offending neighbour index.
        neighbour: usize,
        /// Number of observations.
        observations: usize,
    },
    /// The control variable did not have one value per observation.
    #[error("control variable has {actual} values but {expected} observations exist")]
    ControlLengthMismatch {
        /// Observations in the data source.
        expected: usize,
        /// Values supplied for the control variable.
        actual: usize,
    },
    /// A control value or the control threshold was NaN or infinite.
    #[error("control variable is non-finite at {position}")]
    NonFiniteControl {
        /// Which value was non-finite.
        position: ControlPosition,
    },
    /// A pairwise distance was NaN or infinite.
    #[error("distance between observations {left} and {right} is non-finite")]
    NonFiniteDistance {
        /// First observation.
        left: usize,
        /// Second observation.
        right: usize,
    },
    /// A precomputed distance matrix did not match the observation count.
    #[error("distance matrix holds {actual} entries but {expected} were expected")]
    DistanceMatrixSize {
        /// Entries required for the observation count.
        expected: usize,
        /// Entries supplied.
        actual: usize,
    },
    /// The contiguity graph cannot connect every valid observation.
    #[error("contiguity graph is not connected: spanning tree reached {covered} of {expected} observations")]
    GraphNotConnected {
        /// Observations reachable from the tree root once edges were exhausted.
        covered: usize,
        /// Valid observations that needed covering.
        expected: usize,
    },
    /// A synchronisation primitive became poisoned after a panic.
    #[error("lock for {resource} is poisoned")]
    LockPoisoned {
        /// Name of the locked resource that was poisoned.
        resource: &'static str,
    },
    /// The split worker pool could not be created.
    #[error("failed to start split workers: {message}")]
    WorkerPool {
        /// Message reported by the thread pool builder.
        message: Arc<str>,
    },
    /// Edge-list text could not be parsed.
    #[error("edge list line {line}: {reason}")]
    EdgeList {
        /// One-based line number.
        line: usize,
        /// Description of the problem.
        reason: Arc<str>,
    },
    /// A [`crate::DataSource`] operation failed while running the algorithm.
    #[error("data source `{data_source}` failed: {error}")]
    DataSource {
        /// Identifier for the data source that produced the error.
        data_source: Arc<str>,
        #[source]
        /// Underlying data source error bubbled up by the algorithm.
        error: DataSourceError,
    },
}

/// Identifies which control value was non-finite.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlPosition {
    /// The value recorded for an observation.
    Observation(usize),
    /// The threshold.
    Threshold,
}

impl fmt::Display for ControlPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Observation(index) => write!(f, "observation {index}"),
            Self::Threshold => f.write_str("threshold"),
        }
    }
}

define_error_codes! {
    /// Stable codes describing [`RedcapError`] variants.
    enum RedcapErrorCode for RedcapError {
        /// The requested number of regions must be at least one.
        InvalidRegionCount => InvalidRegionCount { .. } => "REDCAP_INVALID_REGION_COUNT",
        /// The supplied [`crate::DataSource`] contained no observations.
        EmptySource => EmptySource { .. } => "REDCAP_EMPTY_SOURCE",
        /// Every observation was flagged invalid.
        NoValidObservations => NoValidObservations { .. } => "REDCAP_NO_VALID_OBSERVATIONS",
        /// The contiguity model described a different number of observations.
        ContiguityLengthMismatch => ContiguityLengthMismatch { .. } => "REDCAP_CONTIGUITY_LENGTH_MISMATCH",
        /// A neighbour list referenced an observation that does not exist.
        InvalidNeighbour => InvalidNeighbour { .. } => "REDCAP_INVALID_NEIGHBOUR",
        /// The control variable did not have one value per observation.
        ControlLengthMismatch => ControlLengthMismatch { .. } => "REDCAP_CONTROL_LENGTH_MISMATCH",
        /// A control value or the control threshold was NaN or infinite.
        NonFiniteControl => NonFiniteControl { .. } => "REDCAP_NON_FINITE_CONTROL",
        /// A pairwise distance was NaN or infinite.
        NonFiniteDistance => NonFiniteDistance { .. } => "REDCAP_NON_FINITE_DISTANCE",
        /// A precomputed distance matrix did not match the observation count.
        DistanceMatrixSize => DistanceMatrixSize { .. } => "REDCAP_DISTANCE_MATRIX_SIZE",
        /// The contiguity graph cannot connect every valid observation.
        GraphNotConnected => GraphNotConnected { .. } => "REDCAP_GRAPH_NOT_CONNECTED",
        /// A synchronisation primitive became poisoned after a panic.
        LockPoisoned => LockPoisoned { .. } => "REDCAP_LOCK_POISONED",
        /// The split worker pool could not be created.
        WorkerPool => WorkerPool { .. } => "REDCAP_WORKER_POOL",
        /// Edge-list text could not be parsed.
        EdgeList => EdgeList { .. } => "REDCAP_EDGE_LIST",
        /// A [`crate::DataSource`] operation failed while running the algorithm.
        DataSourceFailure => DataSource { .. } => "REDCAP_DATA_SOURCE_FAILURE",
    }
}

impl RedcapError {
    /// Retrieve the inner [`DataSourceErrorCode`] when the error originated in a [`crate::DataSource`].
    #[must_use]
    pub const fn data_source_code(&self) -> Option<DataSourceErrorCode> {
        match self {
            Self::DataSource { error, .. } => Some(error.code()),
            _ => None,
        }
    }

    pub(crate) fn edge_list(line: usize, reason: impl Into<Arc<str>>) -> Self {
        Self::EdgeList {
            line,
            reason: reason.into(),
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, RedcapError>;
