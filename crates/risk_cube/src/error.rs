//! Cube error types.

use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

/// Axis of a scenario cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Trade or netting set ids
    Id,
    /// Simulation dates
    Date,
    /// Monte Carlo samples
    Sample,
    /// Depth slots
    Depth,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::Id => "id",
            Axis::Date => "date",
            Axis::Sample => "sample",
            Axis::Depth => "depth",
        };
        f.write_str(name)
    }
}

/// Errors raised by cube storage, joint cubes and interpretations.
///
/// # Examples
///
/// ```
/// use risk_cube::{Axis, CubeError};
///
/// let err = CubeError::IndexOutOfRange { axis: Axis::Sample, index: 7, size: 5 };
/// assert_eq!(err.to_string(), "sample index 7 out of range [0, 5)");
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CubeError {
    /// Index past the end of an axis.
    #[error("{axis} index {index} out of range [0, {size})")]
    IndexOutOfRange {
        /// Offending axis
        axis: Axis,
        /// Requested index
        index: usize,
        /// Axis length
        size: usize,
    },

    /// Cube shape rejected at construction.
    #[error("Invalid cube: {0}")]
    InvalidCube(String),

    /// A joint cube was built from no sources.
    #[error("JointCube: no input cubes given")]
    EmptyCubeList,

    /// A source cube disagrees with the first source on an axis.
    #[error("JointCube: input cube {cube} has {axis} dimension {found}, cube #0 has {expected}")]
    DimensionMismatch {
        /// Position of the offending source
        cube: usize,
        /// Axis that differs
        axis: Axis,
        /// Size found on the source
        found: usize,
        /// Size of source 0
        expected: usize,
    },

    /// An id appears twice where ids must be unique.
    #[error("duplicate id \"{0}\"")]
    DuplicateId(String),

    /// Exclusive joint cube: id found in several sources.
    #[error("JointCube: id \"{0}\" occurs in more than one input cube")]
    IdInMultipleCubes(String),

    /// Joint cube id with no source providing it.
    #[error("JointCube: no input cubes for id \"{0}\"")]
    NoCubesForId(String),

    /// Write to a joint cube id backed by more than one source.
    #[error("JointCube: can not set value for id \"{id}\" held by {sources} input cubes")]
    AmbiguousWrite {
        /// Joint id
        id: String,
        /// Number of sources holding it
        sources: usize,
    },

    /// Lookup of an id the cube does not hold.
    #[error("unknown id \"{0}\"")]
    UnknownId(String),

    /// The cube does not support the operation.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),

    /// Malformed valuation/close-out date grid.
    #[error("Invalid date grid: {0}")]
    InvalidDateGrid(String),

    /// Close-out date not after valuation date.
    #[error("close-out date {close_out} not after valuation date {valuation} at index {index}")]
    NonPositiveMpor {
        /// Grid index
        index: usize,
        /// Valuation date
        valuation: NaiveDate,
        /// Close-out date
        close_out: NaiveDate,
    },

    /// Scenario data series not present.
    #[error("no aggregation scenario data for {kind} \"{qualifier}\"")]
    MissingScenarioData {
        /// Data type name
        kind: String,
        /// Qualifier, e.g. an index or currency name
        qualifier: String,
    },
}

pub(crate) fn check_index(axis: Axis, index: usize, size: usize) -> Result<(), CubeError> {
    if index < size {
        Ok(())
    } else {
        Err(CubeError::IndexOutOfRange { axis, index, size })
    }
}
