//! Error types for the inference engine
//!
//! Weight loading, dataset reading and grid access each get their own error enum so
//! callers can tell a malformed weight file apart from a bad CSV row or an I/O failure.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Out-of-range access on a [`Grid`](crate::grid::Grid).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside a grid of side {length}")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        length: usize,
    },

    #[error("expected {expected} cells for a square grid, found {found}")]
    SizeMismatch { expected: usize, found: usize },
}

/// Content of a weight resource that does not match the expected shape.
///
/// Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeightFormatError {
    #[error("weight resource is empty")]
    Empty,

    #[error("weight resource is not valid UTF-8 text")]
    InvalidEncoding,

    #[error("line {line}: '{token}' is not a number")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: expected {expected} values, found {found}")]
    WrongColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("expected {expected} lines, found {found}")]
    WrongRowCount { expected: usize, found: usize },
}

/// Failure to load or persist one weight resource.
#[derive(Debug, Error)]
pub enum WeightError {
    #[error("malformed weight resource '{}'", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: WeightFormatError,
    },

    #[error("cannot read weight resource '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot persist weight resource '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure to read an input dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot read dataset '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

/// Errors surfaced by [`Lenet5`](crate::lenet5::Lenet5).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Weights(#[from] WeightError),

    #[error("input grid has side {found}, expected {expected}")]
    InputSize { expected: usize, found: usize },
}
