//! Error types shared across the crate.

use crate::csp::EngineError;
use crate::nonogram::puzzle::Dim;
use std::path::PathBuf;
use thiserror::Error;

/// A puzzle whose clues do not describe a well-formed grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// The reference solution does not have the shape the clues describe.
    #[error(
        "solution grid is {height}x{width} but the clues describe a {expected_height}x{expected_width} puzzle"
    )]
    SolutionShape {
        /// Number of row clues.
        expected_height: usize,
        /// Number of column clues.
        expected_width: usize,
        /// Rows in the solution grid.
        height: usize,
        /// Columns in the solution grid.
        width: usize,
    },

    /// A file declared a different number of lines than it lists clues for.
    #[error("declared {declared} {dim}s but found clues for {actual}")]
    DeclaredCount {
        /// Which clue list disagrees.
        dim: Dim,
        /// The declared count.
        declared: usize,
        /// The number of clues present.
        actual: usize,
    },

    /// Rows of a grid have different lengths.
    #[error("grid row {row} has {len} cells, expected {expected}")]
    RaggedGrid {
        /// Offending row.
        row: usize,
        /// Its length.
        len: usize,
        /// Length of the first row.
        expected: usize,
    },

    /// A clue contains a run of length zero.
    #[error("run {index} of {dim} {line} has length zero")]
    ZeroRun {
        /// Dimension of the line.
        dim: Dim,
        /// Line index.
        line: usize,
        /// Run index within the clue.
        index: usize,
    },

    /// A line is too long to be addressed by the solver.
    #[error("{dim} {line} exceeds {max} cells", max = i32::MAX)]
    LineTooLong {
        /// Dimension of the line.
        dim: Dim,
        /// Line index.
        line: usize,
    },

    /// A run is too long to be separated from the next one by the solver.
    #[error("run {index} of {dim} {line} must be shorter than {max}", max = i32::MAX)]
    RunTooLong {
        /// Dimension of the line.
        dim: Dim,
        /// Line index.
        line: usize,
        /// Run index within the clue.
        index: usize,
    },
}

/// A puzzle file that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A malformed line.
    #[error("line {line}: {message}")]
    Syntax {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// A feature the solver does not handle, such as colour.
    #[error("line {line}: unsupported feature `{feature}`")]
    Unsupported {
        /// 1-based line number.
        line: usize,
        /// The offending keyword.
        feature: String,
    },

    /// A required section never appeared.
    #[error("missing `{0}` section")]
    MissingSection(&'static str),
}

/// Any failure while loading, compiling or solving a puzzle.
#[derive(Debug, Error)]
pub enum Error {
    /// The puzzle is malformed.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// The constraint engine failed.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The puzzle file is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A file could not be read or written.
    #[error("{}: {source}", .path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wraps an I/O failure on `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_messages() {
        let err = StructuralError::ZeroRun {
            dim: Dim::Col,
            line: 2,
            index: 0,
        };
        assert_eq!(err.to_string(), "run 0 of column 2 has length zero");

        let err = StructuralError::DeclaredCount {
            dim: Dim::Row,
            declared: 5,
            actual: 4,
        };
        assert_eq!(err.to_string(), "declared 5 rows but found clues for 4");
    }

    #[test]
    fn test_from_conversions() {
        let err: Error = ParseError::MissingSection("rows").into();
        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(err.to_string(), "missing `rows` section");
    }
}
