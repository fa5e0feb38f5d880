#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Nonogram modelling and solving.
//!
//! A [`Puzzle`] is compiled into an integer model ([`compile`]), loaded into
//! a [`Backend`](crate::csp::Backend) by an [`Enumerator`], and solved; grids
//! are read back with [`extract`]. The functions at this level run the whole
//! pipeline on the [`DefaultBackend`].
//!
//! ```
//! use nonogram_solver::nonogram::{self, Puzzle, SolveOne, Uniqueness};
//!
//! // #.
//! // .#
//! let puzzle = Puzzle::new(vec![vec![1], vec![1]], vec![vec![1], vec![1]]);
//!
//! assert!(matches!(nonogram::solve(&puzzle).unwrap(), SolveOne::Found(_)));
//! assert_eq!(nonogram::is_unique(&puzzle, None).unwrap(), Uniqueness::NonUnique);
//! ```

pub mod compiler;
pub mod enumerate;
pub mod extract;
pub mod generate;
pub mod parser;
pub mod puzzle;
pub mod render;
pub mod webpbn;

pub use compiler::{CompiledInstance, Extent, compile};
pub use enumerate::{Enumerator, SolutionCount, SolutionIter, SolveOne, Uniqueness};
pub use extract::extract;
pub use puzzle::{Clue, Dim, Grid, Puzzle};

use crate::csp::DefaultBackend;
use crate::errors::Error;
use std::path::Path;
use std::time::Duration;

/// Finds one solution of `puzzle`.
///
/// # Errors
/// If the puzzle is malformed or the engine fails.
pub fn solve(puzzle: &Puzzle) -> Result<SolveOne, Error> {
    let instance = compile(puzzle)?;
    Enumerator::new(&instance, DefaultBackend::new())?.solve_one()
}

/// Counts the solutions of `puzzle`, stopping at `limit` or after `budget`.
///
/// # Errors
/// If the puzzle is malformed or the engine fails.
pub fn count_solutions(puzzle: &Puzzle, limit: usize, budget: Option<Duration>) -> Result<SolutionCount, Error> {
    let instance = compile(puzzle)?;
    Enumerator::new(&instance, DefaultBackend::new())?.solve_all(limit, budget, |_| {})
}

/// Decides whether `puzzle` has exactly one solution.
///
/// # Errors
/// If the puzzle is malformed or the engine fails.
pub fn is_unique(puzzle: &Puzzle, budget: Option<Duration>) -> Result<Uniqueness, Error> {
    let instance = compile(puzzle)?;
    Enumerator::new(&instance, DefaultBackend::new())?.is_unique(budget)
}

/// Reads a puzzle file, as webpbn XML when its extension is `xml` and in the
/// `.non` format otherwise.
///
/// # Errors
/// As [`parser::parse_file`] or [`webpbn::parse_file`].
pub fn read_puzzle(path: impl AsRef<Path>) -> Result<Puzzle, Error> {
    let path = path.as_ref();
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("xml")) {
        webpbn::parse_file(path)
    } else {
        parser::parse_file(path)
    }
}
