//! Driving a backend to one, several, or all solutions of a compiled puzzle.
//!
//! Solutions are distinct assignments of the extent variables. Every grid
//! produced is also recorded in a set, so a caller can see whether two
//! assignments ever collapsed onto the same picture.

use crate::csp::{Backend, EngineError, SearchStop};
use crate::errors::Error;
use crate::nonogram::compiler::CompiledInstance;
use crate::nonogram::extract::extract;
use crate::nonogram::puzzle::Grid;
use crate::sat::solver::SolveStatus;
use log::{info, warn};
use rustc_hash::FxHashSet;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Outcome of a single solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOne {
    /// A solution.
    Found(Grid),
    /// The clues admit no grid.
    Infeasible,
}

/// Outcome of an enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolutionCount {
    /// Distinct assignments found.
    pub found: usize,
    /// The requested maximum.
    pub limit: usize,
    /// Distinct grids among the solutions found.
    pub distinct_grids: usize,
    /// Why the search stopped.
    pub stop: SearchStop,
}

impl SolutionCount {
    /// `found` is the exact number of solutions.
    #[must_use]
    pub fn is_exhaustive(&self) -> bool {
        self.stop == SearchStop::Exhausted
    }

    /// The search stopped at `limit`; there may be more.
    #[must_use]
    pub fn reached_limit(&self) -> bool {
        self.stop == SearchStop::LimitReached
    }

    /// The time budget ran out before the search finished.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.stop == SearchStop::TimedOut
    }
}

impl Display for SolutionCount {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.stop {
            SearchStop::Exhausted => write!(f, "{}", self.found)?,
            SearchStop::LimitReached => write!(f, ">= {} (limit reached)", self.found)?,
            SearchStop::TimedOut => write!(f, "{} (search truncated)", self.found)?,
        }
        if self.distinct_grids != self.found {
            write!(f, " [{} distinct grids]", self.distinct_grids)?;
        }
        Ok(())
    }
}

/// Whether a puzzle has exactly one solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uniqueness {
    /// Proven to have none.
    NoSolution,
    /// Proven to have exactly one.
    Unique,
    /// At least two were found.
    NonUnique,
    /// The search stopped before settling the question.
    Undetermined {
        /// Solutions found, at most one.
        found: usize,
    },
}

impl From<SolutionCount> for Uniqueness {
    fn from(count: SolutionCount) -> Self {
        match (count.found, count.stop) {
            (2.., _) => Self::NonUnique,
            (found, SearchStop::TimedOut) => Self::Undetermined { found },
            (0, _) => Self::NoSolution,
            (_, SearchStop::Exhausted) => Self::Unique,
            // One solution with a limit of one proves nothing more.
            (found, SearchStop::LimitReached) => Self::Undetermined { found },
        }
    }
}

impl Display for Uniqueness {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSolution => write!(f, "NO SOLUTION"),
            Self::Unique => write!(f, "UNIQUE"),
            Self::NonUnique => write!(f, "NOT UNIQUE"),
            Self::Undetermined { found } => write!(f, "UNDETERMINED ({found} found)"),
        }
    }
}

/// A compiled puzzle loaded into a backend.
///
/// Every query consumes the enumerator: the backend remembers which
/// assignments it has produced, so a second query would silently skip them.
/// Pass `&mut backend` to keep access to it afterwards.
#[derive(Debug)]
pub struct Enumerator<'a, B: Backend> {
    instance: &'a CompiledInstance,
    backend: B,
}

impl<'a, B: Backend> Enumerator<'a, B> {
    /// Loads `instance` into `backend`.
    ///
    /// # Errors
    /// If the backend rejects part of the model.
    pub fn new(instance: &'a CompiledInstance, mut backend: B) -> Result<Self, EngineError> {
        instance.load(&mut backend)?;
        Ok(Self { instance, backend })
    }

    /// The loaded instance.
    #[must_use]
    pub const fn instance(&self) -> &'a CompiledInstance {
        self.instance
    }

    fn grid(&self) -> Result<Grid, EngineError> {
        let values = self.backend.values().ok_or(EngineError::MissingModel)?;
        Ok(extract(self.instance, &values))
    }

    /// Finds one solution, with no time limit.
    ///
    /// # Errors
    /// On a backend failure. An infeasible puzzle is not an error.
    pub fn solve_one(mut self) -> Result<SolveOne, Error> {
        match self.backend.next_solution(None)? {
            SolveStatus::Satisfiable => Ok(SolveOne::Found(self.grid()?)),
            SolveStatus::Unsatisfiable => Ok(SolveOne::Infeasible),
            SolveStatus::Interrupted => Err(EngineError::Interrupted.into()),
        }
    }

    /// The solutions, produced lazily.
    ///
    /// The sequence ends after `limit` grids, when none remain, or once
    /// `budget` has elapsed since this call.
    #[must_use]
    pub fn solutions(self, limit: usize, budget: Option<Duration>) -> SolutionIter<'a, B> {
        SolutionIter {
            deadline: budget.and_then(|budget| Instant::now().checked_add(budget)),
            enumerator: self,
            limit,
            found: 0,
            grids: FxHashSet::default(),
            stop: None,
            failed: false,
        }
    }

    /// Counts up to `limit` solutions within `budget`, handing each grid to
    /// `on_solution` before looking for the next.
    ///
    /// # Errors
    /// On a backend failure.
    pub fn solve_all(
        self,
        limit: usize,
        budget: Option<Duration>,
        mut on_solution: impl FnMut(&Grid),
    ) -> Result<SolutionCount, Error> {
        let Self { instance, mut backend } = self;
        let mut grids = FxHashSet::default();

        let summary = backend.solve_all(limit, budget, &mut |values: &[i32]| {
            let grid = extract(instance, values);
            on_solution(&grid);
            grids.insert(grid);
        })?;

        let count = SolutionCount {
            found: summary.found,
            limit,
            distinct_grids: grids.len(),
            stop: summary.stop,
        };
        log_count(&count);
        Ok(count)
    }

    /// Decides uniqueness by looking for two solutions within `budget`.
    ///
    /// # Errors
    /// On a backend failure.
    pub fn is_unique(self, budget: Option<Duration>) -> Result<Uniqueness, Error> {
        let count = self.solve_all(2, budget, |_| {})?;
        Ok(count.into())
    }
}

fn log_count(count: &SolutionCount) {
    if count.is_truncated() {
        warn!("search truncated after {} solutions", count.found);
    } else {
        info!("enumeration finished: {count}");
    }
    if count.distinct_grids != count.found {
        warn!(
            "{} assignments produced only {} distinct grids",
            count.found, count.distinct_grids
        );
    }
}

/// The lazy sequence of [`Enumerator::solutions`].
///
/// Not restartable: once it ends, [`SolutionIter::summary`] tells why.
#[derive(Debug)]
pub struct SolutionIter<'a, B: Backend> {
    enumerator: Enumerator<'a, B>,
    deadline: Option<Instant>,
    limit: usize,
    found: usize,
    grids: FxHashSet<Grid>,
    stop: Option<SearchStop>,
    failed: bool,
}

impl<B: Backend> SolutionIter<'_, B> {
    /// The outcome, once the sequence has ended without error.
    #[must_use]
    pub fn summary(&self) -> Option<SolutionCount> {
        self.stop.map(|stop| SolutionCount {
            found: self.found,
            limit: self.limit,
            distinct_grids: self.grids.len(),
            stop,
        })
    }

    fn finish(&mut self, stop: SearchStop) {
        self.stop = Some(stop);
        if let Some(count) = self.summary() {
            log_count(&count);
        }
    }
}

impl<B: Backend> Iterator for SolutionIter<'_, B> {
    type Item = Result<Grid, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stop.is_some() || self.failed {
            return None;
        }
        if self.found >= self.limit {
            self.finish(SearchStop::LimitReached);
            return None;
        }

        let grid = match self.enumerator.backend.next_solution(self.deadline) {
            Ok(SolveStatus::Satisfiable) => self.enumerator.grid(),
            Ok(SolveStatus::Unsatisfiable) => {
                self.finish(SearchStop::Exhausted);
                return None;
            }
            Ok(SolveStatus::Interrupted) => {
                self.finish(SearchStop::TimedOut);
                return None;
            }
            Err(e) => Err(e),
        };

        match grid {
            Ok(grid) => {
                self.found += 1;
                self.grids.insert(grid.clone());
                Some(Ok(grid))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csp::DefaultBackend;
    use crate::nonogram::compiler::compile;
    use crate::nonogram::puzzle::Puzzle;

    fn diagonal() -> Puzzle {
        Puzzle::new(vec![vec![1], vec![1]], vec![vec![1], vec![1]])
    }

    #[test]
    fn test_solve_one() {
        let instance = compile(&Puzzle::new(vec![vec![2], vec![2]], vec![vec![2], vec![2]])).unwrap();
        let result = Enumerator::new(&instance, DefaultBackend::new())
            .unwrap()
            .solve_one()
            .unwrap();

        assert_eq!(
            result,
            SolveOne::Found(Grid::from_rows(vec![vec![true, true], vec![true, true]]).unwrap())
        );
    }

    #[test]
    fn test_infeasible() {
        let instance = compile(&Puzzle::new(vec![vec![2]], vec![vec![1]])).unwrap();
        let result = Enumerator::new(&instance, DefaultBackend::new())
            .unwrap()
            .solve_one()
            .unwrap();

        assert_eq!(result, SolveOne::Infeasible);
    }

    #[test]
    fn test_solve_all_calls_back() {
        let instance = compile(&diagonal()).unwrap();
        let mut grids = Vec::new();
        let count = Enumerator::new(&instance, DefaultBackend::new())
            .unwrap()
            .solve_all(10, None, |grid| grids.push(grid.clone()))
            .unwrap();

        assert_eq!(count.found, 2);
        assert_eq!(count.distinct_grids, 2);
        assert!(count.is_exhaustive());
        assert_eq!(count.to_string(), "2");
        assert_eq!(grids.len(), 2);
        assert_ne!(grids[0], grids[1]);
    }

    #[test]
    fn test_cap() {
        let instance = compile(&diagonal()).unwrap();
        let count = Enumerator::new(&instance, DefaultBackend::new())
            .unwrap()
            .solve_all(1, None, |_| {})
            .unwrap();

        assert_eq!(count.found, 1);
        assert!(count.reached_limit());
        assert_eq!(count.to_string(), ">= 1 (limit reached)");
    }

    #[test]
    fn test_uniqueness() {
        let unique = compile(&Puzzle::new(vec![vec![3]], vec![vec![1], vec![1], vec![1]])).unwrap();
        let several = compile(&diagonal()).unwrap();
        let none = compile(&Puzzle::new(vec![vec![1]], vec![vec![]])).unwrap();

        let check = |instance: &CompiledInstance| {
            Enumerator::new(instance, DefaultBackend::new())
                .unwrap()
                .is_unique(None)
                .unwrap()
        };
        assert_eq!(check(&unique), Uniqueness::Unique);
        assert_eq!(check(&several), Uniqueness::NonUnique);
        assert_eq!(check(&none), Uniqueness::NoSolution);
    }

    #[test]
    fn test_zero_budget_truncates() {
        let instance = compile(&diagonal()).unwrap();
        let count = Enumerator::new(&instance, DefaultBackend::new())
            .unwrap()
            .solve_all(10, Some(Duration::ZERO), |_| {})
            .unwrap();

        assert!(count.is_truncated());
        assert_eq!(count.found, 0);
        assert_eq!(count.to_string(), "0 (search truncated)");
        assert_eq!(Uniqueness::from(count), Uniqueness::Undetermined { found: 0 });
    }

    #[test]
    fn test_uniqueness_from_count() {
        let count = |found, stop| SolutionCount {
            found,
            limit: 2,
            distinct_grids: found,
            stop,
        };

        assert_eq!(Uniqueness::from(count(2, SearchStop::LimitReached)), Uniqueness::NonUnique);
        assert_eq!(
            Uniqueness::from(count(1, SearchStop::TimedOut)),
            Uniqueness::Undetermined { found: 1 }
        );
        assert_eq!(Uniqueness::from(count(0, SearchStop::Exhausted)), Uniqueness::NoSolution);
        assert_eq!(Uniqueness::from(count(1, SearchStop::Exhausted)), Uniqueness::Unique);
    }

    #[test]
    fn test_lazy_solutions() {
        let instance = compile(&diagonal()).unwrap();
        let mut backend = DefaultBackend::new();
        let mut solutions = Enumerator::new(&instance, &mut backend).unwrap().solutions(5, None);

        let grids: Vec<Grid> = solutions.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(grids.len(), 2);
        assert!(solutions.next().is_none());

        let summary = solutions.summary().unwrap();
        assert_eq!((summary.found, summary.stop), (2, SearchStop::Exhausted));
        drop(solutions);
        assert_eq!(backend.solves(), 3);
    }

    #[test]
    fn test_lazy_solutions_limit() {
        let instance = compile(&diagonal()).unwrap();
        let mut solutions = Enumerator::new(&instance, DefaultBackend::new())
            .unwrap()
            .solutions(1, None);

        assert!(solutions.summary().is_none());
        assert!(solutions.next().is_some());
        assert!(solutions.next().is_none());
        assert!(solutions.summary().unwrap().reached_limit());
    }
}
