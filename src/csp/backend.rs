use crate::csp::{Constraint, EngineError, VarId};
use crate::sat::solver::SolveStatus;
use std::time::{Duration, Instant};

/// Why an enumeration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStop {
    /// Every solution has been produced.
    Exhausted,
    /// The requested number of solutions was produced. More may exist.
    LimitReached,
    /// The time budget ran out. More may exist.
    TimedOut,
}

/// Result of [`Backend::solve_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchSummary {
    /// Solutions produced.
    pub found: usize,
    /// Why the enumeration stopped.
    pub stop: SearchStop,
}

/// The capabilities a constraint engine must offer.
///
/// Variables are created before any constraint that mentions them. Every
/// satisfiable answer of [`Backend::next_solution`] is excluded from later
/// answers, so repeated calls walk through distinct assignments of the
/// integer variables.
pub trait Backend {
    /// Creates an integer variable over `[lb, ub]`. An empty range is
    /// accepted and makes the model infeasible.
    ///
    /// # Errors
    /// When the engine cannot represent the variable.
    fn new_int_var(&mut self, lb: i32, ub: i32) -> Result<VarId, EngineError>;

    /// # Errors
    /// When the constraint mentions an unknown variable or cannot be encoded.
    fn add_constraint(&mut self, constraint: &Constraint) -> Result<(), EngineError>;

    /// Suggests values to try first. Never changes which assignments are
    /// solutions.
    ///
    /// # Errors
    /// When a hint mentions an unknown variable.
    fn add_search_hint(&mut self, hints: &[(VarId, i32)]) -> Result<(), EngineError>;

    /// Looks for an assignment not returned before, giving up at `deadline`.
    ///
    /// # Errors
    /// On an internal engine failure.
    fn next_solution(&mut self, deadline: Option<Instant>) -> Result<SolveStatus, EngineError>;

    /// Value of `var` in the last solution found.
    fn value(&self, var: VarId) -> Option<i32>;

    /// Number of variables created so far.
    fn num_vars(&self) -> usize;

    /// Decides feasibility without a time limit.
    ///
    /// # Errors
    /// On an internal engine failure.
    fn solve(&mut self) -> Result<bool, EngineError> {
        Ok(self.next_solution(None)? == SolveStatus::Satisfiable)
    }

    /// Values of all variables in creation order, if a solution is available.
    fn values(&self) -> Option<Vec<i32>> {
        (0..self.num_vars())
            .map(|idx| self.value(VarId::new(idx)))
            .collect()
    }

    /// Produces up to `limit` distinct solutions within `budget`, passing the
    /// values of each to `on_solution` before searching for the next.
    ///
    /// # Errors
    /// On an internal engine failure. Solutions already passed to
    /// `on_solution` stay valid.
    fn solve_all(
        &mut self,
        limit: usize,
        budget: Option<Duration>,
        on_solution: &mut dyn FnMut(&[i32]),
    ) -> Result<SearchSummary, EngineError> {
        let deadline = budget.and_then(|budget| Instant::now().checked_add(budget));
        let mut found = 0;

        loop {
            if found >= limit {
                return Ok(SearchSummary {
                    found,
                    stop: SearchStop::LimitReached,
                });
            }

            let stop = match self.next_solution(deadline)? {
                SolveStatus::Satisfiable => {
                    found += 1;
                    let values = self.values().ok_or(EngineError::MissingModel)?;
                    on_solution(values.as_slice());
                    continue;
                }
                SolveStatus::Unsatisfiable => SearchStop::Exhausted,
                SolveStatus::Interrupted => SearchStop::TimedOut,
            };

            return Ok(SearchSummary { found, stop });
        }
    }
}

impl<B: Backend + ?Sized> Backend for &mut B {
    fn new_int_var(&mut self, lb: i32, ub: i32) -> Result<VarId, EngineError> {
        (**self).new_int_var(lb, ub)
    }

    fn add_constraint(&mut self, constraint: &Constraint) -> Result<(), EngineError> {
        (**self).add_constraint(constraint)
    }

    fn add_search_hint(&mut self, hints: &[(VarId, i32)]) -> Result<(), EngineError> {
        (**self).add_search_hint(hints)
    }

    fn next_solution(&mut self, deadline: Option<Instant>) -> Result<SolveStatus, EngineError> {
        (**self).next_solution(deadline)
    }

    fn value(&self, var: VarId) -> Option<i32> {
        (**self).value(var)
    }

    fn num_vars(&self) -> usize {
        (**self).num_vars()
    }
}
