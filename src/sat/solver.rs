#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The solver interface and its compile-time configuration.
//!
//! A solver is assembled from a variable selection heuristic and a restart
//! strategy, chosen through a [`SolverConfig`] type:
//!
//! ```rust
//! use nonogram_solver::sat::cdcl::Cdcl;
//! use nonogram_solver::sat::cnf::Cnf;
//! use nonogram_solver::sat::restarter::Never;
//! use nonogram_solver::sat::solver::{Config, Solver};
//! use nonogram_solver::sat::variable_selection::FixedOrder;
//!
//! let cnf = Cnf::new(vec![vec![1, 2], vec![-1]]);
//! let mut solver: Cdcl<Config<FixedOrder, Never>> = Cdcl::new(cnf);
//! let model = solver.solve().unwrap();
//! assert_eq!(model.value(2), Some(true));
//! ```

use crate::sat::assignment::Solutions;
use crate::sat::cnf::Cnf;
use crate::sat::restarter::{Luby, Restarter};
use crate::sat::variable_selection::{VariableSelection, Vsids};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::time::Instant;

/// Counters collected during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolutionStats {
    pub conflicts: usize,
    pub decisions: usize,
    pub propagations: usize,
    pub restarts: usize,
    pub learnt_clauses: usize,
}

impl std::ops::AddAssign for SolutionStats {
    fn add_assign(&mut self, rhs: Self) {
        self.conflicts += rhs.conflicts;
        self.decisions += rhs.decisions;
        self.propagations += rhs.propagations;
        self.restarts += rhs.restarts;
        self.learnt_clauses += rhs.learnt_clauses;
    }
}

/// Outcome of a search that may be cut short by a deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    Satisfiable,
    Unsatisfiable,
    /// The deadline passed before the search finished.
    Interrupted,
}

pub trait SolverConfig: Debug + Clone {
    type VariableSelector: VariableSelection;
    type Restarter: Restarter;
}

/// A configuration assembled from its parts.
#[derive(Debug, Clone, Default)]
pub struct Config<V, R>(PhantomData<(V, R)>);

impl<V: VariableSelection, R: Restarter> SolverConfig for Config<V, R> {
    type VariableSelector = V;
    type Restarter = R;
}

pub type DefaultConfig = Config<Vsids, Luby<100>>;

pub trait Solver {
    fn new(cnf: Cnf) -> Self;

    /// Searches until a model is found, the formula is refuted, or
    /// `deadline` passes.
    fn solve_until(&mut self, deadline: Option<Instant>) -> SolveStatus;

    /// The model of the last satisfiable search.
    fn solutions(&self) -> Solutions;

    fn stats(&self) -> SolutionStats;

    /// Searches without a deadline and returns the model, if any.
    fn solve(&mut self) -> Option<Solutions> {
        match self.solve_until(None) {
            SolveStatus::Satisfiable => Some(self.solutions()),
            SolveStatus::Unsatisfiable | SolveStatus::Interrupted => None,
        }
    }
}
