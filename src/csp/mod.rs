//! Integer constraint models and the engines that solve them.
//!
//! A model is built through the [`Backend`] trait: bounded integer variables,
//! difference constraints, and equivalences between disjunctions of interval
//! membership tests. The only engine shipped is [`SatBackend`], which
//! order-encodes the integers onto the CDCL solver in [`crate::sat`].

pub mod backend;
pub mod order_encoding;

pub use backend::{Backend, SearchStop, SearchSummary};
pub use order_encoding::{DefaultBackend, SatBackend};

use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Handle to an integer variable. Backends hand these out densely, in
/// creation order, starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VarId(u32);

impl VarId {
    /// The id of the `index`-th variable created.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the variable in creation order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for VarId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Inclusive integer bounds `[lo, hi]`. Empty when `lo > hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Domain {
    /// Smallest allowed value.
    pub lo: i32,
    /// Largest allowed value.
    pub hi: i32,
}

impl Domain {
    /// The interval `[lo, hi]`.
    #[must_use]
    pub const fn new(lo: i32, hi: i32) -> Self {
        Self { lo, hi }
    }

    /// `true` when no value fits.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.lo > self.hi
    }

    /// `true` when `value` lies in the interval.
    #[must_use]
    pub const fn contains(self, value: i32) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// The test `lo <= var <= hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    /// Variable under test.
    pub var: VarId,
    /// Inclusive lower end.
    pub lo: i32,
    /// Inclusive upper end.
    pub hi: i32,
}

impl Span {
    /// Evaluates the test against a value of `var`.
    #[must_use]
    pub const fn holds(&self, value: i32) -> bool {
        self.lo <= value && value <= self.hi
    }
}

/// A disjunction of spans. The empty disjunction is false.
pub type Disjunction = Vec<Span>;

/// The linear inequality `x - y <= k`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Difference {
    /// Minuend.
    pub x: VarId,
    /// Subtrahend.
    pub y: VarId,
    /// Bound on `x - y`.
    pub k: i32,
}

/// A constraint a [`Backend`] accepts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    /// A difference bound between two variables.
    Linear(Difference),
    /// `OR(left) <=> OR(right)`.
    Equivalence {
        /// First disjunction.
        left: Disjunction,
        /// Second disjunction.
        right: Disjunction,
    },
}

impl Constraint {
    /// Evaluates the constraint against a full set of variable values
    /// indexed by [`VarId::index`].
    #[must_use]
    pub fn holds(&self, values: &[i32]) -> bool {
        let any = |spans: &[Span]| spans.iter().any(|s| s.holds(values[s.var.index()]));
        match self {
            Self::Linear(Difference { x, y, k }) => values[x.index()] - values[y.index()] <= *k,
            Self::Equivalence { left, right } => any(left) == any(right),
        }
    }
}

/// A failure inside a backend, as opposed to an infeasible model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A constraint or hint referred to a variable the backend never created.
    #[error("unknown variable {0}")]
    UnknownVariable(VarId),

    /// The encoding needs more Boolean variables than the engine can address.
    #[error("model needs more than {limit} boolean variables")]
    TooManyVariables {
        /// The addressable maximum.
        limit: usize,
    },

    /// The engine reported a solution but holds no value for some variable.
    #[error("engine reported a solution without a complete model")]
    MissingModel,

    /// A search without a deadline came back interrupted.
    #[error("search was interrupted without a deadline")]
    Interrupted,

    /// Variables were not created in the order the caller expected.
    #[error("backend returned variable {got} where {expected} was expected")]
    VariableOrder {
        /// The id the caller expected.
        expected: VarId,
        /// The id the backend returned.
        got: VarId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain() {
        assert!(Domain::new(2, 1).is_empty());
        assert!(Domain::new(0, 0).contains(0));
        assert!(!Domain::new(0, 3).contains(4));
    }

    #[test]
    fn test_constraint_holds() {
        let (a, b) = (VarId::new(0), VarId::new(1));
        let precedes = Constraint::Linear(Difference { x: a, y: b, k: -3 });

        assert!(precedes.holds(&[0, 3]));
        assert!(!precedes.holds(&[1, 3]));

        let equivalence = Constraint::Equivalence {
            left: vec![Span { var: a, lo: 0, hi: 1 }],
            right: vec![],
        };
        assert!(equivalence.holds(&[2, 0]));
        assert!(!equivalence.holds(&[1, 0]));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            EngineError::UnknownVariable(VarId::new(4)).to_string(),
            "unknown variable v4"
        );
    }
}
