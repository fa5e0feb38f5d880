use crate::sat::literal::{Literal, Variable};
use core::ops::{Index, IndexMut};
use itertools::Itertools;
use rustc_hash::FxHashSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    #[default]
    Unassigned,
    Assigned(bool),
}

impl VarState {
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        !self.is_assigned()
    }

    #[must_use]
    pub const fn value(self) -> Option<bool> {
        match self {
            Self::Assigned(b) => Some(b),
            Self::Unassigned => None,
        }
    }
}

/// Current value of every variable, indexed by variable number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment(Vec<VarState>);

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.0[index as usize]
    }
}

impl IndexMut<Variable> for Assignment {
    fn index_mut(&mut self, index: Variable) -> &mut Self::Output {
        &mut self.0[index as usize]
    }
}

impl Assignment {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![VarState::Unassigned; num_vars + 1])
    }

    /// Makes `lit` true.
    pub fn assign(&mut self, lit: Literal) {
        self[lit.variable()] = VarState::Assigned(lit.polarity());
    }

    pub fn unassign(&mut self, var: Variable) {
        self[var] = VarState::Unassigned;
    }

    #[must_use]
    pub fn var_value(&self, var: Variable) -> Option<bool> {
        self.0.get(var as usize).and_then(|state| state.value())
    }

    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.var_value(lit.variable())
            .map(|value| value == lit.polarity())
    }

    #[must_use]
    pub fn num_vars(&self) -> usize {
        self.0.len() - 1
    }

    #[must_use]
    pub fn all_assigned(&self) -> bool {
        self.0.iter().skip(1).all(|state| state.is_assigned())
    }

    /// The assigned literals as a model. Variable 0 is skipped.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_solutions(&self) -> Solutions {
        Solutions(
            self.0
                .iter()
                .enumerate()
                .skip(1)
                .filter_map(|(var, state)| {
                    state
                        .value()
                        .map(|value| Literal::new(var as Variable, value).to_i32())
                })
                .collect(),
        )
    }
}

/// A model: the set of DIMACS literals that hold.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Solutions(FxHashSet<i32>);

impl Solutions {
    /// `true` if `lit` holds in the model.
    #[must_use]
    pub fn check(&self, lit: Literal) -> bool {
        self.0.contains(&lit.to_i32())
    }

    /// Value of `var` in the model, `None` when the model leaves it open.
    #[must_use]
    pub fn value(&self, var: Variable) -> Option<bool> {
        if self.check(Literal::new(var, true)) {
            Some(true)
        } else if self.check(Literal::new(var, false)) {
            Some(false)
        } else {
            None
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i32>> for Solutions {
    fn from(literals: Vec<i32>) -> Self {
        Self(literals.into_iter().collect())
    }
}

impl Display for Solutions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sorted = self.0.iter().sorted_by_key(|lit| lit.unsigned_abs()).join(" ");
        write!(f, "{sorted}")
    }
}
