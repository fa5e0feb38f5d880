#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::literal::Literal;
use core::ops::{Index, IndexMut};
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};

/// A disjunction of literals.
///
/// Duplicate literals are removed on construction. The first two literals are
/// the watched ones once the clause is attached to a solver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause {
    pub literals: SmallVec<[Literal; 8]>,
    pub learnt: bool,
}

impl Clause {
    #[must_use]
    pub fn new(literals: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: literals.into_iter().unique().collect(),
            learnt: false,
        }
    }

    #[must_use]
    pub fn learnt(literals: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            learnt: true,
            ..Self::new(literals)
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    /// `true` if the clause contains a literal and its negation.
    #[must_use]
    pub fn is_tautology(&self) -> bool {
        self.literals
            .iter()
            .any(|&lit| self.literals.contains(&lit.negated()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn swap(&mut self, i: usize, j: usize) {
        self.literals.swap(i, j);
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl IndexMut<usize> for Clause {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.literals[index]
    }
}

impl From<Vec<i32>> for Clause {
    fn from(literals: Vec<i32>) -> Self {
        Self::new(literals.into_iter().map(Literal::from_i32))
    }
}

impl From<&[Literal]> for Clause {
    fn from(literals: &[Literal]) -> Self {
        Self::new(literals.iter().copied())
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for lit in &self.literals {
            write!(f, "{lit} ")?;
        }
        write!(f, "0")
    }
}
