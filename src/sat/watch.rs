#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::clause::Clause;
use crate::sat::literal::Literal;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

pub type WatchList = SmallVec<[usize; 6]>;

/// For every literal, the clauses that currently watch it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchedLiterals(Vec<WatchList>);

impl WatchedLiterals {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![WatchList::new(); 2 * (num_vars + 1)])
    }

    /// Watches the first two literals of `clause`.
    pub fn add_clause(&mut self, clause: &Clause, idx: usize) {
        debug_assert!(clause.len() >= 2);
        debug_assert_ne!(clause[0], clause[1]);

        self[clause[0]].push(idx);
        self[clause[1]].push(idx);
    }

    /// Detaches the watch list of `lit` so it can be rewritten while the
    /// other lists are updated.
    pub fn take(&mut self, lit: Literal) -> WatchList {
        std::mem::take(&mut self[lit])
    }
}

impl Index<Literal> for WatchedLiterals {
    type Output = WatchList;

    fn index(&self, index: Literal) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl IndexMut<Literal> for WatchedLiterals {
    fn index_mut(&mut self, index: Literal) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_clause() {
        let mut watches = WatchedLiterals::new(3);
        watches.add_clause(&Clause::from(vec![1, -2, 3]), 0);

        assert_eq!(watches[Literal::from(1)].as_slice(), &[0]);
        assert_eq!(watches[Literal::from(-2)].as_slice(), &[0]);
        assert!(watches[Literal::from(3)].is_empty());
        assert!(watches[Literal::from(2)].is_empty());
    }
}
