#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use crate::sat::literal::{Literal, Variable};
use std::ops::Index;

#[derive(Debug, Clone, PartialEq, Eq, Default, Copy, Hash, PartialOrd, Ord)]
pub enum Reason {
    #[default]
    Decision,
    /// Fixed at level 0 by a unit clause.
    Unit,
    /// Implied by the clause at this index.
    Clause(usize),
}

/// Assigned literals in assignment order, with the level and reason of each
/// variable and the trail position where every decision level starts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trail {
    t: Vec<Literal>,
    level_starts: Vec<usize>,
    levels: Vec<usize>,
    reasons: Vec<Reason>,
    /// Next trail position to propagate.
    pub curr_idx: usize,
}

impl Index<usize> for Trail {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.t[index]
    }
}

impl Trail {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            t: Vec::with_capacity(num_vars),
            level_starts: Vec::new(),
            levels: vec![0; num_vars + 1],
            reasons: vec![Reason::Decision; num_vars + 1],
            curr_idx: 0,
        }
    }

    #[must_use]
    pub fn decision_level(&self) -> usize {
        self.level_starts.len()
    }

    pub fn new_decision_level(&mut self) {
        self.level_starts.push(self.t.len());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.t.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn push(&mut self, lit: Literal, reason: Reason) {
        let var = lit.variable() as usize;
        self.levels[var] = self.decision_level();
        self.reasons[var] = reason;
        self.t.push(lit);
    }

    #[must_use]
    pub fn level(&self, var: Variable) -> usize {
        self.levels[var as usize]
    }

    #[must_use]
    pub fn reason(&self, var: Variable) -> Reason {
        self.reasons[var as usize]
    }

    /// Pops every literal above `level`, most recent first.
    pub fn backstep_to(&mut self, level: usize) -> impl Iterator<Item = Literal> + '_ {
        let start = if level < self.decision_level() {
            let start = self.level_starts[level];
            self.level_starts.truncate(level);
            start
        } else {
            self.t.len()
        };
        self.curr_idx = self.curr_idx.min(start);
        self.t.drain(start..).rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        let mut trail = Trail::new(3);
        trail.push(Literal::new(1, true), Reason::Unit);
        trail.new_decision_level();
        trail.push(Literal::new(2, false), Reason::Decision);
        trail.push(Literal::new(3, true), Reason::Clause(0));

        assert_eq!(trail.decision_level(), 1);
        assert_eq!(trail.level(1), 0);
        assert_eq!(trail.level(3), 1);
        assert_eq!(trail.reason(3), Reason::Clause(0));
    }

    #[test]
    fn test_backstep_to() {
        let mut trail = Trail::new(3);
        trail.push(Literal::new(1, true), Reason::Unit);
        trail.new_decision_level();
        trail.push(Literal::new(2, true), Reason::Decision);
        trail.new_decision_level();
        trail.push(Literal::new(3, true), Reason::Decision);
        trail.curr_idx = 3;

        let popped: Vec<_> = trail.backstep_to(0).collect();

        assert_eq!(popped, vec![Literal::new(3, true), Literal::new(2, true)]);
        assert_eq!(trail.len(), 1);
        assert_eq!(trail.decision_level(), 0);
        assert_eq!(trail.curr_idx, 1);
    }
}
