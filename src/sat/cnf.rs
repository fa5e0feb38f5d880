#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::assignment::Solutions;
use crate::sat::clause::Clause;
use crate::sat::literal::{Literal, Variable};
use std::fmt::{Display, Formatter};
use std::ops::{Index, IndexMut};

/// A formula in conjunctive normal form over variables `1..=num_vars`.
///
/// `Display` writes the formula in DIMACS format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cnf {
    pub clauses: Vec<Clause>,
    pub num_vars: usize,
}

impl Cnf {
    /// Builds a formula from DIMACS-style integer clauses.
    #[must_use]
    pub fn new(clauses: Vec<Vec<i32>>) -> Self {
        let mut cnf = Self::default();
        for clause in clauses {
            cnf.add_clause(Clause::from(clause));
        }
        cnf
    }

    /// Allocates a fresh variable.
    #[allow(clippy::cast_possible_truncation)]
    pub fn new_var(&mut self) -> Variable {
        self.num_vars += 1;
        self.num_vars as Variable
    }

    /// Adds a clause, growing `num_vars` to cover its variables.
    pub fn add_clause(&mut self, clause: Clause) {
        if let Some(max) = clause.iter().map(|lit| lit.variable() as usize).max() {
            self.num_vars = self.num_vars.max(max);
        }
        self.clauses.push(clause);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(Clause::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// Checks that every clause has a literal made true by `solutions`.
    #[must_use]
    pub fn verify(&self, solutions: &Solutions) -> bool {
        self.iter()
            .all(|clause| clause.iter().any(|&lit: &Literal| solutions.check(lit)))
    }
}

impl Index<usize> for Cnf {
    type Output = Clause;

    fn index(&self, index: usize) -> &Self::Output {
        &self.clauses[index]
    }
}

impl IndexMut<usize> for Cnf {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.clauses[index]
    }
}

impl Display for Cnf {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            writeln!(f, "{clause}")?;
        }
        Ok(())
    }
}
