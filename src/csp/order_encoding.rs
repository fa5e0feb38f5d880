//! Order encoding of bounded integers onto the CDCL solver.
//!
//! An integer `x` over `[lo, hi]` owns one Boolean variable `[x >= v]` for
//! every `v` in `lo + 1..=hi`, chained by `[x >= v + 1] -> [x >= v]`. Its
//! value in a model is `lo` plus the number of true bits. Bounds outside the
//! domain are constants, and every gate built on top of them is folded
//! before it reaches the clause database.
//!
//! | constraint            | clauses                                           |
//! |-----------------------|---------------------------------------------------|
//! | `x - y <= k`          | `[x >= v] -> [y >= v - k]` for each `v` of `x`    |
//! | `lo <= x <= hi`       | Tseitin AND of `[x >= lo]` and `not [x >= hi + 1]`|
//! | `OR(spans)`           | Tseitin OR of the span gates                      |
//! | `a <=> b`             | `a -> b`, `b -> a`                                |
//!
//! Successive solutions are found by adding a clause that blocks the last
//! model's integer bits and solving the grown formula again.

use crate::csp::{Backend, Constraint, Difference, Domain, EngineError, Span, VarId};
use crate::sat::assignment::Solutions;
use crate::sat::cdcl::Cdcl;
use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::literal::{Literal, MAX_VARIABLE, Variable};
use crate::sat::solver::{DefaultConfig, SolutionStats, SolveStatus, Solver, SolverConfig};
use log::debug;
use std::marker::PhantomData;
use std::ops::Not;
use std::time::Instant;

/// A literal or a folded constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bit {
    Const(bool),
    Lit(Literal),
}

impl Not for Bit {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Const(b) => Self::Const(!b),
            Self::Lit(lit) => Self::Lit(lit.negated()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IntVar {
    domain: Domain,
    /// Boolean variable of `[x >= lo + 1]`. The remaining bits follow it.
    first: Variable,
}

impl IntVar {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn width(self) -> u32 {
        if self.domain.is_empty() {
            0
        } else {
            (i64::from(self.domain.hi) - i64::from(self.domain.lo)) as u32
        }
    }

    fn bits(self) -> impl Iterator<Item = Variable> {
        self.first..self.first + self.width()
    }

    /// `[x >= v]`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn ge(self, v: i64) -> Bit {
        let (lo, hi) = (i64::from(self.domain.lo), i64::from(self.domain.hi));
        if self.domain.is_empty() || v > hi {
            Bit::Const(false)
        } else if v <= lo {
            Bit::Const(true)
        } else {
            Bit::Lit(Literal::new(self.first + (v - lo - 1) as u32, true))
        }
    }
}

/// A [`Backend`] that compiles the model to CNF and searches it with
/// [`Cdcl`] configured by `C`.
#[derive(Debug, Clone)]
pub struct SatBackend<C: SolverConfig = DefaultConfig> {
    cnf: Cnf,
    ints: Vec<IntVar>,
    hints: Vec<Literal>,
    model: Option<Vec<i32>>,
    inconsistent: bool,
    stats: SolutionStats,
    solves: usize,
    _config: PhantomData<C>,
}

/// The backend used unless a caller picks another configuration.
pub type DefaultBackend = SatBackend<DefaultConfig>;

impl<C: SolverConfig> Default for SatBackend<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: SolverConfig> SatBackend<C> {
    /// An empty model.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cnf: Cnf::default(),
            ints: Vec::new(),
            hints: Vec::new(),
            model: None,
            inconsistent: false,
            stats: SolutionStats::default(),
            solves: 0,
            _config: PhantomData,
        }
    }

    /// The clauses generated so far, including blocking clauses.
    #[must_use]
    pub const fn cnf(&self) -> &Cnf {
        &self.cnf
    }

    /// Search counters summed over every solve.
    #[must_use]
    pub const fn stats(&self) -> SolutionStats {
        self.stats
    }

    /// Number of SAT searches run.
    #[must_use]
    pub const fn solves(&self) -> usize {
        self.solves
    }

    fn int(&self, var: VarId) -> Result<IntVar, EngineError> {
        self.ints
            .get(var.index())
            .copied()
            .ok_or(EngineError::UnknownVariable(var))
    }

    fn reserve(&mut self, count: usize) -> Result<Variable, EngineError> {
        let limit = MAX_VARIABLE as usize;
        if self.cnf.num_vars + count > limit {
            return Err(EngineError::TooManyVariables { limit });
        }
        #[allow(clippy::cast_possible_truncation)]
        let first = (self.cnf.num_vars + 1) as Variable;
        self.cnf.num_vars += count;
        Ok(first)
    }

    fn add_clause(&mut self, bits: impl IntoIterator<Item = Bit>) {
        let mut literals = Vec::new();
        for bit in bits {
            match bit {
                Bit::Const(true) => return,
                Bit::Const(false) => {}
                Bit::Lit(lit) => literals.push(lit),
            }
        }

        let clause = Clause::new(literals);
        if clause.is_empty() {
            self.inconsistent = true;
        } else if !clause.is_tautology() {
            self.cnf.add_clause(clause);
        }
    }

    fn and(&mut self, a: Bit, b: Bit) -> Result<Bit, EngineError> {
        let gate = match (a, b) {
            (Bit::Const(false), _) | (_, Bit::Const(false)) => Bit::Const(false),
            (Bit::Const(true), other) | (other, Bit::Const(true)) => other,
            (Bit::Lit(p), Bit::Lit(q)) if p == q => a,
            (Bit::Lit(p), Bit::Lit(q)) if p == q.negated() => Bit::Const(false),
            (Bit::Lit(_), Bit::Lit(_)) => {
                let t = Bit::Lit(Literal::new(self.reserve(1)?, true));
                self.add_clause([!t, a]);
                self.add_clause([!t, b]);
                self.add_clause([t, !a, !b]);
                t
            }
        };
        Ok(gate)
    }

    fn or(&mut self, bits: Vec<Bit>) -> Result<Bit, EngineError> {
        if bits.contains(&Bit::Const(true)) {
            return Ok(Bit::Const(true));
        }

        let mut inputs: Vec<Bit> = bits.into_iter().filter(|&b| b != Bit::Const(false)).collect();
        inputs.dedup();

        match inputs.as_slice() {
            [] => Ok(Bit::Const(false)),
            [single] => Ok(*single),
            _ => {
                let t = Bit::Lit(Literal::new(self.reserve(1)?, true));
                self.add_clause(std::iter::once(!t).chain(inputs.iter().copied()));
                for &input in &inputs {
                    self.add_clause([t, !input]);
                }
                Ok(t)
            }
        }
    }

    fn span(&mut self, span: &Span) -> Result<Bit, EngineError> {
        let x = self.int(span.var)?;
        if span.lo > span.hi {
            return Ok(Bit::Const(false));
        }
        let above = x.ge(i64::from(span.lo));
        let below = !x.ge(i64::from(span.hi) + 1);
        self.and(above, below)
    }

    fn disjunction(&mut self, spans: &[Span]) -> Result<Bit, EngineError> {
        let bits = spans
            .iter()
            .map(|span| self.span(span))
            .collect::<Result<Vec<_>, _>>()?;
        self.or(bits)
    }

    fn decode(int: IntVar, model: &Solutions) -> i32 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let set = int.bits().filter(|&var| model.value(var) == Some(true)).count() as i32;
        int.domain.lo + set
    }
}

impl<C: SolverConfig> Backend for SatBackend<C> {
    fn new_int_var(&mut self, lb: i32, ub: i32) -> Result<VarId, EngineError> {
        let id = VarId::new(self.ints.len());
        let domain = Domain::new(lb, ub);

        if domain.is_empty() {
            self.inconsistent = true;
            self.ints.push(IntVar { domain, first: 0 });
            return Ok(id);
        }

        let mut int = IntVar { domain, first: 0 };
        int.first = self.reserve(int.width() as usize)?;
        for var in int.bits().skip(1) {
            self.add_clause([Bit::Lit(Literal::new(var, false)), Bit::Lit(Literal::new(var - 1, true))]);
        }
        self.ints.push(int);

        Ok(id)
    }

    fn add_constraint(&mut self, constraint: &Constraint) -> Result<(), EngineError> {
        match constraint {
            Constraint::Linear(Difference { x, y, k }) => {
                let (x, y) = (self.int(*x)?, self.int(*y)?);
                if x.domain.is_empty() || y.domain.is_empty() {
                    return Ok(());
                }
                for v in x.domain.lo..=x.domain.hi {
                    let v = i64::from(v);
                    self.add_clause([!x.ge(v), y.ge(v - i64::from(*k))]);
                }
            }
            Constraint::Equivalence { left, right } => {
                let a = self.disjunction(left)?;
                let b = self.disjunction(right)?;
                self.add_clause([!a, b]);
                self.add_clause([a, !b]);
            }
        }
        Ok(())
    }

    fn add_search_hint(&mut self, hints: &[(VarId, i32)]) -> Result<(), EngineError> {
        for &(var, value) in hints {
            let int = self.int(var)?;
            let lo = i64::from(int.domain.lo);
            for (offset, bit) in (1_i64..).zip(int.bits()) {
                self.hints.push(Literal::new(bit, lo + offset <= i64::from(value)));
            }
        }
        Ok(())
    }

    fn next_solution(&mut self, deadline: Option<Instant>) -> Result<SolveStatus, EngineError> {
        self.model = None;
        if self.inconsistent {
            return Ok(SolveStatus::Unsatisfiable);
        }

        let mut solver: Cdcl<C> = Cdcl::new(self.cnf.clone());
        solver.seed_phases(self.hints.iter().copied());
        let status = solver.solve_until(deadline);

        self.solves += 1;
        self.stats += solver.stats();
        debug!(
            "search {} over {} variables and {} clauses: {status:?}",
            self.solves,
            self.cnf.num_vars,
            self.cnf.len()
        );

        match status {
            SolveStatus::Satisfiable => {}
            SolveStatus::Unsatisfiable => {
                self.inconsistent = true;
                return Ok(status);
            }
            SolveStatus::Interrupted => return Ok(status),
        }

        let model = solver.solutions();
        let values = self.ints.iter().map(|&int| Self::decode(int, &model)).collect();

        let blocking: Vec<_> = self
            .ints
            .iter()
            .flat_map(|int| int.bits())
            .map(|var| Bit::Lit(Literal::new(var, model.value(var) != Some(true))))
            .collect();
        self.add_clause(blocking);

        self.model = Some(values);
        Ok(SolveStatus::Satisfiable)
    }

    fn value(&self, var: VarId) -> Option<i32> {
        self.model.as_ref()?.get(var.index()).copied()
    }

    fn num_vars(&self) -> usize {
        self.ints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csp::SearchStop;
    use crate::sat::restarter::Never;
    use crate::sat::solver::Config;
    use crate::sat::variable_selection::FixedOrder;

    fn all_solutions(backend: &mut impl Backend) -> Vec<Vec<i32>> {
        let mut solutions = Vec::new();
        backend
            .solve_all(usize::MAX, None, &mut |values: &[i32]| solutions.push(values.to_vec()))
            .unwrap();
        solutions.sort();
        solutions
    }

    #[test]
    fn test_ids_are_dense() {
        let mut backend = DefaultBackend::new();
        assert_eq!(backend.new_int_var(0, 3).unwrap(), VarId::new(0));
        assert_eq!(backend.new_int_var(2, 2).unwrap(), VarId::new(1));
        assert_eq!(backend.new_int_var(-1, 1).unwrap(), VarId::new(2));
        assert_eq!(backend.num_vars(), 3);
        assert_eq!(backend.cnf().num_vars, 3 + 2);
    }

    #[test]
    fn test_enumerates_whole_domain() {
        let mut backend = DefaultBackend::new();
        backend.new_int_var(-2, 2).unwrap();

        let solutions = all_solutions(&mut backend);

        assert_eq!(solutions, vec![vec![-2], vec![-1], vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_difference() {
        let mut backend = DefaultBackend::new();
        let x = backend.new_int_var(0, 3).unwrap();
        let y = backend.new_int_var(0, 3).unwrap();
        backend
            .add_constraint(&Constraint::Linear(Difference { x, y, k: -2 }))
            .unwrap();

        let solutions = all_solutions(&mut backend);

        assert_eq!(solutions, vec![vec![0, 2], vec![0, 3], vec![1, 3]]);
    }

    #[test]
    fn test_equivalence_with_empty_side() {
        let mut backend = DefaultBackend::new();
        let x = backend.new_int_var(0, 2).unwrap();
        backend
            .add_constraint(&Constraint::Equivalence {
                left: vec![Span { var: x, lo: 1, hi: 1 }],
                right: vec![],
            })
            .unwrap();

        assert_eq!(all_solutions(&mut backend), vec![vec![0], vec![2]]);
    }

    #[test]
    fn test_equivalence_between_variables() {
        let mut backend = DefaultBackend::new();
        let x = backend.new_int_var(0, 3).unwrap();
        let y = backend.new_int_var(0, 3).unwrap();
        backend
            .add_constraint(&Constraint::Equivalence {
                left: vec![Span { var: x, lo: 0, hi: 1 }, Span { var: x, lo: 3, hi: 5 }],
                right: vec![Span { var: y, lo: 2, hi: 2 }],
            })
            .unwrap();

        let solutions = all_solutions(&mut backend);

        // x in {0, 1, 3} pairs with y = 2; x = 2 pairs with y in {0, 1, 3}.
        assert_eq!(solutions.len(), 6);
        assert!(solutions.iter().all(|s| [0, 1, 3].contains(&s[0]) == (s[1] == 2)));
    }

    #[test]
    fn test_empty_domain_is_infeasible() {
        let mut backend = DefaultBackend::new();
        backend.new_int_var(0, 3).unwrap();
        backend.new_int_var(0, -1).unwrap();

        assert!(!backend.solve().unwrap());
        assert_eq!(backend.value(VarId::new(0)), None);
    }

    #[test]
    fn test_unknown_variable() {
        let mut backend = DefaultBackend::new();
        let x = backend.new_int_var(0, 1).unwrap();
        let ghost = VarId::new(7);

        let result = backend.add_constraint(&Constraint::Linear(Difference { x, y: ghost, k: 0 }));

        assert_eq!(result, Err(EngineError::UnknownVariable(ghost)));
        assert!(backend.add_search_hint(&[(ghost, 1)]).is_err());
    }

    #[test]
    fn test_model_without_bits_has_one_solution() {
        let mut backend = DefaultBackend::new();
        backend.new_int_var(4, 4).unwrap();

        let summary = backend.solve_all(10, None, &mut |_: &[i32]| {}).unwrap();

        assert_eq!(summary.found, 1);
        assert_eq!(summary.stop, SearchStop::Exhausted);
    }

    #[test]
    fn test_limit() {
        let mut backend = DefaultBackend::new();
        backend.new_int_var(0, 4).unwrap();

        let summary = backend.solve_all(3, None, &mut |_: &[i32]| {}).unwrap();

        assert_eq!(summary.found, 3);
        assert_eq!(summary.stop, SearchStop::LimitReached);
    }

    #[test]
    fn test_search_hint_guides_first_solution() {
        let mut backend: SatBackend<Config<FixedOrder, Never>> = SatBackend::new();
        let x = backend.new_int_var(0, 5).unwrap();
        backend.add_search_hint(&[(x, 3)]).unwrap();

        assert!(backend.solve().unwrap());
        assert_eq!(backend.value(x), Some(3));
        assert_eq!(all_solutions(&mut backend).len(), 4);
    }
}
