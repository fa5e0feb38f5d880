#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conflict-driven clause learning.
//!
//! The search alternates unit propagation over two watched literals with
//! decisions taken from the configured [`VariableSelection`] heuristic. Every
//! conflict is analysed down to its first unique implication point; the
//! resulting clause is learnt, the search backjumps to the second highest
//! level in that clause, and the restart strategy is consulted. Decisions use
//! saved phases, which callers may seed before solving.
//!
//! A deadline, when given, is polled on the first search step and then every
//! few hundred, so that a long search can be abandoned with
//! [`SolveStatus::Interrupted`].

use crate::sat::assignment::{Assignment, Solutions};
use crate::sat::clause::Clause;
use crate::sat::cnf::Cnf;
use crate::sat::conflict_analysis::{Conflict, analyse_conflict};
use crate::sat::literal::Literal;
use crate::sat::phase_saving::SavedPhases;
use crate::sat::restarter::Restarter;
use crate::sat::solver::{DefaultConfig, SolutionStats, SolveStatus, Solver, SolverConfig};
use crate::sat::trail::{Reason, Trail};
use crate::sat::variable_selection::VariableSelection;
use crate::sat::watch::WatchedLiterals;
use std::time::Instant;

const CLOCK_CHECK_MASK: u64 = 0xFF;

#[derive(Debug, Clone)]
pub struct Cdcl<C: SolverConfig = DefaultConfig> {
    /// Original clauses followed by learnt ones.
    pub cnf: Cnf,
    assignment: Assignment,
    trail: Trail,
    watches: WatchedLiterals,
    selector: C::VariableSelector,
    restarter: C::Restarter,
    phases: SavedPhases,
    seen: Vec<bool>,
    stats: SolutionStats,
    inconsistent: bool,
    steps: u64,
}

impl<C: SolverConfig> Cdcl<C> {
    /// Sets the phase each literal's variable is first decided with.
    pub fn seed_phases(&mut self, literals: impl IntoIterator<Item = Literal>) {
        for lit in literals {
            self.phases.seed(lit.variable(), lit.polarity());
        }
    }

    fn enqueue(&mut self, lit: Literal, reason: Reason) {
        self.assignment.assign(lit);
        self.trail.push(lit, reason);
    }

    /// Adds an original clause at level 0.
    fn attach(&mut self, clause: Clause) {
        if clause.is_tautology() {
            return;
        }

        match clause.len() {
            0 => self.inconsistent = true,
            1 => {
                let lit = clause[0];
                match self.assignment.literal_value(lit) {
                    Some(true) => {}
                    Some(false) => self.inconsistent = true,
                    None => self.enqueue(lit, Reason::Unit),
                }
                self.cnf.clauses.push(clause);
            }
            _ => {
                let idx = self.cnf.len();
                self.watches.add_clause(&clause, idx);
                self.cnf.clauses.push(clause);
            }
        }
    }

    fn learn(&mut self, learnt: Vec<Literal>) {
        let asserting = learnt[0];
        self.stats.learnt_clauses += 1;

        if learnt.len() == 1 {
            self.enqueue(asserting, Reason::Unit);
            self.cnf.clauses.push(Clause::learnt(learnt));
            return;
        }

        let idx = self.cnf.len();
        let clause = Clause::learnt(learnt);
        self.watches.add_clause(&clause, idx);
        self.cnf.clauses.push(clause);
        self.enqueue(asserting, Reason::Clause(idx));
    }

    fn backtrack(&mut self, level: usize) {
        for lit in self.trail.backstep_to(level) {
            self.assignment.unassign(lit.variable());
            self.phases.save(lit);
            self.selector.on_unassign(lit.variable());
        }
    }

    /// Propagates every pending trail literal. Returns the index of a
    /// falsified clause on conflict.
    fn propagate(&mut self) -> Option<usize> {
        while self.trail.curr_idx < self.trail.len() {
            let false_lit = self.trail[self.trail.curr_idx].negated();
            self.trail.curr_idx += 1;
            self.stats.propagations += 1;

            let mut watchers = self.watches.take(false_lit);
            let mut conflict = None;
            let mut i = 0;
            let mut j = 0;

            while i < watchers.len() {
                let idx = watchers[i];
                i += 1;

                let clause = &mut self.cnf.clauses[idx];
                if clause[0] == false_lit {
                    clause.swap(0, 1);
                }

                let first = clause[0];
                if self.assignment.literal_value(first) == Some(true) {
                    watchers[j] = idx;
                    j += 1;
                    continue;
                }

                let replacement = (2..clause.len())
                    .find(|&k| self.assignment.literal_value(clause[k]) != Some(false));

                if let Some(k) = replacement {
                    clause.swap(1, k);
                    let new_watch = clause[1];
                    self.watches[new_watch].push(idx);
                    continue;
                }

                watchers[j] = idx;
                j += 1;

                if self.assignment.literal_value(first) == Some(false) {
                    conflict = Some(idx);
                    while i < watchers.len() {
                        watchers[j] = watchers[i];
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.assignment.assign(first);
                    self.trail.push(first, Reason::Clause(idx));
                }
            }

            watchers.truncate(j);
            self.watches[false_lit] = watchers;

            if conflict.is_some() {
                return conflict;
            }
        }

        None
    }

    fn deadline_passed(&mut self, deadline: Option<Instant>) -> bool {
        let poll = self.steps & CLOCK_CHECK_MASK == 0;
        self.steps = self.steps.wrapping_add(1);
        poll && deadline.is_some_and(|d| Instant::now() >= d)
    }
}

impl<C: SolverConfig> Solver for Cdcl<C> {
    fn new(cnf: Cnf) -> Self {
        let num_vars = cnf.num_vars;

        let mut solver = Self {
            cnf: Cnf {
                clauses: Vec::with_capacity(cnf.len()),
                num_vars,
            },
            assignment: Assignment::new(num_vars),
            trail: Trail::new(num_vars),
            watches: WatchedLiterals::new(num_vars),
            selector: C::VariableSelector::new(num_vars),
            restarter: C::Restarter::new(),
            phases: SavedPhases::new(num_vars),
            seen: vec![false; num_vars + 1],
            stats: SolutionStats::default(),
            inconsistent: false,
            steps: 0,
        };

        for clause in cnf.clauses {
            solver.attach(clause);
        }

        solver
    }

    fn solve_until(&mut self, deadline: Option<Instant>) -> SolveStatus {
        if self.inconsistent {
            return SolveStatus::Unsatisfiable;
        }

        loop {
            if self.deadline_passed(deadline) {
                return SolveStatus::Interrupted;
            }

            if let Some(conflict) = self.propagate() {
                self.stats.conflicts += 1;

                if self.trail.decision_level() == 0 {
                    self.inconsistent = true;
                    return SolveStatus::Unsatisfiable;
                }

                let Conflict {
                    learnt,
                    backtrack_level,
                    to_bump,
                } = analyse_conflict(&self.cnf, &self.trail, &mut self.seen, conflict);

                self.selector.bumps(to_bump);
                self.selector.decay();
                self.backtrack(backtrack_level);
                self.learn(learnt);

                if self.restarter.should_restart() {
                    self.stats.restarts += 1;
                    self.backtrack(0);
                }
            } else {
                let Some(var) = self.selector.pick(&self.assignment) else {
                    return SolveStatus::Satisfiable;
                };

                self.stats.decisions += 1;
                self.trail.new_decision_level();
                let lit = self.phases.get_next(var);
                self.enqueue(lit, Reason::Decision);
            }
        }
    }

    fn solutions(&self) -> Solutions {
        self.assignment.get_solutions()
    }

    fn stats(&self) -> SolutionStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::restarter::{Geometric, Never};
    use crate::sat::solver::Config;
    use crate::sat::variable_selection::FixedOrder;

    /// `pigeons` pigeons into `holes` holes; unsatisfiable when there are
    /// more pigeons than holes.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn pigeonhole(pigeons: usize, holes: usize) -> Cnf {
        let var = |p: usize, h: usize| (p * holes + h + 1) as i32;
        let mut clauses = Vec::new();

        for p in 0..pigeons {
            clauses.push((0..holes).map(|h| var(p, h)).collect());
        }
        for h in 0..holes {
            for p in 0..pigeons {
                for q in p + 1..pigeons {
                    clauses.push(vec![-var(p, h), -var(q, h)]);
                }
            }
        }

        Cnf::new(clauses)
    }

    #[test]
    fn test_solve_units() {
        let cnf = Cnf::new(vec![vec![1], vec![-2], vec![3]]);
        let mut solver: Cdcl = Cdcl::new(cnf.clone());

        let model = solver.solve();

        assert_eq!(model, Some(Solutions::from(vec![1, -2, 3])));
    }

    #[test]
    fn test_solve_unsat_units() {
        let cnf = Cnf::new(vec![vec![1], vec![-1]]);
        let mut solver: Cdcl = Cdcl::new(cnf);

        assert_eq!(solver.solve_until(None), SolveStatus::Unsatisfiable);
    }

    #[test]
    fn test_solve_empty_clause() {
        let mut cnf = Cnf::new(vec![vec![1, 2]]);
        cnf.add_clause(Clause::default());
        let mut solver: Cdcl = Cdcl::new(cnf);

        assert_eq!(solver.solve(), None);
    }

    #[test]
    fn test_solve_model_verifies() {
        let cnf = Cnf::new(vec![
            vec![1, 2, -3],
            vec![-1, 3],
            vec![-2, 3, 4],
            vec![-4, -1],
            vec![2, 4],
            vec![-3, -2, 1],
        ]);
        let mut solver: Cdcl = Cdcl::new(cnf.clone());

        let model = solver.solve().unwrap();

        assert!(cnf.verify(&model));
        assert_eq!(model.len(), 4);
    }

    #[test]
    fn test_pigeonhole_unsat() {
        let mut solver: Cdcl = Cdcl::new(pigeonhole(5, 4));

        assert_eq!(solver.solve_until(None), SolveStatus::Unsatisfiable);
        assert!(solver.stats().conflicts > 0);
        assert!(solver.stats().learnt_clauses > 0);
    }

    #[test]
    fn test_pigeonhole_sat_with_other_configs() {
        let cnf = pigeonhole(4, 4);

        let mut fixed: Cdcl<Config<FixedOrder, Never>> = Cdcl::new(cnf.clone());
        let mut geometric: Cdcl<Config<FixedOrder, Geometric<2>>> = Cdcl::new(cnf.clone());

        assert!(fixed.solve().is_some_and(|model| cnf.verify(&model)));
        assert!(geometric.solve().is_some_and(|model| cnf.verify(&model)));
    }

    #[test]
    fn test_seeded_phases_are_followed() {
        let cnf = Cnf::new(vec![vec![1, 2, 3]]);
        let mut solver: Cdcl<Config<FixedOrder, Never>> = Cdcl::new(cnf);
        solver.seed_phases([Literal::from(1), Literal::from(-2), Literal::from(3)]);

        let model = solver.solve().unwrap();

        assert_eq!(model, Solutions::from(vec![1, -2, 3]));
    }

    #[test]
    fn test_past_deadline_interrupts() {
        let mut solver: Cdcl = Cdcl::new(pigeonhole(9, 8));

        let status = solver.solve_until(Some(Instant::now()));

        assert_eq!(status, SolveStatus::Interrupted);
    }

    #[test]
    fn test_deadline_polled_before_first_step() {
        let mut solver: Cdcl = Cdcl::new(Cnf::new(vec![vec![1, 2]]));
        assert_eq!(solver.solve_until(Some(Instant::now())), SolveStatus::Interrupted);

        let mut solver: Cdcl = Cdcl::new(Cnf::new(vec![vec![1, 2]]));
        assert_eq!(solver.solve_until(None), SolveStatus::Satisfiable);
    }

    #[test]
    fn test_enumerate_by_blocking() {
        let mut cnf = Cnf::new(vec![vec![1, 2]]);
        let mut count = 0;

        loop {
            let mut solver: Cdcl = Cdcl::new(cnf.clone());
            let Some(model) = solver.solve() else {
                break;
            };
            count += 1;
            let blocking = (1..=2).map(|var| Literal::new(var, model.value(var) != Some(true)));
            cnf.add_clause(Clause::new(blocking));
        }

        assert_eq!(count, 3);
    }
}
