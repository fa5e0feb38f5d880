#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]

use crate::sat::cnf::Cnf;
use crate::sat::literal::{Literal, Variable};
use crate::sat::trail::{Reason, Trail};

/// A learnt clause produced from a conflict.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conflict {
    /// The learnt clause. `learnt[0]` is the negated first unique implication
    /// point and `learnt[1]`, when present, has the highest level among the
    /// remaining literals.
    pub learnt: Vec<Literal>,
    /// Level to backjump to before asserting `learnt[0]`.
    pub backtrack_level: usize,
    /// Variables that took part in the conflict.
    pub to_bump: Vec<Variable>,
}

/// Derives the first-UIP clause from the falsified clause at `conflict`.
///
/// Must be called above level 0. `seen` is scratch space of size
/// `num_vars + 1`, all `false` on entry and on exit.
#[must_use]
pub fn analyse_conflict(cnf: &Cnf, trail: &Trail, seen: &mut [bool], conflict: usize) -> Conflict {
    let level = trail.decision_level();
    debug_assert!(level > 0);

    let mut learnt = vec![Literal::default()];
    let mut to_bump = Vec::new();
    let mut path_c = 0_usize;
    let mut i = trail.len();
    let mut clause_idx = conflict;
    let mut pivot = None;

    loop {
        for &lit in cnf[clause_idx].iter() {
            let var = lit.variable();
            if Some(var) == pivot || seen[var as usize] || trail.level(var) == 0 {
                continue;
            }

            seen[var as usize] = true;
            to_bump.push(var);
            if trail.level(var) >= level {
                path_c += 1;
            } else {
                learnt.push(lit);
            }
        }

        let lit = loop {
            i -= 1;
            if seen[trail[i].variable() as usize] {
                break trail[i];
            }
        };

        let var = lit.variable();
        seen[var as usize] = false;
        path_c -= 1;

        if path_c == 0 {
            learnt[0] = lit.negated();
            break;
        }

        let Reason::Clause(reason) = trail.reason(var) else {
            unreachable!("implied literal {lit} above the UIP has no reason clause");
        };
        pivot = Some(var);
        clause_idx = reason;
    }

    for lit in &learnt[1..] {
        seen[lit.variable() as usize] = false;
    }

    let backtrack_level = if learnt.len() > 1 {
        let (max_idx, max_level) = learnt
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, lit)| (idx, trail.level(lit.variable())))
            .max_by_key(|&(_, level)| level)
            .unwrap_or((1, 0));
        learnt.swap(1, max_idx);
        max_level
    } else {
        0
    };

    Conflict {
        learnt,
        backtrack_level,
        to_bump,
    }
}
