#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Decision variable heuristics.
//!
//! `Vsids` keeps an activity score per variable, bumped for every variable
//! that takes part in a conflict and decayed geometrically, and picks the
//! most active unassigned variable from a lazily maintained heap. `FixedOrder`
//! picks the lowest numbered unassigned variable and is mostly useful as a
//! baseline.

use crate::sat::assignment::Assignment;
use crate::sat::literal::Variable;
use clap::ValueEnum;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fmt::{Debug, Display};

pub trait VariableSelection: Debug + Clone {
    fn new(num_vars: usize) -> Self;

    /// The next decision variable, or `None` once every variable is assigned.
    fn pick(&mut self, assignment: &Assignment) -> Option<Variable>;

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T);

    /// Called once per conflict.
    fn decay(&mut self);

    /// Called for every variable that becomes unassigned on backtracking.
    fn on_unassign(&mut self, var: Variable);
}

const DEFAULT_DECAY: f64 = 0.95;
const RESCALE_LIMIT: f64 = 1e100;

#[derive(Debug, Clone)]
pub struct Vsids {
    activity: Vec<f64>,
    heap: BinaryHeap<(OrderedFloat<f64>, Reverse<Variable>)>,
    increment: f64,
}

impl Vsids {
    #[must_use]
    pub fn activity(&self, var: Variable) -> f64 {
        self.activity[var as usize]
    }

    #[allow(clippy::cast_possible_truncation)]
    fn rebuild(&mut self) {
        self.heap = self
            .activity
            .iter()
            .enumerate()
            .skip(1)
            .map(|(var, &act)| (OrderedFloat(act), Reverse(var as Variable)))
            .collect();
    }

    fn push(&mut self, var: Variable) {
        self.heap
            .push((OrderedFloat(self.activity[var as usize]), Reverse(var)));
    }

    fn bump(&mut self, var: Variable) {
        let act = &mut self.activity[var as usize];
        *act += self.increment;

        if *act > RESCALE_LIMIT {
            for act in &mut self.activity {
                *act /= RESCALE_LIMIT;
            }
            self.increment /= RESCALE_LIMIT;
            self.rebuild();
        } else {
            self.push(var);
        }
    }
}

impl VariableSelection for Vsids {
    fn new(num_vars: usize) -> Self {
        let mut vsids = Self {
            activity: vec![0.0; num_vars + 1],
            heap: BinaryHeap::new(),
            increment: 1.0,
        };
        vsids.rebuild();
        vsids
    }

    fn pick(&mut self, assignment: &Assignment) -> Option<Variable> {
        while let Some((OrderedFloat(act), Reverse(var))) = self.heap.pop() {
            #[allow(clippy::float_cmp)]
            let current = act == self.activity[var as usize];
            if current && assignment[var].is_unassigned() {
                return Some(var);
            }
        }
        None
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, vars: T) {
        for var in vars {
            self.bump(var);
        }

        if self.heap.len() > 8 * self.activity.len() + 1024 {
            self.rebuild();
        }
    }

    fn decay(&mut self) {
        self.increment /= DEFAULT_DECAY;
    }

    fn on_unassign(&mut self, var: Variable) {
        self.push(var);
    }
}

#[derive(Debug, Clone)]
pub struct FixedOrder {
    num_vars: usize,
    next: Variable,
}

impl VariableSelection for FixedOrder {
    fn new(num_vars: usize) -> Self {
        Self { num_vars, next: 1 }
    }

    fn pick(&mut self, assignment: &Assignment) -> Option<Variable> {
        while (self.next as usize) <= self.num_vars {
            if assignment[self.next].is_unassigned() {
                return Some(self.next);
            }
            self.next += 1;
        }
        None
    }

    fn bumps<T: IntoIterator<Item = Variable>>(&mut self, _: T) {}

    fn decay(&mut self) {}

    fn on_unassign(&mut self, var: Variable) {
        self.next = self.next.min(var);
    }
}

/// Decision heuristics selectable at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum VariableSelectionType {
    /// `Vsids`.
    #[default]
    Vsids,
    /// `FixedOrder`.
    FixedOrder,
}

impl Display for VariableSelectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vsids => write!(f, "vsids"),
            Self::FixedOrder => write!(f, "fixed-order"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::Literal;

    #[test]
    fn test_vsids_picks_most_active() {
        let mut vsids = Vsids::new(3);
        let assignment = Assignment::new(3);

        vsids.bumps([2, 3, 3]);

        assert_eq!(vsids.pick(&assignment), Some(3));
        assert_eq!(vsids.pick(&assignment), Some(2));
        assert_eq!(vsids.pick(&assignment), Some(1));
        assert_eq!(vsids.pick(&assignment), None);
    }

    #[test]
    fn test_vsids_skips_assigned() {
        let mut vsids = Vsids::new(2);
        let mut assignment = Assignment::new(2);
        assignment.assign(Literal::new(2, true));

        vsids.bumps([2]);

        assert_eq!(vsids.pick(&assignment), Some(1));

        assignment.unassign(2);
        vsids.on_unassign(2);
        assert_eq!(vsids.pick(&assignment), Some(2));
    }

    #[test]
    fn test_vsids_decay_favours_recent_bumps() {
        let mut vsids = Vsids::new(2);
        vsids.bumps([1]);
        vsids.decay();
        vsids.bumps([2]);

        assert!(vsids.activity(2) > vsids.activity(1));
    }

    #[test]
    fn test_fixed_order() {
        let mut fixed = FixedOrder::new(3);
        let mut assignment = Assignment::new(3);

        assert_eq!(fixed.pick(&assignment), Some(1));
        assignment.assign(Literal::new(1, true));
        assert_eq!(fixed.pick(&assignment), Some(2));

        assignment.assign(Literal::new(2, true));
        assignment.assign(Literal::new(3, true));
        assert_eq!(fixed.pick(&assignment), None);

        assignment.unassign(2);
        fixed.on_unassign(2);
        assert_eq!(fixed.pick(&assignment), Some(2));
    }
}
