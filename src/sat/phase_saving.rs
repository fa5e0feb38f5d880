use crate::sat::literal::{Literal, Variable};
use bit_vec::BitVec;

/// The polarity each variable is given when it is next decided.
///
/// Starts out negative unless seeded, and remembers the last value a variable
/// held before it was unassigned.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SavedPhases(BitVec);

impl SavedPhases {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(BitVec::from_elem(num_vars + 1, false))
    }

    /// Sets the preferred phase of `var` before search starts.
    pub fn seed(&mut self, var: Variable, phase: bool) {
        self.0.set(var as usize, phase);
    }

    pub fn save(&mut self, lit: Literal) {
        self.0.set(lit.variable() as usize, lit.polarity());
    }

    /// The decision literal for `var`.
    #[must_use]
    pub fn get_next(&self, var: Variable) -> Literal {
        Literal::new(var, self.0.get(var as usize).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_negative() {
        let phases = SavedPhases::new(2);
        assert_eq!(phases.get_next(1), Literal::new(1, false));
    }

    #[test]
    fn test_save_and_seed() {
        let mut phases = SavedPhases::new(3);
        phases.seed(2, true);
        phases.save(Literal::new(3, true));
        phases.save(Literal::new(2, false));

        assert_eq!(phases.get_next(2), Literal::new(2, false));
        assert_eq!(phases.get_next(3), Literal::new(3, true));
    }
}
