#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Boolean variables and literals.
//!
//! Variables are numbered from 1, as in DIMACS; variable 0 is never handed
//! out. A literal packs its variable and sign into one `u32` so that the two
//! polarities of a variable sit next to each other, which lets watch lists be
//! indexed directly by [`Literal::index`].

use core::ops::{Neg, Not};
use std::fmt::{Display, Formatter};

/// A Boolean variable, numbered from 1.
pub type Variable = u32;

/// The largest variable a [`Literal`] can address.
pub const MAX_VARIABLE: Variable = (u32::MAX >> 1) - 1;

/// A possibly negated Boolean variable, stored as `var << 1 | negated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Literal(u32);

impl Literal {
    /// Creates a literal that is true when `var` takes the value `polarity`.
    #[must_use]
    pub const fn new(var: Variable, polarity: bool) -> Self {
        Self((var << 1) | (!polarity as u32))
    }

    /// The literal's variable.
    #[must_use]
    pub const fn variable(self) -> Variable {
        self.0 >> 1
    }

    /// `true` for a positive literal.
    #[must_use]
    pub const fn polarity(self) -> bool {
        self.0 & 1 == 0
    }

    /// `true` for a negative literal.
    #[must_use]
    pub const fn is_negated(self) -> bool {
        !self.polarity()
    }

    /// The complementary literal.
    #[must_use]
    pub const fn negated(self) -> Self {
        Self(self.0 ^ 1)
    }

    /// Dense index of the literal, suitable for per-literal tables of
    /// size `2 * (num_vars + 1)`.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Converts a non-zero DIMACS literal.
    #[must_use]
    pub const fn from_i32(value: i32) -> Self {
        Self::new(value.unsigned_abs(), value.is_positive())
    }

    /// The DIMACS form of the literal.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_i32(self) -> i32 {
        let var = self.variable() as i32;
        if self.polarity() { var } else { -var }
    }
}

impl Not for Literal {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::from_i32(value)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_i32())
    }
}
