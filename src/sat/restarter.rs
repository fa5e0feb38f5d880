//! Restart strategies for the CDCL search.
//!
//! A restart abandons the current partial assignment and resumes from level
//! 0, keeping every learnt clause. The interval between restarts is counted
//! in conflicts.
//!
//! - `Luby`: intervals follow the Luby sequence `1, 1, 2, 1, 1, 2, 4, ...`
//!   scaled by `N`.
//! - `Geometric`: the interval starts at 100 conflicts and is multiplied by
//!   `N` after every restart.
//! - `Never`: never restarts.

use clap::ValueEnum;
use std::fmt::{Debug, Display};

/// Interface shared by the restart strategies.
pub trait Restarter: Debug + Clone {
    /// Creates the strategy in its initial state.
    fn new() -> Self;

    /// Conflicts left before the next restart.
    fn restarts_in(&self) -> usize;

    /// Counts one conflict towards the next restart.
    fn increment_restarts_in(&mut self);

    /// Starts a new interval.
    fn restart(&mut self);

    /// Restarts performed so far.
    fn num_restarts(&self) -> usize;

    /// Records a conflict and reports whether the search should restart now.
    ///
    /// # Returns
    /// `true` if a restart was triggered, `false` otherwise.
    fn should_restart(&mut self) -> bool {
        self.increment_restarts_in();
        if self.restarts_in() == 0 {
            self.restart();
            true
        } else {
            false
        }
    }
}

/// Luby restarts with unit interval `N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Luby<const N: usize> {
    restarts: usize,
    restarts_in: usize,
}

impl<const N: usize> Luby<N> {
    /// The `i`-th element (0-based) of the Luby sequence.
    #[must_use]
    pub fn luby(mut i: usize) -> usize {
        let mut size = 1;
        let mut seq = 0;
        while size < i + 1 {
            seq += 1;
            size = 2 * size + 1;
        }
        while size - 1 != i {
            size = (size - 1) >> 1;
            seq -= 1;
            i %= size;
        }
        1 << seq
    }
}

impl<const N: usize> Restarter for Luby<N> {
    fn new() -> Self {
        Self {
            restarts: 0,
            restarts_in: N * Self::luby(0),
        }
    }

    fn restarts_in(&self) -> usize {
        self.restarts_in
    }

    fn increment_restarts_in(&mut self) {
        self.restarts_in = self.restarts_in.saturating_sub(1);
    }

    fn restart(&mut self) {
        self.restarts += 1;
        self.restarts_in = N * Self::luby(self.restarts);
    }

    fn num_restarts(&self) -> usize {
        self.restarts
    }
}

/// Geometric restarts: the interval grows by a factor of `N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometric<const N: usize> {
    restarts: usize,
    restarts_in: usize,
    restarts_interval: usize,
}

const GEOMETRIC_FIRST_INTERVAL: usize = 100;

impl<const N: usize> Restarter for Geometric<N> {
    fn new() -> Self {
        Self {
            restarts: 0,
            restarts_in: GEOMETRIC_FIRST_INTERVAL,
            restarts_interval: GEOMETRIC_FIRST_INTERVAL,
        }
    }

    fn restarts_in(&self) -> usize {
        self.restarts_in
    }

    fn increment_restarts_in(&mut self) {
        self.restarts_in = self.restarts_in.saturating_sub(1);
    }

    fn restart(&mut self) {
        self.restarts += 1;
        self.restarts_interval = self.restarts_interval.saturating_mul(N.max(1));
        self.restarts_in = self.restarts_interval;
    }

    fn num_restarts(&self) -> usize {
        self.restarts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Never;

impl Restarter for Never {
    fn new() -> Self {
        Self
    }

    fn restarts_in(&self) -> usize {
        usize::MAX
    }

    fn increment_restarts_in(&mut self) {}

    fn restart(&mut self) {}

    fn num_restarts(&self) -> usize {
        0
    }

    fn should_restart(&mut self) -> bool {
        false
    }
}

/// Restart strategies selectable at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum RestarterType {
    /// `Luby<100>`.
    #[default]
    Luby,
    /// `Geometric<2>`.
    Geometric,
    /// `Never`.
    Never,
}

impl Display for RestarterType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Luby => write!(f, "luby"),
            Self::Geometric => write!(f, "geometric"),
            Self::Never => write!(f, "never"),
        }
    }
}
