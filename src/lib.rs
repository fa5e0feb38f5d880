#![warn(missing_docs)]
//! Nonogram solving by compilation to integer constraints over a CDCL SAT
//! engine.

/// Integer constraint models and the backends that solve them.
pub mod csp;

/// Error types shared across the crate.
pub mod errors;

/// Logger set-up for the command line tools.
pub mod log;

/// Puzzles, their compilation, and the enumeration of their solutions.
pub mod nonogram;

/// The `sat` module implements the CDCL SAT solver the integer models are
/// encoded onto.
pub mod sat;
