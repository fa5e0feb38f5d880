//! # nonogram_solver
//!
//! Command-line front end for the nonogram solver. Puzzles are compiled into
//! integer extent variables, encoded to CNF and searched with the CDCL engine.
//!
//! ## Usage
//!
//! ```sh
//! # Solve a puzzle and report whether its solution is unique
//! nonogram_solver solve puzzle.non
//!
//! # Count up to 50 solutions in at most ten seconds, saving them
//! nonogram_solver solve puzzle.non --limit 50 --time-limit 10 --save-solutions out.txt
//!
//! # Check a directory of puzzles on four threads, as CSV
//! nonogram_solver bench puzzles/ --threads 4 --format csv
//!
//! # Estimate how often random 5x5 to 15x15 puzzles are unique
//! nonogram_solver random --samples 500 --sampler fill-gaps --seed 1
//! ```
//!
//! Every solving subcommand accepts `--debug`, `--stats`,
//! `--variable-selection <vsids|fixed-order>` and
//! `--restart-strategy <luby|geometric|never>`.

use clap::Parser;
use command_line::cli::{Cli, run};

mod command_line;

/// Global allocator using `tikv-jemallocator`, which also backs the memory
/// figures printed with `--stats`.
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
