#![allow(clippy::cast_precision_loss)]

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use nonogram_solver::csp::SatBackend;
use nonogram_solver::errors::{Error, ParseError};
use nonogram_solver::nonogram::generate::{
    FillGapsSampler, InstanceConfig, Sampler, SamplerConfig, SolutionStatistics, Statistics,
    UniformSampler,
};
use nonogram_solver::nonogram::render::render;
use nonogram_solver::nonogram::{
    CompiledInstance, Enumerator, Grid, Puzzle, SolutionCount, SolveOne, Uniqueness, compile,
    read_puzzle,
};
use nonogram_solver::sat::restarter::{Geometric, Luby, Never, RestarterType};
use nonogram_solver::sat::solver::{Config, SolutionStats, SolverConfig};
use nonogram_solver::sat::variable_selection::{FixedOrder, VariableSelectionType, Vsids};
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::ScopedJoinHandle;
use std::time::{Duration, Instant};
use tikv_jemalloc_ctl::{epoch, stats};

pub(crate) type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Defines the command-line interface for the nonogram solver.
#[derive(Parser, Debug)]
#[command(
    name = "nonogram_solver",
    version,
    about = "Solves nonograms and checks them for uniqueness"
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

/// The available subcommands.
#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Solve a puzzle file and count its solutions.
    Solve {
        /// Path to the puzzle file, `.non` or webpbn `.xml`.
        path: PathBuf,

        /// Stop counting after this many solutions.
        #[arg(long, default_value_t = 1000)]
        limit: usize,

        /// Time budget for counting, in seconds.
        #[arg(long)]
        time_limit: Option<f64>,

        /// Write every solution found while counting to this file.
        #[arg(long)]
        save_solutions: Option<PathBuf>,

        /// Write the compiled CNF in DIMACS format next to the puzzle.
        #[arg(short, long, default_value_t = false)]
        export_dimacs: bool,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Check every puzzle file under a directory for uniqueness.
    Bench {
        /// Directory to search for `.non` and `.xml` puzzle files.
        path: PathBuf,

        /// Stop counting a puzzle's solutions after this many.
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Time budget per puzzle, in seconds.
        #[arg(long, default_value_t = 1800.0)]
        time_limit: f64,

        /// Number of worker threads.
        #[arg(long, default_value_t = 1)]
        threads: usize,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        #[arg(long, value_enum, default_value_t = SortBy::None)]
        sort_by: SortBy,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Measure how often random puzzles have a unique solution.
    Random {
        /// Number of puzzles to generate.
        #[arg(long, default_value_t = 100)]
        samples: usize,

        /// Seed for the random generator.
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, default_value_t = SamplerConfig::default().p_min)]
        p_min: f64,

        #[arg(long, default_value_t = SamplerConfig::default().p_max)]
        p_max: f64,

        #[arg(long, default_value_t = SamplerConfig::default().p_steps)]
        p_steps: usize,

        #[arg(long, default_value_t = SamplerConfig::default().s_min)]
        s_min: usize,

        #[arg(long, default_value_t = SamplerConfig::default().s_max)]
        s_max: usize,

        #[arg(long, value_enum, default_value_t = SamplerType::Uniform)]
        sampler: SamplerType,

        /// Time budget per puzzle, in seconds.
        #[arg(long)]
        time_limit: Option<f64>,

        /// Number of worker threads.
        #[arg(long, default_value_t = 1)]
        threads: usize,

        #[command(flatten)]
        common: CommonOptions,
    },

    /// Generate shell completion scripts.
    Completions {
        /// The shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Defines common command-line options shared across different subcommands.
#[derive(Args, Debug, Default, Clone, Copy)]
pub(crate) struct CommonOptions {
    /// Log at debug level.
    #[arg(short, long, default_value_t = false)]
    pub(crate) debug: bool,

    /// Print engine statistics after solving.
    #[arg(short, long, default_value_t = false)]
    pub(crate) stats: bool,

    #[arg(long, default_value_t = VariableSelectionType::Vsids)]
    variable_selection: VariableSelectionType,

    #[arg(long, default_value_t = RestarterType::Luby)]
    restart_strategy: RestarterType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SortBy {
    None,
    Id,
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum SamplerType {
    Uniform,
    FillGaps,
}

/// Calls `$run::<C>(args)` with the solver configuration named by `$common`.
macro_rules! with_config {
    ($common:expr, $run:ident($($arg:expr),* $(,)?)) => {
        match ($common.variable_selection, $common.restart_strategy) {
            (VariableSelectionType::Vsids, RestarterType::Luby) => $run::<Config<Vsids, Luby<100>>>($($arg),*),
            (VariableSelectionType::Vsids, RestarterType::Geometric) => $run::<Config<Vsids, Geometric<2>>>($($arg),*),
            (VariableSelectionType::Vsids, RestarterType::Never) => $run::<Config<Vsids, Never>>($($arg),*),
            (VariableSelectionType::FixedOrder, RestarterType::Luby) => $run::<Config<FixedOrder, Luby<100>>>($($arg),*),
            (VariableSelectionType::FixedOrder, RestarterType::Geometric) => $run::<Config<FixedOrder, Geometric<2>>>($($arg),*),
            (VariableSelectionType::FixedOrder, RestarterType::Never) => $run::<Config<FixedOrder, Never>>($($arg),*),
        }
    };
}

/// Runs the parsed command.
pub(crate) fn run(cli: Cli) -> CliResult {
    match cli.command {
        Commands::Solve {
            path,
            limit,
            time_limit,
            save_solutions,
            export_dimacs,
            common,
        } => {
            nonogram_solver::log::init_logger(common.debug);
            let options = SolveOptions {
                limit,
                budget: time_limit.map(seconds).transpose()?,
                save_solutions,
                export_dimacs,
                stats: common.stats,
            };
            with_config!(common, solve_file(&path, &options))
        }

        Commands::Bench {
            path,
            limit,
            time_limit,
            threads,
            format,
            sort_by,
            common,
        } => {
            nonogram_solver::log::init_logger(common.debug);
            let budget = seconds(time_limit)?;
            let mut rows = with_config!(common, bench_dir(&path, limit, budget, threads))?;
            sort_rows(&mut rows, sort_by);
            match format {
                OutputFormat::Table => print_table(&rows),
                OutputFormat::Csv => print_csv(&rows),
            }
            Ok(())
        }

        Commands::Random {
            samples,
            seed,
            p_min,
            p_max,
            p_steps,
            s_min,
            s_max,
            sampler,
            time_limit,
            threads,
            common,
        } => {
            nonogram_solver::log::init_logger(common.debug);
            let config = SamplerConfig {
                p_min,
                p_max,
                p_steps,
                s_min,
                s_max,
            };
            let mut sampler: Box<dyn Sampler> = match sampler {
                SamplerType::Uniform => Box::new(UniformSampler(config)),
                SamplerType::FillGaps => Box::new(FillGapsSampler::new(config)),
            };
            let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
            let budget = time_limit.map(seconds).transpose()?;

            let statistics = with_config!(
                common,
                sample_uniqueness(sampler.as_mut(), &mut rng, samples, threads, budget)
            )?;
            print_statistics(&statistics);
            Ok(())
        }

        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "nonogram_solver",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

fn seconds(secs: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid time limit {secs}: {e}"))
}

struct SolveOptions {
    limit: usize,
    budget: Option<Duration>,
    save_solutions: Option<PathBuf>,
    export_dimacs: bool,
    stats: bool,
}

/// Solves one puzzle file, prints the solution and the solution count.
///
/// # Errors
///
/// If the file cannot be read or parsed, or an output file cannot be written.
fn solve_file<C: SolverConfig>(path: &Path, options: &SolveOptions) -> CliResult {
    let time = Instant::now();
    let puzzle = read_puzzle(path)?;
    println!(
        "Puzzle of size {} x {}, solving...",
        puzzle.height(),
        puzzle.width()
    );

    let instance = compile(&puzzle)?;
    let build_time = time.elapsed();
    println!("Model built, took {build_time:?}");

    if options.export_dimacs {
        export_dimacs::<C>(path, &instance)?;
    }

    let mut backend = SatBackend::<C>::new();
    let solved = Enumerator::new(&instance, &mut backend)?.solve_one()?;
    let solve_time = time.elapsed();
    println!("Solve done, took {solve_time:?}");

    match solved {
        SolveOne::Found(grid) => print!("{}", render(&puzzle, &grid)),
        SolveOne::Infeasible => {
            println!("NO SOLUTION");
            if options.stats {
                print_stats(build_time, solve_time - build_time, &backend);
            }
            return Ok(());
        }
    }

    println!("Counting solutions...");
    let mut counter = SatBackend::<C>::new();
    let mut saver = SolutionSaver::new(options.save_solutions.as_deref())?;
    let count = Enumerator::new(&instance, &mut counter)?.solve_all(
        options.limit,
        options.budget,
        |grid| saver.save(grid),
    )?;
    saver.finish()?;

    println!("{}", describe(&count));
    println!("Proof done, took {:?}", time.elapsed() - solve_time);

    if options.stats {
        let mut total = backend.stats();
        total += counter.stats();
        print_search_stats(
            build_time,
            time.elapsed() - build_time,
            counter.cnf().num_vars,
            counter.cnf().len(),
            counter.cnf().num_literals(),
            &total,
        );
    }
    Ok(())
}

/// Writes the CNF of `instance` to `<path>.cnf`.
fn export_dimacs<C: SolverConfig>(path: &Path, instance: &CompiledInstance) -> CliResult {
    let mut backend = SatBackend::<C>::new();
    instance.load(&mut backend)?;

    let dimacs_path = PathBuf::from(format!("{}.cnf", path.display()));
    std::fs::write(&dimacs_path, backend.cnf().to_string()).map_err(|e| Error::io(&dimacs_path, e))?;
    println!("DIMACS written to: {}", dimacs_path.display());
    Ok(())
}

/// Writes grids to an optional file, keeping the first write error.
struct SolutionSaver {
    out: Option<(PathBuf, BufWriter<File>)>,
    error: Option<Error>,
}

impl SolutionSaver {
    fn new(path: Option<&Path>) -> Result<Self, Error> {
        let out = match path {
            Some(path) => {
                let file = File::create(path).map_err(|e| Error::io(path, e))?;
                Some((path.to_path_buf(), BufWriter::new(file)))
            }
            None => None,
        };
        Ok(Self { out, error: None })
    }

    fn save(&mut self, grid: &Grid) {
        if self.error.is_some() {
            return;
        }
        if let Some((path, out)) = &mut self.out {
            if let Err(e) = writeln!(out, "{grid}") {
                self.error = Some(Error::io(path.as_path(), e));
            }
        }
    }

    fn finish(self) -> Result<(), Error> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if let Some((path, mut out)) = self.out {
            out.flush().map_err(|e| Error::io(path, e))?;
        }
        Ok(())
    }
}

/// The count the way the command line reports it.
fn describe(count: &SolutionCount) -> String {
    if count.is_exhaustive() && count.found <= 1 {
        Uniqueness::from(*count).to_string()
    } else {
        count.to_string()
    }
}

/// One line of the bench report.
#[derive(Debug, Clone)]
pub(crate) struct BenchRow {
    puzzle_id: String,
    width: usize,
    height: usize,
    count: SolutionCount,
    time_taken: Duration,
}

/// Solves every `.non` file under `dir` on `threads` worker threads.
fn bench_dir<C: SolverConfig>(
    dir: &Path,
    limit: usize,
    budget: Duration,
    threads: usize,
) -> Result<Vec<BenchRow>, Box<dyn std::error::Error>> {
    if !dir.is_dir() {
        return Err(format!("Provided path is not a directory: {}", dir.display()).into());
    }

    let files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "non" || ext == "xml"))
        .collect();
    info!("benchmarking {} puzzles on {threads} threads", files.len());

    let next = AtomicUsize::new(0);
    let rows = Mutex::new(Vec::with_capacity(files.len()));

    std::thread::scope(|scope| {
        for _ in 0..threads.max(1) {
            scope.spawn(|| {
                while let Some(path) = files.get(next.fetch_add(1, Ordering::Relaxed)) {
                    let Some(row) = bench_file::<C>(path, limit, budget) else {
                        continue;
                    };
                    if let Ok(mut rows) = rows.lock() {
                        rows.push(row);
                    }
                }
            });
        }
    });

    rows.into_inner()
        .map_err(|_| "a bench worker panicked".into())
}

fn bench_file<C: SolverConfig>(path: &Path, limit: usize, budget: Duration) -> Option<BenchRow> {
    let puzzle = match read_puzzle(path) {
        Ok(puzzle) => puzzle,
        Err(Error::Parse(ParseError::Unsupported { feature, .. })) => {
            info!("skipping {}: unsupported {feature}", path.display());
            return None;
        }
        Err(e) => {
            warn!("skipping {}: {e}", path.display());
            return None;
        }
    };

    let time = Instant::now();
    let count = compile(&puzzle)
        .map_err(Error::from)
        .and_then(|instance| {
            Enumerator::new(&instance, SatBackend::<C>::new())?.solve_all(limit, Some(budget), |_| {})
        });
    let time_taken = time.elapsed();

    match count {
        Ok(count) => Some(BenchRow {
            puzzle_id: path
                .file_name()
                .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned()),
            width: puzzle.width(),
            height: puzzle.height(),
            count,
            time_taken,
        }),
        Err(e) => {
            warn!("failed on {}: {e}", path.display());
            None
        }
    }
}

fn sort_rows(rows: &mut [BenchRow], sort_by: SortBy) {
    match sort_by {
        SortBy::None => {}
        SortBy::Id => rows.sort_by(|a, b| a.puzzle_id.cmp(&b.puzzle_id)),
        SortBy::Time => rows.sort_by_key(|row| row.time_taken),
    }
}

fn print_table(rows: &[BenchRow]) {
    println!(
        "| {:>24} | {:>6} | {:>6} | {:^24} | {:>12} |",
        "Puzzle ID", "Width", "Height", "#Solutions", "Time (s)"
    );
    for row in rows {
        println!(
            "| {:>24} | {:>6} | {:>6} | {:^24} | {:>12.3} |",
            row.puzzle_id,
            row.width,
            row.height,
            describe(&row.count),
            row.time_taken.as_secs_f64()
        );
    }
}

fn print_csv(rows: &[BenchRow]) {
    println!("puzzle_id,width,height,is_unique,time_taken");
    for row in rows {
        println!(
            "{},{},{},{},{}",
            csv_field(&row.puzzle_id),
            row.width,
            row.height,
            Uniqueness::from(row.count) == Uniqueness::Unique,
            row.time_taken.as_secs_f64()
        );
    }
}

/// Quotes `field` when it holds a separator, quote or line break.
fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Generates `samples` puzzles and decides their uniqueness, `threads` at a
/// time, telling the sampler the results after every batch.
fn sample_uniqueness<C: SolverConfig>(
    sampler: &mut dyn Sampler,
    rng: &mut fastrand::Rng,
    samples: usize,
    threads: usize,
    budget: Option<Duration>,
) -> Result<Statistics, Box<dyn std::error::Error>> {
    let threads = threads.max(1);
    let mut statistics = Statistics::default();
    let mut remaining = samples;

    while remaining > 0 {
        let batch: Vec<(InstanceConfig, u64)> = (0..remaining.min(threads))
            .map_while(|_| sampler.sample(rng).map(|point| (point, rng.u64(..))))
            .collect();
        if batch.is_empty() {
            return Err("the sampling space is empty".into());
        }
        remaining -= batch.len();

        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|&(point, seed)| scope.spawn(move || decide::<C>(point, seed, budget)))
                .collect();
            join_all(handles)
        })?;

        for result in results {
            let (point, unique, runtime) = result?;
            statistics.entry(point).or_default().record(unique, runtime);
        }
        sampler.update(&statistics);
    }

    Ok(statistics)
}

/// Waits for every worker, failing if any of them panicked.
fn join_all<T>(handles: Vec<ScopedJoinHandle<'_, T>>) -> Result<Vec<T>, Box<dyn std::error::Error>> {
    let total = handles.len();
    let results: Vec<T> = handles
        .into_iter()
        .filter_map(|handle| handle.join().ok())
        .collect();
    if results.len() < total {
        let lost = total - results.len();
        warn!("{lost} of {total} worker threads panicked");
        return Err(format!("{lost} worker threads panicked").into());
    }
    Ok(results)
}

fn decide<C: SolverConfig>(
    point: InstanceConfig,
    seed: u64,
    budget: Option<Duration>,
) -> Result<(InstanceConfig, bool, Duration), Error> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let time = Instant::now();
    let puzzle: Puzzle = point.generate(&mut rng);
    let instance = compile(&puzzle)?;
    let uniqueness = Enumerator::new(&instance, SatBackend::<C>::new())?.is_unique(budget)?;
    if let Uniqueness::Undetermined { found } = uniqueness {
        warn!("size {} p {:.3}: undetermined after {found} solutions", point.size, point.prob.0);
    }
    Ok((point, uniqueness == Uniqueness::Unique, time.elapsed()))
}

fn print_statistics(statistics: &Statistics) {
    let mut points: Vec<(&InstanceConfig, &SolutionStatistics)> = statistics.iter().collect();
    points.sort_by_key(|(point, _)| **point);

    println!(
        "| {:>5} | {:>6} | {:>6} | {:>6} | {:>7} | {:>14} |",
        "Size", "p", "Total", "Unique", "Ratio", "Avg time (s)"
    );
    for (point, stats) in points {
        println!(
            "| {:>5} | {:>6.3} | {:>6} | {:>6} | {:>7.3} | {:>14.4} |",
            point.size,
            point.prob.0,
            stats.total,
            stats.unique,
            stats.ratio(),
            stats.average_runtime().as_secs_f64()
        );
    }
}

/// Helper function to print a single statistic line in a formatted table row.
pub(crate) fn stat_line(label: &str, value: impl std::fmt::Display) {
    println!("|  {label:<28} {value:>18}  |");
}

/// Helper function to print a statistic line that includes a rate (value/second).
pub(crate) fn stat_line_with_rate(label: &str, value: usize, elapsed: f64) {
    let rate = if elapsed > 0.0 {
        value as f64 / elapsed
    } else {
        0.0
    };
    println!("|  {label:<20} {value:>12} ({rate:>9.0}/sec)  |");
}

/// Allocated and resident memory in MiB, if jemalloc reports them.
fn memory_mib() -> Option<(f64, f64)> {
    epoch::advance().ok()?;
    let allocated = stats::allocated::read().ok()?;
    let resident = stats::resident::read().ok()?;
    Some((
        allocated as f64 / (1024.0 * 1024.0),
        resident as f64 / (1024.0 * 1024.0),
    ))
}

fn print_stats<C: SolverConfig>(build_time: Duration, elapsed: Duration, backend: &SatBackend<C>) {
    print_search_stats(
        build_time,
        elapsed,
        backend.cnf().num_vars,
        backend.cnf().len(),
        backend.cnf().num_literals(),
        &backend.stats(),
    );
}

/// Prints a summary of problem and search statistics.
fn print_search_stats(
    build_time: Duration,
    elapsed: Duration,
    num_vars: usize,
    num_clauses: usize,
    num_literals: usize,
    s: &SolutionStats,
) {
    let elapsed_secs = elapsed.as_secs_f64();

    println!("\n=======================[ Problem Statistics ]=========================");
    stat_line("Build time (s)", format!("{:.3}", build_time.as_secs_f64()));
    stat_line("Variables", num_vars);
    stat_line("Clauses (incl. blocking)", num_clauses);
    stat_line("Literals", num_literals);

    println!("========================[ Search Statistics ]========================");
    stat_line("Learnt clauses", s.learnt_clauses);
    stat_line_with_rate("Conflicts", s.conflicts, elapsed_secs);
    stat_line_with_rate("Decisions", s.decisions, elapsed_secs);
    stat_line_with_rate("Propagations", s.propagations, elapsed_secs);
    stat_line_with_rate("Restarts", s.restarts, elapsed_secs);
    if let Some((allocated, resident)) = memory_mib() {
        stat_line("Memory usage (MiB)", format!("{allocated:.2}"));
        stat_line("Resident memory (MiB)", format!("{resident:.2}"));
    }
    stat_line("CPU time (s)", format!("{elapsed_secs:.3}"));
    println!("=====================================================================");
}
