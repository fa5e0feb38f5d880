//! Random puzzles and the sampling of puzzle configurations.

use crate::nonogram::puzzle::{Grid, Puzzle};
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use std::time::Duration;

/// A square grid whose cells are filled independently with probability `p`.
#[must_use]
pub fn random_grid(size: usize, p: f64, rng: &mut fastrand::Rng) -> Grid {
    let mut grid = Grid::new(size, size);
    for row in 0..size {
        for col in 0..size {
            grid.set(row, col, rng.f64() < p);
        }
    }
    grid
}

/// The puzzle of a [`random_grid`], carrying the grid as its solution.
#[must_use]
pub fn random_puzzle(size: usize, p: f64, rng: &mut fastrand::Rng) -> Puzzle {
    Puzzle::from_grid(&random_grid(size, p, rng))
}

/// A point of the sampling space: grid size and fill probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceConfig {
    /// Side length of the grid.
    pub size: usize,
    /// Probability of a cell being filled.
    pub prob: OrderedFloat<f64>,
}

impl InstanceConfig {
    /// The point at `size` and `prob`.
    ///
    /// # Examples
    /// ```
    /// # use nonogram_solver::nonogram::generate::InstanceConfig;
    /// let config = InstanceConfig::new(10, 0.5);
    /// assert_eq!(config.prob.0, 0.5);
    /// ```
    #[must_use]
    pub const fn new(size: usize, prob: f64) -> Self {
        Self {
            size,
            prob: OrderedFloat(prob),
        }
    }

    /// A puzzle drawn at this point.
    #[must_use]
    pub fn generate(&self, rng: &mut fastrand::Rng) -> Puzzle {
        random_puzzle(self.size, self.prob.0, rng)
    }
}

/// The grid of sizes and probabilities to sample from.
///
/// Sizes run over `s_min..=s_max`; probabilities over `p_steps` evenly
/// spaced values starting at `p_min` and stopping short of `p_max`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerConfig {
    /// Smallest fill probability.
    pub p_min: f64,
    /// Upper end of the probability range, excluded.
    pub p_max: f64,
    /// Number of probabilities.
    pub p_steps: usize,
    /// Smallest size.
    pub s_min: usize,
    /// Largest size.
    pub s_max: usize,
}

impl SamplerConfig {
    /// Probability number `idx`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn prob(&self, idx: usize) -> f64 {
        self.p_min + idx as f64 * (self.p_max - self.p_min) / self.p_steps as f64
    }

    /// Every size.
    #[must_use]
    pub fn all_sizes(&self) -> Vec<usize> {
        (self.s_min..=self.s_max).collect()
    }

    /// Every probability.
    #[must_use]
    pub fn all_probs(&self) -> Vec<f64> {
        (0..self.p_steps).map(|idx| self.prob(idx)).collect()
    }

    /// Every point, sizes outermost.
    #[must_use]
    pub fn all_points(&self) -> Vec<InstanceConfig> {
        let probs = self.all_probs();
        self.all_sizes()
            .into_iter()
            .flat_map(|size| probs.iter().map(move |&p| InstanceConfig::new(size, p)))
            .collect()
    }

    /// A point drawn uniformly, or `None` when the space is empty.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> Option<InstanceConfig> {
        let points = self.all_points();
        rng.choice(points)
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            p_min: 0.1,
            p_max: 0.9,
            p_steps: 8,
            s_min: 5,
            s_max: 15,
        }
    }
}

/// Uniqueness results collected at one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SolutionStatistics {
    /// Puzzles with a unique solution.
    pub unique: usize,
    /// Puzzles solved.
    pub total: usize,
    /// Time spent on all of them.
    pub runtime: Duration,
}

impl SolutionStatistics {
    /// Adds one solved puzzle.
    pub fn record(&mut self, unique: bool, runtime: Duration) {
        self.unique += usize::from(unique);
        self.total += 1;
        self.runtime += runtime;
    }

    /// Fraction of unique puzzles, 0 before any were recorded.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.unique as f64 / self.total as f64
    }

    /// Mean time per puzzle.
    #[must_use]
    pub fn average_runtime(&self) -> Duration {
        u32::try_from(self.total)
            .ok()
            .and_then(|total| self.runtime.checked_div(total))
            .unwrap_or_default()
    }
}

/// Statistics per sampled point.
pub type Statistics = FxHashMap<InstanceConfig, SolutionStatistics>;

/// A strategy for choosing the next point to sample.
pub trait Sampler {
    /// The next point, or `None` when the space is empty.
    fn sample(&mut self, rng: &mut fastrand::Rng) -> Option<InstanceConfig>;

    /// Informs the sampler of the results so far.
    fn update(&mut self, statistics: &Statistics);
}

/// Draws points uniformly.
#[derive(Debug, Clone, Copy)]
pub struct UniformSampler(pub SamplerConfig);

impl Sampler for UniformSampler {
    fn sample(&mut self, rng: &mut fastrand::Rng) -> Option<InstanceConfig> {
        self.0.sample(rng)
    }

    fn update(&mut self, _: &Statistics) {}
}

/// Favours the points with the fewest samples so far.
///
/// Points are ranked by sample count, ties broken at random, and the `i`-th
/// of `n` is drawn with weight `n - i`.
#[derive(Debug, Clone)]
pub struct FillGapsSampler {
    config: SamplerConfig,
    totals: FxHashMap<InstanceConfig, usize>,
}

impl FillGapsSampler {
    /// A sampler that has seen no results yet.
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            totals: FxHashMap::default(),
        }
    }
}

impl Sampler for FillGapsSampler {
    fn sample(&mut self, rng: &mut fastrand::Rng) -> Option<InstanceConfig> {
        let mut points = self.config.all_points();
        rng.shuffle(&mut points);
        points.sort_by_key(|point| self.totals.get(point).copied().unwrap_or(0));

        let n = points.len();
        if n == 0 {
            return None;
        }
        let mut pick = rng.usize(0..n * (n + 1) / 2);
        for (rank, point) in points.into_iter().enumerate() {
            let weight = n - rank;
            if pick < weight {
                return Some(point);
            }
            pick -= weight;
        }
        None
    }

    fn update(&mut self, statistics: &Statistics) {
        self.totals = statistics
            .iter()
            .map(|(&point, stats)| (point, stats.total))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonogram::puzzle::Dim;

    fn config() -> SamplerConfig {
        SamplerConfig {
            p_min: 0.2,
            p_max: 0.6,
            p_steps: 4,
            s_min: 3,
            s_max: 5,
        }
    }

    #[test]
    fn test_random_puzzle_matches_grid() {
        let mut rng = fastrand::Rng::with_seed(7);
        let puzzle = random_puzzle(6, 0.5, &mut rng);

        assert_eq!(puzzle.hints(Dim::Row).len(), 6);
        assert_eq!(puzzle.hints(Dim::Col).len(), 6);
        assert!(puzzle.validate().is_ok());
        assert_eq!(puzzle.solution().map(Grid::height), Some(6));
    }

    #[test]
    fn test_extreme_probabilities() {
        let mut rng = fastrand::Rng::with_seed(1);

        assert_eq!(random_grid(4, 0.0, &mut rng).filled(), 0);
        assert_eq!(random_grid(4, 1.0, &mut rng).filled(), 16);
    }

    #[test]
    fn test_seeded_generation_repeats() {
        let a = random_grid(8, 0.4, &mut fastrand::Rng::with_seed(42));
        let b = random_grid(8, 0.4, &mut fastrand::Rng::with_seed(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_sampler_config_points() {
        let config = config();

        assert_eq!(config.all_sizes(), vec![3, 4, 5]);
        let probs = config.all_probs();
        assert_eq!(probs.len(), 4);
        assert!((probs[0] - 0.2).abs() < 1e-12);
        assert!((probs[3] - 0.5).abs() < 1e-12);

        let points = config.all_points();
        assert_eq!(points.len(), 12);
        assert_eq!(points[0], InstanceConfig::new(3, probs[0]));
        assert_eq!(points[4].size, 4);
    }

    #[test]
    fn test_sample_in_space() {
        let config = config();
        let points = config.all_points();
        let mut rng = fastrand::Rng::with_seed(3);

        for _ in 0..50 {
            let point = config.sample(&mut rng).unwrap();
            assert!(points.contains(&point));
        }
    }

    #[test]
    fn test_empty_space() {
        let config = SamplerConfig {
            p_steps: 0,
            ..config()
        };
        let mut rng = fastrand::Rng::with_seed(3);

        assert_eq!(config.sample(&mut rng), None);
        assert_eq!(FillGapsSampler::new(config).sample(&mut rng), None);
    }

    #[test]
    fn test_fill_gaps_prefers_unsampled() {
        let config = SamplerConfig {
            p_steps: 1,
            s_max: 4,
            ..config()
        };
        let mut sampler = FillGapsSampler::new(config);
        let sampled = InstanceConfig::new(3, config.prob(0));
        let mut statistics = Statistics::default();
        statistics.insert(
            sampled,
            SolutionStatistics {
                unique: 5,
                total: 10,
                runtime: Duration::from_secs(1),
            },
        );
        sampler.update(&statistics);

        let mut rng = fastrand::Rng::with_seed(11);
        let fresh = (0..300)
            .filter(|_| sampler.sample(&mut rng) != Some(sampled))
            .count();
        // Weight 2 against 1.
        assert!(fresh > 150, "{fresh}");
    }

    #[test]
    fn test_statistics() {
        let mut stats = SolutionStatistics::default();
        assert_eq!(stats.ratio(), 0.0);
        assert_eq!(stats.average_runtime(), Duration::ZERO);

        stats.record(true, Duration::from_millis(30));
        stats.record(false, Duration::from_millis(10));
        assert_eq!(stats.total, 2);
        assert!((stats.ratio() - 0.5).abs() < 1e-12);
        assert_eq!(stats.average_runtime(), Duration::from_millis(20));
    }
}
