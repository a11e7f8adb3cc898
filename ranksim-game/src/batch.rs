//! Batch runner: many independent seasons aggregated into a per-tier table.
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;

use crate::constants::{
    BASE_SEASON_COUNT, DEFAULT_MAX_GAMES_PER_SEASON, EXCLUDED_SEASON_WARN_LIMIT,
    SEASON_COUNT_EXPONENT_SCALE, SEASON_COUNT_WIN_RATE_CAP, SEASON_COUNT_WIN_RATE_FLOOR,
    SUPPORTED_WIN_RATE_MAX, SUPPORTED_WIN_RATE_MIN,
};
use crate::ladder::{RankLadder, TierId};
use crate::numbers::{round_f64_to_u32, u64_to_f64, usize_to_f64};
use crate::season::{SeasonError, SeasonParams, SeasonResult, simulate_season};
use crate::seed::season_rng;
use crate::stats::{Distribution, RunningStats};

/// Number of seasons to simulate for a win rate.
///
/// `round(1000 * 10^(10 * (min(win_rate, 0.5) - 0.4)))`: 1 000 seasons at
/// 0.40 rising geometrically to 10 000 at 0.50, flat above that.
#[must_use]
pub fn season_count_for_win_rate(win_rate: f64) -> u32 {
    let capped = win_rate.min(SEASON_COUNT_WIN_RATE_CAP);
    let exponent = SEASON_COUNT_EXPONENT_SCALE * (capped - SEASON_COUNT_WIN_RATE_FLOOR);
    round_f64_to_u32(BASE_SEASON_COUNT * 10_f64.powf(exponent))
}

/// How many seasons a batch simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSizePolicy {
    /// Derive the count from the win rate with [`season_count_for_win_rate`].
    Reference,
    Fixed(u32),
}

impl SampleSizePolicy {
    #[must_use]
    pub fn season_count(self, win_rate: f64) -> u32 {
        match self {
            Self::Reference => season_count_for_win_rate(win_rate),
            Self::Fixed(count) => count,
        }
    }
}

/// Configuration for a batch of simulated seasons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchConfig {
    pub win_rate: f64,
    pub starting_points: i64,
    pub sample_size: SampleSizePolicy,
    pub max_games_per_season: u32,
    pub seed: u64,
    pub parallel: bool,
}

impl BatchConfig {
    #[must_use]
    pub const fn new(win_rate: f64, starting_points: i64, seed: u64) -> Self {
        Self {
            win_rate,
            starting_points,
            sample_size: SampleSizePolicy::Reference,
            max_games_per_season: DEFAULT_MAX_GAMES_PER_SEASON,
            seed,
            parallel: true,
        }
    }

    #[must_use]
    pub const fn with_seasons(mut self, seasons: u32) -> Self {
        self.sample_size = SampleSizePolicy::Fixed(seasons);
        self
    }

    #[must_use]
    pub const fn with_sample_size(mut self, sample_size: SampleSizePolicy) -> Self {
        self.sample_size = sample_size;
        self
    }

    #[must_use]
    pub const fn with_max_games(mut self, max_games: u32) -> Self {
        self.max_games_per_season = max_games;
        self
    }

    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub const fn with_win_rate(mut self, win_rate: f64) -> Self {
        self.win_rate = win_rate;
        self
    }

    #[must_use]
    pub fn season_count(&self) -> u32 {
        self.sample_size.season_count(self.win_rate)
    }

    #[must_use]
    pub const fn season_params(&self) -> SeasonParams {
        SeasonParams::new(self.win_rate, self.starting_points)
            .with_max_games(self.max_games_per_season)
    }

    /// Check the inputs the simulator itself can accept.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self, ladder: &RankLadder) -> Result<(), BatchConfigError> {
        if !self.win_rate.is_finite() || self.win_rate <= 0.0 || self.win_rate > 1.0 {
            return Err(BatchConfigError::InvalidWinRate {
                win_rate: self.win_rate,
            });
        }
        let terminal = ladder.terminal_threshold();
        if self.starting_points < 0 || self.starting_points > terminal {
            return Err(BatchConfigError::InvalidStartingPoints {
                points: self.starting_points,
                terminal,
            });
        }
        if self.season_count() == 0 {
            return Err(BatchConfigError::ZeroSeasons);
        }
        if self.max_games_per_season == 0 {
            return Err(BatchConfigError::ZeroMaxGames);
        }
        Ok(())
    }

    /// Check the win rate against the range the product supports.
    ///
    /// # Errors
    ///
    /// Returns [`BatchConfigError::UnsupportedWinRate`] outside 0.40..=0.80.
    pub fn validate_product_range(&self) -> Result<(), BatchConfigError> {
        if (SUPPORTED_WIN_RATE_MIN..=SUPPORTED_WIN_RATE_MAX).contains(&self.win_rate) {
            Ok(())
        } else {
            Err(BatchConfigError::UnsupportedWinRate {
                win_rate: self.win_rate,
                min: SUPPORTED_WIN_RATE_MIN,
                max: SUPPORTED_WIN_RATE_MAX,
            })
        }
    }
}

/// Invalid batch inputs, detected before any season runs.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BatchConfigError {
    #[error("win rate {win_rate} must be a finite value in (0, 1]")]
    InvalidWinRate { win_rate: f64 },
    #[error("win rate {win_rate:.3} is outside the supported range {min:.2}..={max:.2}")]
    UnsupportedWinRate { win_rate: f64, min: f64, max: f64 },
    #[error("starting points {points} must be between 0 and the terminal threshold {terminal}")]
    InvalidStartingPoints { points: i64, terminal: i64 },
    #[error("a batch must simulate at least one season")]
    ZeroSeasons,
    #[error("the per-season game limit must be positive")]
    ZeroMaxGames,
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] BatchConfigError),
    #[error("none of the {excluded} simulated seasons reached the terminal rank")]
    NoSeasonsCompleted { excluded: usize },
}

/// Completion signal emitted after each finished season.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: u32,
    pub total: u32,
}

impl BatchProgress {
    /// Fraction complete in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (f64::from(self.completed) / f64::from(self.total)).clamp(0.0, 1.0)
        }
    }
}

/// A season dropped from the aggregate because it hit the game limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExcludedSeason {
    pub index: u32,
    pub points: i64,
    pub max_games: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierRow {
    pub season: u32,
    pub total_games: u32,
    /// Games to reach each column's tier, in column order.
    pub tier_games: Vec<Option<u32>>,
}

/// One row per completed season, one column per major tier except the starting tier.
///
/// Tiers below the start appear too; a season fills them only after dropping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierGamesTable {
    columns: Vec<String>,
    #[serde(skip)]
    column_tiers: Vec<TierId>,
    rows: Vec<TierRow>,
}

impl TierGamesTable {
    fn new(ladder: &RankLadder, starting_tier: TierId) -> Self {
        let (columns, column_tiers): (Vec<String>, Vec<TierId>) = ladder
            .tiers()
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), TierId(idx)))
            .filter(|(_, tier)| *tier != starting_tier)
            .unzip();
        Self {
            columns,
            column_tiers,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, season: u32, result: &SeasonResult) {
        let tier_games = self
            .column_tiers
            .iter()
            .map(|&tier| result.games_to_tier(tier))
            .collect();
        self.rows.push(TierRow {
            season,
            total_games: result.total_games,
            tier_games,
        });
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[TierRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Recorded game counts for one column, skipping seasons that never reached it.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<u32>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.column_values(idx))
    }

    fn column_values(&self, idx: usize) -> Vec<u32> {
        self.rows
            .iter()
            .filter_map(|row| row.tier_games.get(idx).copied().flatten())
            .collect()
    }

    /// Distribution of games-to-tier for every column.
    #[must_use]
    pub fn summaries(&self) -> Vec<TierSummary> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, tier)| {
                let values = self.column_values(idx);
                TierSummary {
                    tier: tier.clone(),
                    seasons_reached: values.len(),
                    distribution: Distribution::from_values(&values),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierSummary {
    pub tier: String,
    pub seasons_reached: usize,
    pub distribution: Option<Distribution>,
}

/// Aggregated output of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub win_rate: f64,
    pub starting_points: i64,
    pub starting_rank: String,
    pub starting_tier: String,
    pub terminal_tier: String,
    pub seed: u64,
    pub seasons_requested: u32,
    pub mean_total_games: f64,
    pub total_games: Distribution,
    pub mean_observed_win_rate: f64,
    pub excluded: Vec<ExcludedSeason>,
    pub table: TierGamesTable,
}

impl BatchResult {
    #[must_use]
    pub fn seasons_completed(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn tier_summaries(&self) -> Vec<TierSummary> {
        self.table.summaries()
    }

    /// Games played across every completed season.
    #[must_use]
    pub fn games_simulated(&self) -> u64 {
        self.table
            .rows()
            .iter()
            .map(|row| u64::from(row.total_games))
            .sum()
    }
}

/// Run a batch without progress reporting.
///
/// # Errors
///
/// See [`run_batch_with_progress`].
pub fn run_batch(ladder: &RankLadder, config: &BatchConfig) -> Result<BatchResult, BatchError> {
    run_batch_with_progress(ladder, config, &|_| {})
}

/// Simulate `config.season_count()` independent seasons and aggregate them.
///
/// Season `i` draws from its own stream derived from `config.seed` and `i`,
/// so parallel and sequential runs produce identical results. `progress` is
/// called once per finished season; under the thread pool the calls may
/// arrive out of order.
///
/// # Errors
///
/// Returns [`BatchError::Config`] for invalid inputs before simulating, and
/// [`BatchError::NoSeasonsCompleted`] when every season hit the game limit.
pub fn run_batch_with_progress<F>(
    ladder: &RankLadder,
    config: &BatchConfig,
    progress: &F,
) -> Result<BatchResult, BatchError>
where
    F: Fn(BatchProgress) + Sync,
{
    config.validate(ladder)?;
    let total = config.season_count();
    let params = config.season_params();
    info!(
        "simulating {total} seasons at win rate {:.3} from {} points (seed {})",
        config.win_rate, config.starting_points, config.seed
    );

    let completed = AtomicU32::new(0);
    let run_one = |index: u32| {
        let mut rng = season_rng(config.seed, index);
        let outcome = simulate_season(ladder, &params, &mut rng);
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        progress(BatchProgress {
            completed: done,
            total,
        });
        outcome
    };

    let outcomes: Vec<Result<SeasonResult, SeasonError>> = if config.parallel {
        (0..total).into_par_iter().map(run_one).collect()
    } else {
        (0..total).map(run_one).collect()
    };

    aggregate(ladder, config, outcomes)
}

fn aggregate(
    ladder: &RankLadder,
    config: &BatchConfig,
    outcomes: Vec<Result<SeasonResult, SeasonError>>,
) -> Result<BatchResult, BatchError> {
    let starting_rank = ladder.rank_for(config.starting_points);
    let mut table = TierGamesTable::new(ladder, starting_rank.tier);
    let mut totals = Vec::with_capacity(outcomes.len());
    let mut observed = RunningStats::default();
    let mut excluded = Vec::new();

    for (index, outcome) in (0_u32..).zip(outcomes) {
        match outcome {
            Ok(result) => {
                debug!(
                    "season {index}: {} games, {} wins",
                    result.total_games, result.wins
                );
                totals.push(result.total_games);
                observed.add(result.observed_win_rate());
                table.push(index, &result);
            }
            Err(err) => {
                if excluded.len() < EXCLUDED_SEASON_WARN_LIMIT {
                    warn!("season {index} excluded from aggregate: {err}");
                }
                let SeasonError::DidNotTerminate {
                    max_games, points, ..
                } = err;
                excluded.push(ExcludedSeason {
                    index,
                    points,
                    max_games,
                });
            }
        }
    }

    if excluded.len() > EXCLUDED_SEASON_WARN_LIMIT {
        warn!(
            "{} further seasons excluded after reaching the {} game limit",
            excluded.len() - EXCLUDED_SEASON_WARN_LIMIT,
            config.max_games_per_season
        );
    }

    let Some(total_games) = Distribution::from_values(&totals) else {
        return Err(BatchError::NoSeasonsCompleted {
            excluded: excluded.len(),
        });
    };
    let games_sum: u64 = totals.iter().map(|&g| u64::from(g)).sum();
    let mean_total_games = u64_to_f64(games_sum) / usize_to_f64(totals.len());

    info!(
        "batch finished: {} seasons completed, {} excluded, mean {:.1} games",
        totals.len(),
        excluded.len(),
        mean_total_games
    );

    Ok(BatchResult {
        win_rate: config.win_rate,
        starting_points: config.starting_points,
        starting_rank: starting_rank.name.clone(),
        starting_tier: ladder.tier_name(starting_rank.tier).to_string(),
        terminal_tier: ladder.tier_name(ladder.terminal_rank().tier).to_string(),
        seed: config.seed,
        seasons_requested: config.season_count(),
        mean_total_games,
        total_games,
        mean_observed_win_rate: observed.mean(),
        excluded,
        table,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn season_count_caps_at_half_win_rate() {
        let at_half = season_count_for_win_rate(0.5);
        assert_eq!(at_half, 10_000);
        for win_rate in [0.51, 0.6, 0.8, 1.0] {
            assert_eq!(season_count_for_win_rate(win_rate), at_half);
        }
    }

    #[test]
    fn season_count_follows_geometric_rule_below_cap() {
        assert_eq!(season_count_for_win_rate(0.4), 1_000);
        assert_eq!(season_count_for_win_rate(0.45), 3_162);
        let counts: Vec<u32> = (40..=50)
            .map(|pct| season_count_for_win_rate(f64::from(pct) / 100.0))
            .collect();
        assert!(counts.windows(2).all(|pair| pair[0] < pair[1]));
        for pair in counts.windows(2) {
            let ratio = f64::from(pair[1]) / f64::from(pair[0]);
            assert!((ratio - 10_f64.powf(0.1)).abs() < 0.01, "ratio {ratio}");
        }
    }

    #[test]
    fn fixed_policy_overrides_win_rate_rule() {
        let config = BatchConfig::new(0.42, 0, 1).with_seasons(25);
        assert_eq!(config.season_count(), 25);
        assert_eq!(BatchConfig::new(0.42, 0, 1).season_count(), 1_585);
    }

    #[test]
    fn validation_rejects_out_of_domain_inputs() {
        let ladder = RankLadder::builtin();
        let check = |config: BatchConfig| config.validate(&ladder);
        assert!(matches!(
            check(BatchConfig::new(0.0, 0, 1)),
            Err(BatchConfigError::InvalidWinRate { .. })
        ));
        assert!(matches!(
            check(BatchConfig::new(1.2, 0, 1)),
            Err(BatchConfigError::InvalidWinRate { .. })
        ));
        assert!(matches!(
            check(BatchConfig::new(f64::NAN, 0, 1)),
            Err(BatchConfigError::InvalidWinRate { .. })
        ));
        assert!(matches!(
            check(BatchConfig::new(0.6, -1, 1)),
            Err(BatchConfigError::InvalidStartingPoints { .. })
        ));
        assert!(matches!(
            check(BatchConfig::new(0.6, 1451, 1)),
            Err(BatchConfigError::InvalidStartingPoints { terminal: 1450, .. })
        ));
        assert_eq!(
            check(BatchConfig::new(0.6, 0, 1).with_seasons(0)),
            Err(BatchConfigError::ZeroSeasons)
        );
        assert_eq!(
            check(BatchConfig::new(0.6, 0, 1).with_max_games(0)),
            Err(BatchConfigError::ZeroMaxGames)
        );
        assert_eq!(check(BatchConfig::new(1.0, 1450, 1)), Ok(()));
    }

    #[test]
    fn product_range_is_forty_to_eighty_percent() {
        assert!(BatchConfig::new(0.4, 0, 1).validate_product_range().is_ok());
        assert!(BatchConfig::new(0.8, 0, 1).validate_product_range().is_ok());
        assert!(matches!(
            BatchConfig::new(0.39, 0, 1).validate_product_range(),
            Err(BatchConfigError::UnsupportedWinRate { .. })
        ));
        assert!(BatchConfig::new(0.85, 0, 1).validate_product_range().is_err());
    }

    #[test]
    fn invalid_config_fails_before_any_season_runs() {
        let ladder = RankLadder::builtin();
        let calls = AtomicU32::new(0);
        let err = run_batch_with_progress(&ladder, &BatchConfig::new(0.0, 0, 1), &|_| {
            calls.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap_err();
        assert!(matches!(
            err,
            BatchError::Config(BatchConfigError::InvalidWinRate { .. })
        ));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn mean_is_arithmetic_mean_of_completed_seasons() {
        let ladder = RankLadder::builtin();
        let config = BatchConfig::new(0.6, 0, 11).with_seasons(300);
        let result = run_batch(&ladder, &config).unwrap();
        assert_eq!(result.seasons_completed(), 300);
        assert!(result.excluded.is_empty());
        let sum: u64 = result
            .table
            .rows()
            .iter()
            .map(|row| u64::from(row.total_games))
            .sum();
        let expected = sum as f64 / 300.0;
        assert!((result.mean_total_games - expected).abs() < 1e-9);
        assert_eq!(result.games_simulated(), sum);
        assert!((result.total_games.mean - expected).abs() < 1e-6);
    }

    #[test]
    fn parallel_and_sequential_batches_match() {
        let ladder = RankLadder::builtin();
        let config = BatchConfig::new(0.55, 120, 0xC0FFEE).with_seasons(64);
        let parallel = run_batch(&ladder, &config).unwrap();
        let sequential = run_batch(&ladder, &config.with_parallel(false)).unwrap();
        assert_eq!(parallel, sequential);
        let again = run_batch(&ladder, &config).unwrap();
        assert_eq!(parallel, again);
    }

    #[test]
    fn progress_reports_every_season() {
        let ladder = RankLadder::builtin();
        let config = BatchConfig::new(0.7, 0, 5)
            .with_seasons(40)
            .with_parallel(false);
        let seen = Mutex::new(Vec::new());
        run_batch_with_progress(&ladder, &config, &|p: BatchProgress| {
            seen.lock().unwrap().push(p);
        })
        .unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 40);
        assert!(seen.iter().all(|p| p.total == 40));
        let completed: Vec<u32> = seen.iter().map(|p| p.completed).collect();
        assert_eq!(completed, (1..=40).collect::<Vec<_>>());
        assert!((seen[39].fraction() - 1.0).abs() < f64::EPSILON);
        assert!((seen[19].fraction() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn columns_cover_every_tier_but_the_start() {
        let ladder = RankLadder::builtin();
        let result = run_batch(&ladder, &BatchConfig::new(0.65, 300, 3).with_seasons(20)).unwrap();
        assert_eq!(result.starting_rank, "Poké Ball 4");
        assert_eq!(result.starting_tier, "Poké Ball");
        assert_eq!(result.terminal_tier, "Master Ball");
        assert_eq!(
            result.table.columns(),
            ["Beginner", "Great Ball", "Ultra Ball", "Master Ball"]
        );
        let master = result.table.column("Master Ball").unwrap();
        let totals: Vec<u32> = result.table.rows().iter().map(|r| r.total_games).collect();
        assert_eq!(master, totals);
        let summaries = result.tier_summaries();
        assert_eq!(summaries.len(), 4);
        assert_eq!(summaries[0].tier, "Beginner");
        assert!(summaries[1..].iter().all(|s| s.seasons_reached == 20));
        let great = summaries[1].distribution.as_ref().unwrap();
        let ultra = summaries[2].distribution.as_ref().unwrap();
        assert!(great.mean < ultra.mean);
        assert!(result.table.column("Beginner").is_some());
        assert!(result.table.column("Poké Ball").is_none());
    }

    #[test]
    fn drop_below_the_starting_tier_fills_the_lower_column() {
        let ladder = RankLadder::builtin();
        let config = BatchConfig::new(0.5, 355, 4).with_seasons(200);
        let result = run_batch(&ladder, &config).unwrap();
        assert_eq!(result.starting_tier, "Great Ball");
        assert_eq!(
            result.table.columns(),
            ["Beginner", "Poké Ball", "Ultra Ball", "Master Ball"]
        );
        let dropped = result.table.column("Poké Ball").unwrap();
        assert!(!dropped.is_empty());
        assert!(dropped.len() < result.seasons_completed());
        for row in result.table.rows() {
            if let Some(games) = row.tier_games[1] {
                assert!(games >= 1 && games < row.total_games);
            }
        }
        assert!(result.table.rows().iter().any(|row| row.tier_games[1].is_none()));
    }

    #[test]
    fn non_terminating_seasons_are_excluded_not_fatal() {
        let ladder = RankLadder::builtin();
        let config = BatchConfig::new(0.97, 0, 21)
            .with_seasons(100)
            .with_max_games(75);
        let result = run_batch(&ladder, &config).unwrap();
        assert!(!result.excluded.is_empty());
        assert_eq!(result.seasons_completed() + result.excluded.len(), 100);
        assert!(result.excluded.iter().all(|e| e.max_games == 75));
        assert!(result.table.rows().iter().all(|r| r.total_games <= 75));
    }

    #[test]
    fn batch_errors_when_no_season_completes() {
        let ladder = RankLadder::builtin();
        let config = BatchConfig::new(0.5, 0, 2)
            .with_seasons(10)
            .with_max_games(50);
        let err = run_batch(&ladder, &config).unwrap_err();
        assert!(matches!(err, BatchError::NoSeasonsCompleted { excluded: 10 }));
    }

    #[test]
    fn starting_at_terminal_yields_zero_game_seasons() {
        let ladder = RankLadder::builtin();
        let result = run_batch(&ladder, &BatchConfig::new(0.6, 1450, 8).with_seasons(5)).unwrap();
        assert!(result.mean_total_games.abs() < f64::EPSILON);
        assert_eq!(
            result.table.columns(),
            ["Beginner", "Poké Ball", "Great Ball", "Ultra Ball"]
        );
        assert!(
            result
                .table
                .rows()
                .iter()
                .all(|row| row.tier_games.iter().all(Option::is_none))
        );
        assert!(result.tier_summaries().iter().all(|s| s.distribution.is_none()));
        assert_eq!(result.seasons_completed(), 5);
    }
}
