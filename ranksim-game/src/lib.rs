//! Ranked Ladder Season Simulator
//!
//! Monte Carlo estimation of how many games a player with a fixed per-game win
//! rate needs to climb a points-based ranked ladder to its terminal rank.
//! This crate holds the ladder model, the season state machine and the batch
//! runner; it performs no I/O.

pub mod batch;
pub mod constants;
pub mod ladder;
pub mod numbers;
pub mod reference;
pub mod season;
pub mod seed;
pub mod stats;
pub mod sweep;

use anyhow::Context;

// Re-export commonly used types
pub use batch::{
    BatchConfig, BatchConfigError, BatchError, BatchProgress, BatchResult, ExcludedSeason,
    SampleSizePolicy, TierGamesTable, TierRow, TierSummary, run_batch, run_batch_with_progress,
    season_count_for_win_rate,
};
pub use ladder::{
    LadderConfig, LadderConfigError, LossPenaltyDef, Rank, RankDef, RankLadder, StreakBonusDef,
    TierId, major_tier_name,
};
pub use reference::{estimated_total_games, reference_mean_games};
pub use season::{
    GameOutcome, SeasonError, SeasonParams, SeasonResult, SeasonState, TierMilestones,
    simulate_season,
};
pub use seed::{derive_season_seed, season_rng};
pub use stats::{Distribution, Percentiles, RunningStats};
pub use sweep::{SweepPoint, SweepProgress, default_sweep_win_rates, sweep, sweep_with_progress};

/// Source of a ladder definition.
/// Front ends provide their own (files, embedded assets, ...).
pub trait LadderSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the raw ladder definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition cannot be read or parsed.
    fn load_ladder(&self) -> Result<LadderConfig, Self::Error>;
}

/// The ladder compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLadder;

impl LadderSource for BuiltinLadder {
    type Error = std::convert::Infallible;

    fn load_ladder(&self) -> Result<LadderConfig, Self::Error> {
        Ok(LadderConfig::builtin())
    }
}

/// Entry point holding a validated ladder.
#[derive(Debug, Clone)]
pub struct Simulator {
    ladder: RankLadder,
}

impl Simulator {
    #[must_use]
    pub const fn new(ladder: RankLadder) -> Self {
        Self { ladder }
    }

    /// Load and validate the ladder from `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails or the ladder is malformed.
    pub fn from_source<L>(source: &L) -> anyhow::Result<Self>
    where
        L: LadderSource,
    {
        let config = source.load_ladder().context("failed to load ladder")?;
        let ladder = config.compile().context("ladder definition is invalid")?;
        Ok(Self { ladder })
    }

    #[must_use]
    pub const fn ladder(&self) -> &RankLadder {
        &self.ladder
    }

    /// Run a batch.
    ///
    /// # Errors
    ///
    /// See [`run_batch`].
    pub fn run(&self, config: &BatchConfig) -> Result<BatchResult, BatchError> {
        run_batch(&self.ladder, config)
    }

    /// Run a batch, reporting each finished season.
    ///
    /// # Errors
    ///
    /// See [`run_batch_with_progress`].
    pub fn run_with_progress<F>(
        &self,
        config: &BatchConfig,
        progress: &F,
    ) -> Result<BatchResult, BatchError>
    where
        F: Fn(BatchProgress) + Sync,
    {
        run_batch_with_progress(&self.ladder, config, progress)
    }

    /// Run one batch per win rate.
    ///
    /// # Errors
    ///
    /// See [`sweep()`].
    pub fn sweep(
        &self,
        win_rates: &[f64],
        template: &BatchConfig,
    ) -> Result<Vec<SweepPoint>, BatchError> {
        sweep::sweep(&self.ladder, win_rates, template)
    }

    /// Run one batch per win rate, reporting each finished season.
    ///
    /// # Errors
    ///
    /// See [`sweep()`].
    pub fn sweep_with_progress<F>(
        &self,
        win_rates: &[f64],
        template: &BatchConfig,
        progress: &F,
    ) -> Result<Vec<SweepPoint>, BatchError>
    where
        F: Fn(SweepProgress) + Sync,
    {
        sweep::sweep_with_progress(&self.ladder, win_rates, template, progress)
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(RankLadder::builtin())
    }
}
