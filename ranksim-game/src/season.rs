//! Single-season state machine: point accrual, streaks and tier milestones.
use rand::Rng;
use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;

use crate::constants::DEFAULT_MAX_GAMES_PER_SEASON;
use crate::ladder::{RankLadder, TierId};
use crate::numbers::u64_to_f64;

/// Inline storage for per-tier milestones; ladders rarely exceed eight tiers.
pub type TierSlots = SmallVec<[Option<u32>; 8]>;

/// Games played when each major tier was first reached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct TierMilestones(TierSlots);

impl TierMilestones {
    fn with_tier_count(count: usize) -> Self {
        Self(SmallVec::from_elem(None, count))
    }

    /// Record `games` for `tier` unless the tier was already reached.
    ///
    /// Returns `true` when the entry was newly written.
    pub fn record(&mut self, tier: TierId, games: u32) -> bool {
        let Some(slot) = self.0.get_mut(tier.index()) else {
            return false;
        };
        if slot.is_some() {
            return false;
        }
        *slot = Some(games);
        true
    }

    #[must_use]
    pub fn get(&self, tier: TierId) -> Option<u32> {
        self.0.get(tier.index()).copied().flatten()
    }

    #[must_use]
    pub fn contains(&self, tier: TierId) -> bool {
        self.get(tier).is_some()
    }

    fn forget(&mut self, tier: TierId) {
        if let Some(slot) = self.0.get_mut(tier.index()) {
            *slot = None;
        }
    }

    /// Reached tiers in ladder order.
    pub fn iter(&self) -> impl Iterator<Item = (TierId, u32)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(idx, games)| games.map(|g| (TierId(idx), g)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inputs for one simulated season.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonParams {
    pub win_rate: f64,
    pub starting_points: i64,
    pub max_games: u32,
}

impl SeasonParams {
    #[must_use]
    pub const fn new(win_rate: f64, starting_points: i64) -> Self {
        Self {
            win_rate,
            starting_points,
            max_games: DEFAULT_MAX_GAMES_PER_SEASON,
        }
    }

    #[must_use]
    pub const fn with_max_games(mut self, max_games: u32) -> Self {
        self.max_games = max_games;
        self
    }
}

/// Result of a single game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Win { awarded: i64, streak: u32 },
    /// `tier` is the tier held when the game started, which sets the penalty.
    Loss { penalty: i64, tier: TierId },
}

/// Mutable state of a season in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonState {
    points: i64,
    streak: u32,
    longest_streak: u32,
    rank: usize,
    games: u32,
    wins: u32,
    starting_tier: TierId,
    milestones: TierMilestones,
}

impl SeasonState {
    /// Start a season at `starting_points`; the starting tier counts as reached at game 0.
    #[must_use]
    pub fn new(ladder: &RankLadder, starting_points: i64) -> Self {
        let rank = ladder.rank_index_for(starting_points);
        let starting_tier = ladder.ranks()[rank].tier;
        let mut milestones = TierMilestones::with_tier_count(ladder.tiers().len());
        milestones.record(starting_tier, 0);
        Self {
            points: starting_points,
            streak: 0,
            longest_streak: 0,
            rank,
            games: 0,
            wins: 0,
            starting_tier,
            milestones,
        }
    }

    #[must_use]
    pub const fn points(&self) -> i64 {
        self.points
    }

    #[must_use]
    pub const fn streak(&self) -> u32 {
        self.streak
    }

    #[must_use]
    pub const fn rank_index(&self) -> usize {
        self.rank
    }

    #[must_use]
    pub const fn games(&self) -> u32 {
        self.games
    }

    #[must_use]
    pub const fn wins(&self) -> u32 {
        self.wins
    }

    #[must_use]
    pub const fn milestones(&self) -> &TierMilestones {
        &self.milestones
    }

    #[must_use]
    pub fn is_complete(&self, ladder: &RankLadder) -> bool {
        self.points >= ladder.terminal_threshold()
    }

    /// Apply one game and re-derive the rank from the new point total.
    pub fn play_game(&mut self, ladder: &RankLadder, won: bool) -> GameOutcome {
        self.games = self.games.saturating_add(1);

        let outcome = if won {
            self.wins = self.wins.saturating_add(1);
            self.streak = self.streak.saturating_add(1);
            self.longest_streak = self.longest_streak.max(self.streak);
            let awarded = ladder.win_award(self.streak);
            self.points = self.points.saturating_add(awarded);
            GameOutcome::Win {
                awarded,
                streak: self.streak,
            }
        } else {
            let tier = ladder.ranks()[self.rank].tier;
            let penalty = ladder.loss_penalty(tier);
            self.streak = 0;
            self.points = self.points.saturating_add(penalty);
            GameOutcome::Loss { penalty, tier }
        };

        self.rank = ladder.rank_index_for(self.points);
        let tier = ladder.ranks()[self.rank].tier;
        self.milestones.record(tier, self.games);
        outcome
    }

    /// Summarize the season, dropping the starting tier from the milestones.
    #[must_use]
    pub fn into_result(mut self) -> SeasonResult {
        self.milestones.forget(self.starting_tier);
        SeasonResult {
            total_games: self.games,
            wins: self.wins,
            final_points: self.points,
            longest_streak: self.longest_streak,
            starting_tier: self.starting_tier,
            tier_games: self.milestones,
        }
    }
}

/// Summary of a completed season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonResult {
    pub total_games: u32,
    pub wins: u32,
    pub final_points: i64,
    pub longest_streak: u32,
    pub starting_tier: TierId,
    pub tier_games: TierMilestones,
}

impl SeasonResult {
    /// Win rate actually realised over the season.
    #[must_use]
    pub fn observed_win_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            u64_to_f64(u64::from(self.wins)) / u64_to_f64(u64::from(self.total_games))
        }
    }

    #[must_use]
    pub fn games_to_tier(&self, tier: TierId) -> Option<u32> {
        self.tier_games.get(tier)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SeasonError {
    #[error(
        "season did not reach {terminal_threshold} points within {max_games} games (stalled at {points})"
    )]
    DidNotTerminate {
        max_games: u32,
        points: i64,
        terminal_threshold: i64,
    },
}

/// Play one season from `params.starting_points` until the terminal rank.
///
/// A game is won when a uniform draw from `[0, 1)` is at most `params.win_rate`.
/// Inputs are not range-checked here; callers validate them.
///
/// # Errors
///
/// Returns [`SeasonError::DidNotTerminate`] once `params.max_games` games have
/// been played without reaching the terminal threshold.
pub fn simulate_season<R>(
    ladder: &RankLadder,
    params: &SeasonParams,
    rng: &mut R,
) -> Result<SeasonResult, SeasonError>
where
    R: Rng + ?Sized,
{
    let mut state = SeasonState::new(ladder, params.starting_points);
    while !state.is_complete(ladder) {
        if state.games >= params.max_games {
            return Err(SeasonError::DidNotTerminate {
                max_games: params.max_games,
                points: state.points,
                terminal_threshold: ladder.terminal_threshold(),
            });
        }
        let won = rng.r#gen::<f64>() <= params.win_rate;
        state.play_game(ladder, won);
    }
    Ok(state.into_result())
}
