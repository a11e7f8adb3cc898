//! Rank ladder model: thresholds, major tiers, streak bonuses and loss penalties.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::constants::{LOSS_PENALTY, RANK_THRESHOLDS, STREAK_BONUS, WIN_POINTS};

/// Index of a major tier in ladder order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(pub usize);

impl TierId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankDef {
    pub name: String,
    pub threshold: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakBonusDef {
    pub wins: u32,
    pub bonus: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossPenaltyDef {
    pub tier: String,
    pub points: i64,
}

/// Serializable ladder tables as they appear in a JSON ladder file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderConfig {
    #[serde(default = "LadderConfig::default_win_points")]
    pub win_points: i64,
    pub ranks: Vec<RankDef>,
    pub streak_bonus: Vec<StreakBonusDef>,
    pub loss_penalty: Vec<LossPenaltyDef>,
}

/// Errors raised when ladder tables violate their invariants.
#[derive(Debug, Error)]
pub enum LadderConfigError {
    #[error("ladder config is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ladder has no ranks")]
    EmptyLadder,
    #[error("lowest rank {name} must start at 0 points (got {threshold})")]
    LowestThresholdNotZero { name: String, threshold: i64 },
    #[error("rank {name} threshold {threshold} does not exceed the previous threshold {previous}")]
    ThresholdsNotAscending {
        name: String,
        threshold: i64,
        previous: i64,
    },
    #[error("rank name {name} appears more than once")]
    DuplicateRank { name: String },
    #[error("ranks of tier {tier} are not contiguous")]
    TierNotContiguous { tier: String },
    #[error("streak bonus table is empty")]
    EmptyStreakTable,
    #[error("streak bonus table must list wins 1..=n in order (expected {expected}, got {found})")]
    StreakTableGap { expected: u32, found: u32 },
    #[error("no loss penalty configured for tier {tier}")]
    MissingLossPenalty { tier: String },
    #[error("loss penalty references unknown tier {tier}")]
    UnknownTier { tier: String },
    #[error("loss penalty for tier {tier} is configured more than once")]
    DuplicateLossPenalty { tier: String },
    #[error("smallest win award {award} must be positive")]
    WinAwardNotPositive { award: i64 },
}

impl LadderConfig {
    const fn default_win_points() -> i64 {
        WIN_POINTS
    }

    /// Built-in ladder tables.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            win_points: WIN_POINTS,
            ranks: RANK_THRESHOLDS
                .iter()
                .map(|&(name, threshold)| RankDef {
                    name: name.to_string(),
                    threshold,
                })
                .collect(),
            streak_bonus: STREAK_BONUS
                .iter()
                .map(|&(wins, bonus)| StreakBonusDef { wins, bonus })
                .collect(),
            loss_penalty: LOSS_PENALTY
                .iter()
                .map(|&(tier, points)| LossPenaltyDef {
                    tier: tier.to_string(),
                    points,
                })
                .collect(),
        }
    }

    /// Parse ladder tables from JSON without validating them.
    ///
    /// # Errors
    ///
    /// Returns [`LadderConfigError::Json`] when the text is not a ladder document.
    pub fn from_json_str(text: &str) -> Result<Self, LadderConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render the tables as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`LadderConfigError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, LadderConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the tables and build the lookup structure used by the simulator.
    ///
    /// # Errors
    ///
    /// Returns the first invariant violation found.
    pub fn compile(&self) -> Result<RankLadder, LadderConfigError> {
        let (ranks, tiers) = self.compile_ranks()?;
        let streak_bonus = self.compile_streak_bonus()?;
        let loss_penalty = self.compile_loss_penalty(&tiers)?;

        let min_bonus = streak_bonus.iter().copied().min().unwrap_or(0);
        let award = self.win_points.saturating_add(min_bonus);
        if award <= 0 {
            return Err(LadderConfigError::WinAwardNotPositive { award });
        }

        Ok(RankLadder {
            ranks,
            tiers,
            streak_bonus,
            loss_penalty,
            win_points: self.win_points,
        })
    }

    fn compile_ranks(&self) -> Result<(Vec<Rank>, Vec<String>), LadderConfigError> {
        let first = self.ranks.first().ok_or(LadderConfigError::EmptyLadder)?;
        if first.threshold != 0 {
            return Err(LadderConfigError::LowestThresholdNotZero {
                name: first.name.clone(),
                threshold: first.threshold,
            });
        }

        let mut seen_names = HashSet::new();
        let mut tiers: Vec<String> = Vec::new();
        let mut ranks = Vec::with_capacity(self.ranks.len());
        let mut previous: Option<i64> = None;

        for def in &self.ranks {
            if let Some(previous) = previous
                && def.threshold <= previous
            {
                return Err(LadderConfigError::ThresholdsNotAscending {
                    name: def.name.clone(),
                    threshold: def.threshold,
                    previous,
                });
            }
            previous = Some(def.threshold);

            if !seen_names.insert(def.name.as_str()) {
                return Err(LadderConfigError::DuplicateRank {
                    name: def.name.clone(),
                });
            }

            let tier_name = major_tier_name(&def.name);
            let tier = match tiers.iter().position(|t| t == tier_name) {
                Some(idx) if idx + 1 == tiers.len() => TierId(idx),
                Some(_) => {
                    return Err(LadderConfigError::TierNotContiguous {
                        tier: tier_name.to_string(),
                    });
                }
                None => {
                    tiers.push(tier_name.to_string());
                    TierId(tiers.len() - 1)
                }
            };

            ranks.push(Rank {
                name: def.name.clone(),
                threshold: def.threshold,
                tier,
            });
        }

        Ok((ranks, tiers))
    }

    fn compile_streak_bonus(&self) -> Result<Vec<i64>, LadderConfigError> {
        if self.streak_bonus.is_empty() {
            return Err(LadderConfigError::EmptyStreakTable);
        }
        let mut expected = 1_u32;
        let mut bonuses = Vec::with_capacity(self.streak_bonus.len());
        for entry in &self.streak_bonus {
            if entry.wins != expected {
                return Err(LadderConfigError::StreakTableGap {
                    expected,
                    found: entry.wins,
                });
            }
            bonuses.push(entry.bonus);
            expected = expected.saturating_add(1);
        }
        Ok(bonuses)
    }

    fn compile_loss_penalty(&self, tiers: &[String]) -> Result<Vec<i64>, LadderConfigError> {
        let mut penalties: Vec<Option<i64>> = vec![None; tiers.len()];
        for entry in &self.loss_penalty {
            let idx = tiers
                .iter()
                .position(|t| *t == entry.tier)
                .ok_or_else(|| LadderConfigError::UnknownTier {
                    tier: entry.tier.clone(),
                })?;
            if penalties[idx].replace(entry.points).is_some() {
                return Err(LadderConfigError::DuplicateLossPenalty {
                    tier: entry.tier.clone(),
                });
            }
        }
        penalties
            .into_iter()
            .zip(tiers)
            .map(|(points, tier)| {
                points.ok_or_else(|| LadderConfigError::MissingLossPenalty { tier: tier.clone() })
            })
            .collect()
    }
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

/// A fine-grained rank with its inclusive lower point threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub name: String,
    pub threshold: i64,
    pub tier: TierId,
}

/// Validated, immutable ladder tables shared by every simulated season.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankLadder {
    ranks: Vec<Rank>,
    tiers: Vec<String>,
    streak_bonus: Vec<i64>,
    loss_penalty: Vec<i64>,
    win_points: i64,
}

impl RankLadder {
    /// The built-in ladder.
    ///
    /// # Panics
    ///
    /// Never in practice: the built-in tables are covered by unit tests.
    #[must_use]
    pub fn builtin() -> Self {
        LadderConfig::builtin()
            .compile()
            .unwrap_or_else(|err| unreachable!("built-in ladder tables are valid: {err}"))
    }

    #[must_use]
    pub fn ranks(&self) -> &[Rank] {
        &self.ranks
    }

    /// Major tier names in ladder order.
    #[must_use]
    pub fn tiers(&self) -> &[String] {
        &self.tiers
    }

    #[must_use]
    pub fn tier_name(&self, tier: TierId) -> &str {
        self.tiers.get(tier.0).map_or("", String::as_str)
    }

    #[must_use]
    pub fn tier_by_name(&self, name: &str) -> Option<TierId> {
        self.tiers.iter().position(|t| t == name).map(TierId)
    }

    /// Index of the highest rank whose threshold does not exceed `points`.
    ///
    /// Totals below the lowest threshold resolve to the lowest rank.
    #[must_use]
    pub fn rank_index_for(&self, points: i64) -> usize {
        self.ranks
            .partition_point(|rank| rank.threshold <= points)
            .saturating_sub(1)
    }

    #[must_use]
    pub fn rank_for(&self, points: i64) -> &Rank {
        &self.ranks[self.rank_index_for(points)]
    }

    #[must_use]
    pub fn tier_for(&self, points: i64) -> TierId {
        self.rank_for(points).tier
    }

    #[must_use]
    pub fn terminal_rank(&self) -> &Rank {
        &self.ranks[self.ranks.len() - 1]
    }

    /// Points at which a season ends.
    #[must_use]
    pub fn terminal_threshold(&self) -> i64 {
        self.terminal_rank().threshold
    }

    #[must_use]
    pub const fn win_points(&self) -> i64 {
        self.win_points
    }

    /// Longest streak with its own bonus entry; longer streaks reuse it.
    #[must_use]
    pub fn max_streak(&self) -> u32 {
        u32::try_from(self.streak_bonus.len()).unwrap_or(u32::MAX)
    }

    /// Bonus for a win that extends the streak to `streak`, capped at [`Self::max_streak`].
    #[must_use]
    pub fn streak_bonus(&self, streak: u32) -> i64 {
        let capped = streak.clamp(1, self.max_streak());
        let idx = usize::try_from(capped - 1).unwrap_or(0);
        self.streak_bonus.get(idx).copied().unwrap_or(0)
    }

    /// Total points awarded for a win that brings the streak to `streak`.
    #[must_use]
    pub fn win_award(&self, streak: u32) -> i64 {
        self.win_points.saturating_add(self.streak_bonus(streak))
    }

    /// Point delta applied when a game is lost while holding `tier`.
    #[must_use]
    pub fn loss_penalty(&self, tier: TierId) -> i64 {
        self.loss_penalty.get(tier.0).copied().unwrap_or(0)
    }

    /// Reconstruct the serializable tables.
    #[must_use]
    pub fn to_config(&self) -> LadderConfig {
        LadderConfig {
            win_points: self.win_points,
            ranks: self
                .ranks
                .iter()
                .map(|rank| RankDef {
                    name: rank.name.clone(),
                    threshold: rank.threshold,
                })
                .collect(),
            streak_bonus: self
                .streak_bonus
                .iter()
                .zip(1_u32..)
                .map(|(&bonus, wins)| StreakBonusDef { wins, bonus })
                .collect(),
            loss_penalty: self
                .tiers
                .iter()
                .zip(&self.loss_penalty)
                .map(|(tier, &points)| LossPenaltyDef {
                    tier: tier.clone(),
                    points,
                })
                .collect(),
        }
    }
}

impl Default for RankLadder {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Strip the trailing sub-level suffix (whitespace then digits) from a rank name.
///
/// Names without a numeric suffix are their own major tier.
#[must_use]
pub fn major_tier_name(rank_name: &str) -> &str {
    let trimmed = rank_name.trim_end();
    let without_digits = trimmed.trim_end_matches(|c: char| c.is_ascii_digit());
    if without_digits.len() == trimmed.len() {
        return trimmed;
    }
    let base = without_digits.trim_end();
    if base.is_empty() || base.len() == without_digits.len() {
        trimmed
    } else {
        base
    }
}
