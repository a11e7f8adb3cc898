//! Lookups into the precomputed reference results for the built-in ladder.
use crate::constants::{REFERENCE_MEAN_GAMES, REFERENCE_WIN_RATE_START_PCT};
use crate::numbers::{round_f64_to_u32, round_f64_to_u64};

/// Reference mean games from 0 points, for the win rate rounded to hundredths.
///
/// `None` outside 0.40..=0.80.
#[must_use]
pub fn reference_mean_games(win_rate: f64) -> Option<f64> {
    if !win_rate.is_finite() || win_rate < 0.0 {
        return None;
    }
    let pct = round_f64_to_u32(win_rate * 100.0);
    let offset = pct.checked_sub(REFERENCE_WIN_RATE_START_PCT)?;
    REFERENCE_MEAN_GAMES
        .get(usize::try_from(offset).ok()?)
        .copied()
}

/// Expected number of games a batch of `seasons` will play, from the reference table.
#[must_use]
pub fn estimated_total_games(win_rate: f64, seasons: u32) -> Option<u64> {
    reference_mean_games(win_rate).map(|mean| round_f64_to_u64(mean * f64::from(seasons)))
}
