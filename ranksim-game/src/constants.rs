//! Centralized ladder tables and tuning constants for the season simulator.
//!
//! These values define the built-in ranked ladder. Keeping them together
//! ensures the default ladder can only be adjusted via code changes reviewed
//! in version control; alternative ladders are loaded as JSON and validated
//! through the same path.

// Ladder tables ------------------------------------------------------------
pub const WIN_POINTS: i64 = 10;

pub const RANK_THRESHOLDS: [(&str, i64); 17] = [
    ("Beginner 1", 0),
    ("Beginner 2", 20),
    ("Beginner 3", 50),
    ("Beginner 4", 95),
    ("Poké Ball 1", 145),
    ("Poké Ball 2", 195),
    ("Poké Ball 3", 245),
    ("Poké Ball 4", 300),
    ("Great Ball 1", 355),
    ("Great Ball 2", 420),
    ("Great Ball 3", 490),
    ("Great Ball 4", 600),
    ("Ultra Ball 1", 710),
    ("Ultra Ball 2", 860),
    ("Ultra Ball 3", 1010),
    ("Ultra Ball 4", 1225),
    ("Master Ball 1", 1450),
];

/// Bonus by consecutive wins; the last entry applies to every longer streak.
pub const STREAK_BONUS: [(u32, i64); 5] = [(1, 0), (2, 3), (3, 6), (4, 9), (5, 12)];

pub const LOSS_PENALTY: [(&str, i64); 5] = [
    ("Beginner", 0),
    ("Poké Ball", -5),
    ("Great Ball", -5),
    ("Ultra Ball", -7),
    ("Master Ball", -10),
];

// Batch tuning -------------------------------------------------------------
pub const DEFAULT_MAX_GAMES_PER_SEASON: u32 = 100_000;
pub const BASE_SEASON_COUNT: f64 = 1_000.0;
pub const SEASON_COUNT_WIN_RATE_FLOOR: f64 = 0.4;
pub const SEASON_COUNT_WIN_RATE_CAP: f64 = 0.5;
pub const SEASON_COUNT_EXPONENT_SCALE: f64 = 10.0;

/// Win rates the product is willing to simulate.
pub const SUPPORTED_WIN_RATE_MIN: f64 = 0.40;
pub const SUPPORTED_WIN_RATE_MAX: f64 = 0.80;

/// Excluded-season warnings emitted individually before switching to a summary.
pub(crate) const EXCLUDED_SEASON_WARN_LIMIT: usize = 3;

// Reference results --------------------------------------------------------
/// First win rate (in hundredths) covered by [`REFERENCE_MEAN_GAMES`].
pub const REFERENCE_WIN_RATE_START_PCT: u32 = 40;

/// Simulated mean games to the terminal rank from 0 points on the built-in
/// ladder, for win rates 0.40..=0.80 in 0.01 steps.
pub const REFERENCE_MEAN_GAMES: [f64; 41] = [
    1484.926, 1194.887, 982.132, 843.68, 738.012, // 0.40 - 0.44
    650.127, 589.231, 538.258, 493.09, 459.009, // 0.45 - 0.49
    424.525, 393.153, 367.034, 346.537, 326.463, // 0.50 - 0.54
    310.332, 293.679, 276.407, 264.246, 253.089, // 0.55 - 0.59
    240.926, 231.919, 219.51, 211.928, 203.88, // 0.60 - 0.64
    195.79, 188.951, 181.143, 174.944, 167.794, // 0.65 - 0.69
    162.673, 157.054, 152.025, 147.737, 141.183, // 0.70 - 0.74
    136.461, 133.371, 129.334, 125.196, 121.398, // 0.75 - 0.79
    117.115, // 0.80
];
