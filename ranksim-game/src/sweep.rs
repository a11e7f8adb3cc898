//! Win-rate sweeps: one batch per win rate, summarized side by side.
use log::info;
use serde::Serialize;

use crate::batch::{BatchConfig, BatchError, BatchProgress, run_batch_with_progress};
use crate::constants::{SUPPORTED_WIN_RATE_MAX, SUPPORTED_WIN_RATE_MIN};
use crate::ladder::RankLadder;
use crate::numbers::{round_f64_to_u32, usize_to_f64};
use crate::reference::reference_mean_games;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub win_rate: f64,
    pub seasons: usize,
    pub excluded: usize,
    pub mean_total_games: f64,
    /// Reference mean for the built-in ladder from 0 points, when one exists.
    pub reference_mean: Option<f64>,
}

impl SweepPoint {
    /// Relative deviation from the reference mean.
    #[must_use]
    pub fn reference_deviation(&self) -> Option<f64> {
        self.reference_mean
            .filter(|reference| *reference > 0.0)
            .map(|reference| (self.mean_total_games - reference) / reference)
    }
}

/// Progress of a sweep: which batch is running and how far along it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepProgress {
    /// Zero-based index of the running batch.
    pub point: usize,
    pub points: usize,
    pub batch: BatchProgress,
}

impl SweepProgress {
    /// Fraction of the whole sweep complete in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.points == 0 {
            return 1.0;
        }
        let done = usize_to_f64(self.point) + self.batch.fraction();
        (done / usize_to_f64(self.points)).clamp(0.0, 1.0)
    }
}

/// Win rates 0.40..=0.80 in steps of 0.01.
#[must_use]
pub fn default_sweep_win_rates() -> Vec<f64> {
    let start = round_f64_to_u32(SUPPORTED_WIN_RATE_MIN * 100.0);
    let end = round_f64_to_u32(SUPPORTED_WIN_RATE_MAX * 100.0);
    (start..=end).map(|pct| f64::from(pct) / 100.0).collect()
}

/// Run one batch per entry of `win_rates`, reusing everything else from `template`.
///
/// # Errors
///
/// Stops at the first batch that fails and returns its error.
pub fn sweep(
    ladder: &RankLadder,
    win_rates: &[f64],
    template: &BatchConfig,
) -> Result<Vec<SweepPoint>, BatchError> {
    sweep_with_progress(ladder, win_rates, template, &|_| {})
}

/// Like [`sweep`], reporting every finished season of every batch.
///
/// # Errors
///
/// Stops at the first batch that fails and returns its error.
pub fn sweep_with_progress<F>(
    ladder: &RankLadder,
    win_rates: &[f64],
    template: &BatchConfig,
    progress: &F,
) -> Result<Vec<SweepPoint>, BatchError>
where
    F: Fn(SweepProgress) + Sync,
{
    let compare_to_reference = template.starting_points == 0 && *ladder == RankLadder::builtin();
    let points = win_rates.len();
    win_rates
        .iter()
        .enumerate()
        .map(|(point, &win_rate)| {
            let config = template.with_win_rate(win_rate);
            let result = run_batch_with_progress(ladder, &config, &|batch| {
                progress(SweepProgress {
                    point,
                    points,
                    batch,
                });
            })?;
            let point = SweepPoint {
                win_rate,
                seasons: result.seasons_completed(),
                excluded: result.excluded.len(),
                mean_total_games: result.mean_total_games,
                reference_mean: if compare_to_reference {
                    reference_mean_games(win_rate)
                } else {
                    None
                },
            };
            info!(
                "sweep point {:.2}: mean {:.1} games over {} seasons",
                point.win_rate, point.mean_total_games, point.seasons
            );
            Ok(point)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchConfigError;
    use std::sync::Mutex;

    #[test]
    fn default_rates_are_exact_hundredths() {
        let rates = default_sweep_win_rates();
        assert_eq!(rates.len(), 41);
        assert!((rates[0] - 0.40).abs() < f64::EPSILON);
        assert!((rates[40] - 0.80).abs() < f64::EPSILON);
        assert_eq!(rates[20], 0.6);
        assert_eq!(rates[13], 0.53);
    }

    #[test]
    fn sweep_returns_one_point_per_rate_in_order() {
        let ladder = RankLadder::builtin();
        let template = BatchConfig::new(0.5, 0, 77).with_seasons(60);
        let points = sweep(&ladder, &[0.55, 0.7, 0.8], &template).unwrap();
        let rates: Vec<f64> = points.iter().map(|p| p.win_rate).collect();
        assert_eq!(rates, [0.55, 0.7, 0.8]);
        assert!(points.iter().all(|p| p.seasons == 60 && p.excluded == 0));
        assert!(points[0].mean_total_games > points[2].mean_total_games);
        assert_eq!(points[1].reference_mean, Some(162.673));
        assert!(points[2].reference_deviation().unwrap().abs() < 0.25);
    }

    #[test]
    fn progress_spans_every_batch_of_the_sweep() {
        let ladder = RankLadder::builtin();
        let template = BatchConfig::new(0.5, 0, 9)
            .with_seasons(10)
            .with_parallel(false);
        let seen = Mutex::new(Vec::new());
        let points = sweep_with_progress(&ladder, &[0.6, 0.75], &template, &|p: SweepProgress| {
            seen.lock().unwrap().push(p);
        })
        .unwrap();
        assert_eq!(points.len(), 2);
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 20);
        assert!(seen.iter().all(|p| p.points == 2 && p.batch.total == 10));
        assert!(seen[..10].iter().all(|p| p.point == 0));
        assert!(seen[10..].iter().all(|p| p.point == 1));
        assert!((seen[9].fraction() - 0.5).abs() < f64::EPSILON);
        assert!((seen[19].fraction() - 1.0).abs() < f64::EPSILON);
        let fractions: Vec<f64> = seen.iter().map(SweepProgress::fraction).collect();
        assert!(fractions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn reference_is_omitted_for_other_starting_points() {
        let ladder = RankLadder::builtin();
        let template = BatchConfig::new(0.5, 500, 1).with_seasons(10);
        let points = sweep(&ladder, &[0.7], &template).unwrap();
        assert_eq!(points[0].reference_mean, None);
        assert_eq!(points[0].reference_deviation(), None);
    }

    #[test]
    fn sweep_propagates_invalid_rates() {
        let ladder = RankLadder::builtin();
        let template = BatchConfig::new(0.5, 0, 1).with_seasons(5);
        let err = sweep(&ladder, &[0.7, 1.5], &template).unwrap_err();
        assert!(matches!(
            err,
            BatchError::Config(BatchConfigError::InvalidWinRate { .. })
        ));
    }
}
