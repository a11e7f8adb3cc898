//! Summary statistics over simulated game counts.
use serde::Serialize;

use crate::numbers::u64_to_f64;

/// Welford accumulator for mean and variance.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        let count = u64_to_f64(self.count);
        let delta = value - self.mean;
        self.mean += delta / count;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub const fn mean(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.mean }
    }

    /// Sample variance.
    #[must_use]
    pub fn variance(&self) -> f64 {
        if self.count > 1 {
            self.m2 / u64_to_f64(self.count - 1)
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::default();
        for value in iter {
            stats.add(value);
        }
        stats
    }
}

/// Nearest-rank percentiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Percentiles {
    pub p10: u32,
    pub p25: u32,
    pub p50: u32,
    pub p75: u32,
    pub p90: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: u32,
    pub max: u32,
    pub percentiles: Percentiles,
}

impl Distribution {
    /// Summarize a sample; `None` when it is empty.
    #[must_use]
    pub fn from_values(values: &[u32]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        let stats: RunningStats = sorted.iter().map(|&v| f64::from(v)).collect();
        Some(Self {
            count: sorted.len(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            percentiles: Percentiles {
                p10: nearest_rank(&sorted, 10),
                p25: nearest_rank(&sorted, 25),
                p50: nearest_rank(&sorted, 50),
                p75: nearest_rank(&sorted, 75),
                p90: nearest_rank(&sorted, 90),
            },
        })
    }
}

fn nearest_rank(sorted: &[u32], pct: usize) -> u32 {
    let rank = (pct * sorted.len()).div_ceil(100).max(1);
    sorted[rank.min(sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_stats_matches_direct_formulas() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats: RunningStats = values.iter().copied().collect();
        assert_eq!(stats.count(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        assert!((stats.variance() - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn empty_and_single_samples_are_safe() {
        let empty = RunningStats::default();
        assert!(empty.mean().abs() < f64::EPSILON);
        assert!(empty.std_dev().abs() < f64::EPSILON);
        assert!(Distribution::from_values(&[]).is_none());

        let single = Distribution::from_values(&[68]).unwrap();
        assert_eq!(single.min, 68);
        assert_eq!(single.max, 68);
        assert_eq!(single.percentiles.p10, 68);
        assert_eq!(single.percentiles.p90, 68);
        assert!(single.std_dev.abs() < f64::EPSILON);
    }

    #[test]
    fn percentiles_use_nearest_rank() {
        let values: Vec<u32> = (1..=100).rev().collect();
        let dist = Distribution::from_values(&values).unwrap();
        assert_eq!(dist.min, 1);
        assert_eq!(dist.max, 100);
        assert_eq!(
            dist.percentiles,
            Percentiles {
                p10: 10,
                p25: 25,
                p50: 50,
                p75: 75,
                p90: 90
            }
        );
        assert!((dist.mean - 50.5).abs() < 1e-9);
    }
}
