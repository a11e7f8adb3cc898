use ranksim_game::{
    BatchConfig, BatchError, RankLadder, reference_mean_games, run_batch, season_count_for_win_rate,
};

const SAMPLE_SIZE: u32 = 2000;
const TOLERANCE: f64 = 0.05;
const SEED: u64 = 0x5EA5_0001;

fn assert_near_reference(win_rate: f64, seasons: u32) {
    let ladder = RankLadder::builtin();
    let config = BatchConfig::new(win_rate, 0, SEED).with_seasons(seasons);
    let result = run_batch(&ladder, &config).expect("batch completes");
    let reference = reference_mean_games(win_rate).expect("reference exists");
    let drift = (result.mean_total_games - reference).abs() / reference;
    assert!(
        drift <= TOLERANCE,
        "mean drifted at {win_rate}: observed {:.2}, reference {reference}",
        result.mean_total_games
    );
}

#[test]
fn sixty_percent_matches_reference_mean() {
    assert_near_reference(0.6, SAMPLE_SIZE);
}

#[test]
fn fifty_percent_matches_reference_mean() {
    assert_near_reference(0.5, SAMPLE_SIZE);
}

#[test]
fn eighty_percent_matches_reference_mean() {
    assert_near_reference(0.8, SAMPLE_SIZE);
}

#[test]
fn observed_win_rate_tracks_configured_rate() {
    let ladder = RankLadder::builtin();
    let config = BatchConfig::new(0.6, 0, SEED).with_seasons(500);
    let result = run_batch(&ladder, &config).unwrap();
    assert!(
        (result.mean_observed_win_rate - 0.6).abs() <= 0.03,
        "observed {:.4}",
        result.mean_observed_win_rate
    );
}

#[test]
fn perfect_record_batch_is_exactly_68_games() {
    let ladder = RankLadder::builtin();
    let result = run_batch(&ladder, &BatchConfig::new(1.0, 0, SEED).with_seasons(50)).unwrap();
    assert!((result.mean_total_games - 68.0).abs() < f64::EPSILON);
    assert_eq!(result.total_games.min, 68);
    assert_eq!(result.total_games.max, 68);
    assert_eq!(
        result.table.columns(),
        ["Poké Ball", "Great Ball", "Ultra Ball", "Master Ball"]
    );
    for summary in result.tier_summaries() {
        let dist = summary.distribution.expect("every season reaches every tier");
        assert_eq!(dist.min, dist.max, "{} varies", summary.tier);
    }
}

#[test]
fn unwinnable_batch_reports_no_completed_seasons() {
    let ladder = RankLadder::builtin();
    let config = BatchConfig::new(1e-9, 0, SEED)
        .with_seasons(8)
        .with_max_games(500);
    let err = run_batch(&ladder, &config).unwrap_err();
    assert!(matches!(err, BatchError::NoSeasonsCompleted { excluded: 8 }));
}

#[test]
fn reference_sample_size_rule_is_applied_by_default() {
    let config = BatchConfig::new(0.44, 0, SEED);
    assert_eq!(config.season_count(), season_count_for_win_rate(0.44));
    assert_eq!(config.season_count(), 2_512);
}
