use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use ranksim_game::{
    GameOutcome, LadderConfig, RankLadder, SeasonParams, SeasonState, major_tier_name,
    season_rng, simulate_season,
};

const SEASONS_PER_CASE: u64 = 40;

#[test]
fn games_and_streaks_follow_every_outcome() {
    let ladder = RankLadder::builtin();
    let max_bonus = ladder.streak_bonus(ladder.max_streak());
    for seed in 0..SEASONS_PER_CASE {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut state = SeasonState::new(&ladder, 0);
        let mut previous_streak = 0;
        while !state.is_complete(&ladder) {
            let won = rng.r#gen::<f64>() <= 0.52;
            let games_before = state.games();
            match state.play_game(&ladder, won) {
                GameOutcome::Win { awarded, streak } => {
                    assert_eq!(streak, previous_streak + 1);
                    assert!(awarded <= ladder.win_points() + max_bonus);
                    assert!(awarded >= ladder.win_points());
                }
                GameOutcome::Loss { penalty, .. } => {
                    assert_eq!(state.streak(), 0);
                    assert!(penalty <= 0);
                }
            }
            assert_eq!(state.games(), games_before + 1);
            previous_streak = state.streak();
        }
    }
}

#[test]
fn streak_bonus_is_capped_at_longest_entry() {
    let ladder = RankLadder::builtin();
    assert_eq!(ladder.streak_bonus(5), 12);
    for streak in [6, 10, 100, u32::MAX] {
        assert_eq!(ladder.streak_bonus(streak), 12);
        assert_eq!(ladder.win_award(streak), 22);
    }
}

#[test]
fn rank_lookup_is_monotone_and_idempotent() {
    let ladder = RankLadder::builtin();
    let mut previous = 0;
    for points in -50..=1600 {
        let idx = ladder.rank_index_for(points);
        assert!(idx >= previous, "rank fell at {points}");
        previous = idx;
        let rank = ladder.rank_for(points);
        assert_eq!(ladder.rank_for(points), rank);
        assert!(rank.threshold <= points.max(0));
        assert_eq!(ladder.tier_name(rank.tier), major_tier_name(&rank.name));
    }
}

#[test]
fn milestones_respect_ladder_order() {
    let ladder = RankLadder::builtin();
    for index in 0..SEASONS_PER_CASE {
        let mut rng = season_rng(2024, u32::try_from(index).expect("index fits"));
        let result =
            simulate_season(&ladder, &SeasonParams::new(0.6, 0), &mut rng).expect("terminates");
        let reached: Vec<u32> = result.tier_games.iter().map(|(_, games)| games).collect();
        assert_eq!(reached.len(), ladder.tiers().len() - 1);
        assert!(
            reached.windows(2).all(|pair| pair[0] < pair[1]),
            "tiers out of order: {reached:?}"
        );
        assert_eq!(reached.last().copied(), Some(result.total_games));
    }
}

#[test]
fn custom_ladder_seasons_end_at_its_terminal_rank() {
    let json = r#"{
        "win_points": 5,
        "ranks": [
            {"name": "Bronze 1", "threshold": 0},
            {"name": "Bronze 2", "threshold": 20},
            {"name": "Silver 1", "threshold": 50},
            {"name": "Gold 1", "threshold": 100}
        ],
        "streak_bonus": [{"wins": 1, "bonus": 0}, {"wins": 2, "bonus": 5}],
        "loss_penalty": [
            {"tier": "Bronze", "points": 0},
            {"tier": "Silver", "points": -5},
            {"tier": "Gold", "points": -5}
        ]
    }"#;
    let ladder = LadderConfig::from_json_str(json)
        .unwrap()
        .compile()
        .unwrap();
    assert_eq!(ladder.tiers(), ["Bronze", "Silver", "Gold"]);

    let mut rng = SmallRng::seed_from_u64(17);
    let perfect = simulate_season(&ladder, &SeasonParams::new(1.0, 0), &mut rng).unwrap();
    // 5, 15, 25, ... reaches 100 on the eleventh win.
    assert_eq!(perfect.total_games, 11);
    assert_eq!(perfect.final_points, 105);

    for _ in 0..SEASONS_PER_CASE {
        let result = simulate_season(&ladder, &SeasonParams::new(0.55, 0), &mut rng).unwrap();
        assert!(result.final_points >= 100);
    }
}
