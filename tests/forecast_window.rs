use rand::SeedableRng;
use rand::rngs::StdRng;

use live_odds::config::ModelParams;
use live_odds::forecast::forecast_next_goals;
use live_odds::match_state::{MatchState, Side};

#[test]
fn late_forecast_stays_inside_remaining_window() {
    let params = ModelParams::default();
    let mut state = MatchState::new();
    state.add_goal(33.0, Side::Home);

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let f = forecast_next_goals(&params, &state, 85.0, 1000, &mut rng);
        for minute in f.home.iter().chain(f.away.iter()) {
            assert!(
                *minute > 85.0 && *minute < 90.0,
                "seed {seed}: {minute} outside (85, 90)"
            );
        }
        assert!(f.home.len() == 3 || f.home.is_empty());
        assert!(f.away.len() == 3 || f.away.is_empty());
    }
}

#[test]
fn forecast_is_empty_from_full_time_on() {
    let params = ModelParams::default();
    let mut rng = StdRng::seed_from_u64(1);
    for minute in [90.0, 90.5, 120.0] {
        let f = forecast_next_goals(&params, &MatchState::new(), minute, 1000, &mut rng);
        assert!(f.home.is_empty());
        assert!(f.away.is_empty());
    }
}

#[test]
fn early_median_is_near_middle_of_window() {
    // Arrivals of a homogeneous process are roughly uniform over the window.
    let params = ModelParams::default();
    let mut rng = StdRng::seed_from_u64(2024);
    let f = forecast_next_goals(&params, &MatchState::new(), 10.0, 1000, &mut rng);
    assert_eq!(f.home.len(), 3);
    assert!((f.home[1] - 50.0).abs() < 5.0, "home median {}", f.home[1]);
    assert!((f.home[0] - 30.0).abs() < 5.0, "home p25 {}", f.home[0]);
    assert!((f.home[2] - 70.0).abs() < 5.0, "home p75 {}", f.home[2]);
}

#[test]
fn different_seeds_vary_but_agree_statistically() {
    let params = ModelParams::default();
    let state = MatchState::new();
    let a = forecast_next_goals(&params, &state, 45.0, 1000, &mut StdRng::seed_from_u64(1));
    let b = forecast_next_goals(&params, &state, 45.0, 1000, &mut StdRng::seed_from_u64(2));
    assert_ne!(a, b);
    assert!((a.away[1] - b.away[1]).abs() < 5.0);
}

#[test]
fn zero_trials_give_no_forecast() {
    let params = ModelParams::default();
    let mut rng = StdRng::seed_from_u64(8);
    let f = forecast_next_goals(&params, &MatchState::new(), 20.0, 0, &mut rng);
    assert!(f.is_empty());
}
