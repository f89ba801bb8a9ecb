use rand::Rng;
use rand::distributions::{Distribution, Open01};
use serde::Serialize;

use crate::config::{MATCH_MINUTES, ModelParams};
use crate::match_state::MatchState;
use crate::odds::adjusted_rates;

/// Percentiles reported as the first, second and third forecast goal minute.
const FORECAST_PERCENTILES: [f64; 3] = [25.0, 50.0, 75.0];

/// Forecast minutes per side, ascending. Empty when the simulation produced no goals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GoalForecast {
    pub home: Vec<f64>,
    pub away: Vec<f64>,
}

impl GoalForecast {
    pub fn is_empty(&self) -> bool {
        self.home.is_empty() && self.away.is_empty()
    }
}

/// Pooled goal-minute percentiles from `trials` simulated matches.
///
/// The window is `minute_now..90`, so a minute far below 0 widens it and the work grows
/// with `trials * rate * window / 90`. Hosts keep minutes within 0..=90. Non-finite minutes
/// and minutes at or past full time give an empty forecast.
pub fn forecast_next_goals<R: Rng + ?Sized>(
    params: &ModelParams,
    state: &MatchState,
    minute_now: f64,
    trials: usize,
    rng: &mut R,
) -> GoalForecast {
    if !minute_now.is_finite() || minute_now >= MATCH_MINUTES {
        return GoalForecast::default();
    }

    let remaining = MATCH_MINUTES - minute_now;
    let rates = adjusted_rates(params, state, minute_now);
    let intensity_home = rates.home / remaining;
    let intensity_away = rates.away / remaining;

    let mut pool_home = Vec::new();
    let mut pool_away = Vec::new();
    for _ in 0..trials {
        simulate_arrivals(intensity_home, remaining, minute_now, rng, &mut pool_home);
        simulate_arrivals(intensity_away, remaining, minute_now, rng, &mut pool_away);
    }
    tracing::trace!(
        minute_now,
        trials,
        home_samples = pool_home.len(),
        away_samples = pool_away.len(),
        "goal time simulation pooled"
    );

    GoalForecast {
        home: pooled_percentiles(pool_home),
        away: pooled_percentiles(pool_away),
    }
}

/// One trial of a Poisson process: pushes every arrival that lands inside the window.
fn simulate_arrivals<R: Rng + ?Sized>(
    intensity: f64,
    window: f64,
    offset: f64,
    rng: &mut R,
    out: &mut Vec<f64>,
) {
    if intensity.is_nan() || intensity <= 0.0 {
        return;
    }
    let mut t = 0.0;
    loop {
        t += exponential_gap(intensity, rng);
        if t >= window {
            break;
        }
        out.push(offset + t);
    }
}

/// Inverse-CDF exponential draw. `Open01` keeps the gap strictly positive and finite.
fn exponential_gap<R: Rng + ?Sized>(intensity: f64, rng: &mut R) -> f64 {
    let u: f64 = Open01.sample(rng);
    -u.ln() / intensity
}

fn pooled_percentiles(mut pool: Vec<f64>) -> Vec<f64> {
    if pool.is_empty() {
        return Vec::new();
    }
    pool.sort_by(|a, b| a.total_cmp(b));
    FORECAST_PERCENTILES
        .iter()
        .map(|q| percentile_sorted(&pool, *q))
        .collect()
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty and ascending.
fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let rank = (q.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
