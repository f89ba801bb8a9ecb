use serde::Serialize;

use crate::config::{MATCH_MINUTES, ModelParams};
use crate::match_state::{MatchState, Side};

/// Remaining-time floor (in minutes) used when scaling rates at or past full time.
const REMAINING_FLOOR_MINUTES: f64 = 1.0;

const LEADER_DAMPING: f64 = 0.8;
const TRAILER_BOOST: f64 = 1.2;

/// Probabilities at or below this are priced at `FALLBACK_ODDS`.
pub const ODDS_PROB_FLOOR: f64 = 0.01;
pub const FALLBACK_ODDS: f64 = 100.0;

const BOUNDARY_PROBS: Outcome3 = Outcome3 {
    home: 0.33,
    draw: 0.34,
    away: 0.33,
};
const BOUNDARY_ODDS: Outcome3 = Outcome3 {
    home: 1.0,
    draw: 1.0,
    away: 1.0,
};

/// One value per full-time result: home win (1), draw (X), away win (2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Outcome3 {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl Outcome3 {
    pub fn sum(&self) -> f64 {
        self.home + self.draw + self.away
    }
}

/// Expected further goals per side between now and full time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdjustedRates {
    pub home: f64,
    pub away: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OddsSnapshot {
    pub odds: Outcome3,
    pub probs: Outcome3,
    pub rates: AdjustedRates,
}

/// Time-decayed rates with a single scoreline momentum step.
pub fn adjusted_rates(params: &ModelParams, state: &MatchState, minute_now: f64) -> AdjustedRates {
    let remaining = (MATCH_MINUTES - minute_now).max(REMAINING_FLOOR_MINUTES);
    let time_factor = remaining / MATCH_MINUTES;

    let mut home = (params.base_home_rate + params.home_advantage) * time_factor;
    let mut away = params.base_away_rate * time_factor;

    // Leading side eases off, trailing side presses.
    match state.leader() {
        Some(Side::Home) => {
            home *= LEADER_DAMPING;
            away *= TRAILER_BOOST;
        }
        Some(Side::Away) => {
            home *= TRAILER_BOOST;
            away *= LEADER_DAMPING;
        }
        None => {}
    }

    AdjustedRates { home, away }
}

pub fn compute_odds(
    params: &ModelParams,
    state: &MatchState,
    minute_now: f64,
    max_goals: u32,
) -> OddsSnapshot {
    let rates = adjusted_rates(params, state, minute_now);

    // Pre-match and full time carry nothing to condition on.
    if minute_now <= 0.0 || minute_now >= MATCH_MINUTES {
        return OddsSnapshot {
            odds: BOUNDARY_ODDS,
            probs: BOUNDARY_PROBS,
            rates,
        };
    }

    let probs = outcome_probs_poisson(
        state.home_goals(),
        state.away_goals(),
        rates.home,
        rates.away,
        max_goals,
    );
    tracing::debug!(
        minute_now,
        rate_home = rates.home,
        rate_away = rates.away,
        p_home = probs.home,
        p_draw = probs.draw,
        p_away = probs.away,
        "computed live odds"
    );

    OddsSnapshot {
        odds: Outcome3 {
            home: decimal_odds(probs.home),
            draw: decimal_odds(probs.draw),
            away: decimal_odds(probs.away),
        },
        probs,
        rates,
    }
}

pub fn decimal_odds(prob: f64) -> f64 {
    if prob > ODDS_PROB_FLOOR {
        1.0 / prob
    } else {
        FALLBACK_ODDS
    }
}

pub fn outcome_probs_poisson(
    goals_home: u32,
    goals_away: u32,
    lambda_home_rem: f64,
    lambda_away_rem: f64,
    max_goals: u32,
) -> Outcome3 {
    let pmf_h = poisson_pmf(lambda_home_rem, max_goals);
    let pmf_a = poisson_pmf(lambda_away_rem, max_goals);

    let mut p_home = 0.0;
    let mut p_draw = 0.0;
    let mut p_away = 0.0;

    for (i, p_i) in pmf_h.iter().enumerate() {
        for (j, p_j) in pmf_a.iter().enumerate() {
            let p = p_i * p_j;
            let fh = goals_home + i as u32;
            let fa = goals_away + j as u32;
            if fh > fa {
                p_home += p;
            } else if fh < fa {
                p_away += p;
            } else {
                p_draw += p;
            }
        }
    }

    // Rescale away the mass lost past `max_goals`; a non-positive total is left as is.
    let sum = p_home + p_draw + p_away;
    if sum > 0.0 {
        Outcome3 {
            home: p_home / sum,
            draw: p_draw / sum,
            away: p_away / sum,
        }
    } else {
        Outcome3 {
            home: p_home,
            draw: p_draw,
            away: p_away,
        }
    }
}

/// P(k) for k in 0..=max_k. The tail beyond `max_k` is dropped, not folded in.
pub fn poisson_pmf(lambda: f64, max_k: u32) -> Vec<f64> {
    let max_k = max_k as usize;
    let mut out = vec![0.0; max_k + 1];
    let lambda = lambda.max(0.0);

    out[0] = (-lambda).exp();
    for k in 1..=max_k {
        out[k] = out[k - 1] * lambda / k as f64;
    }
    out
}
