use std::collections::VecDeque;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::config::{self, EngineConfig, MATCH_MINUTES};
use crate::forecast::{self, GoalForecast};
use crate::match_state::{GoalEvent, MatchState, Side};
use crate::odds::{self, OddsSnapshot};

const MAX_LOGS: usize = 200;
const LAST_MINUTE: u16 = MATCH_MINUTES as u16;

/// Everything one viewer of a match needs. Hosts keep one of these per user session.
pub struct MatchSession {
    config: EngineConfig,
    state: MatchState,
    minute: u16,
    rng: StdRng,
    pub logs: VecDeque<String>,
}

impl MatchSession {
    pub fn new(config: EngineConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    pub fn with_rng(config: EngineConfig, rng: StdRng) -> Self {
        Self {
            config,
            state: MatchState::new(),
            minute: 0,
            rng,
            logs: VecDeque::with_capacity(MAX_LOGS),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn minute(&self) -> u16 {
        self.minute
    }

    pub fn set_minute(&mut self, minute: u16) {
        self.minute = minute.min(LAST_MINUTE);
    }

    pub fn step_minute(&mut self, delta: i32) {
        let next = (self.minute as i32 + delta).clamp(0, LAST_MINUTE as i32);
        self.minute = next as u16;
    }

    pub fn remaining_minutes(&self) -> u16 {
        LAST_MINUTE - self.minute
    }

    /// Analysis is only meaningful once the clock has moved.
    pub fn has_started(&self) -> bool {
        self.minute > 0
    }

    pub fn add_goal(&mut self, minute: f64, side: Side) {
        self.state.add_goal(minute, side);
        let (home, away) = self.state.scoreline();
        self.push_log(format!(
            "[INFO] Goal {side} at {minute:.0}' ({home}-{away})"
        ));
    }

    /// Records a goal at the current clock minute.
    pub fn add_goal_now(&mut self, side: Side) {
        self.add_goal(self.minute as f64, side);
    }

    /// Records a goal at a typed minute, or at the clock minute when `minute_input` is blank.
    /// Rejected input is logged as a warning and nothing is recorded.
    pub fn record_goal(&mut self, minute_input: &str, side: Side) -> Result<f64> {
        let minute = if minute_input.trim().is_empty() {
            Ok(self.minute as f64)
        } else {
            parse_goal_minute(minute_input)
        };
        match minute {
            Ok(minute) => {
                self.add_goal(minute, side);
                Ok(minute)
            }
            Err(err) => {
                self.push_log(format!("[WARN] Goal not recorded: {err:#}"));
                Err(err)
            }
        }
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.minute = 0;
        self.push_log("[INFO] Match reset");
    }

    pub fn scoreline(&self) -> (u32, u32) {
        self.state.scoreline()
    }

    pub fn leader(&self) -> Option<Side> {
        self.state.leader()
    }

    pub fn events(&self) -> &[GoalEvent] {
        self.state.events()
    }

    pub fn odds(&self) -> OddsSnapshot {
        odds::compute_odds(
            &self.config.params,
            &self.state,
            self.minute as f64,
            self.config.max_goals,
        )
    }

    pub fn forecast(&mut self) -> GoalForecast {
        forecast::forecast_next_goals(
            &self.config.params,
            &self.state,
            self.minute as f64,
            self.config.trials,
            &mut self.rng,
        )
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.logs.push_back(format!("{stamp} {}", msg.into()));
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

/// Goal minute typed by the user, checked against 0..=90.
pub fn parse_goal_minute(raw: &str) -> Result<f64> {
    let minute = raw
        .trim()
        .parse::<f64>()
        .with_context(|| format!("goal minute {:?} is not a number", raw.trim()))?;
    config::validate_minute(minute)
}

pub fn result_label(leader: Option<Side>) -> &'static str {
    match leader {
        Some(Side::Home) => "Home winning",
        Some(Side::Away) => "Away winning",
        None => "Level",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MatchSession {
        MatchSession::with_rng(EngineConfig::default(), StdRng::seed_from_u64(9))
    }

    #[test]
    fn minute_is_clamped_to_match_length() {
        let mut session = seeded();
        session.step_minute(-3);
        assert_eq!(session.minute(), 0);
        session.step_minute(200);
        assert_eq!(session.minute(), 90);
        session.set_minute(120);
        assert_eq!(session.minute(), 90);
        assert_eq!(session.remaining_minutes(), 0);
    }

    #[test]
    fn goals_are_logged_with_scoreline() {
        let mut session = seeded();
        session.set_minute(23);
        session.add_goal_now(Side::Home);
        assert_eq!(session.scoreline(), (1, 0));
        let last = session.logs.back().unwrap();
        assert!(last.ends_with("[INFO] Goal HOME at 23' (1-0)"), "{last}");
    }

    #[test]
    fn typed_goal_minute_is_independent_of_clock() {
        let mut session = seeded();
        session.set_minute(10);
        assert_eq!(session.record_goal("67", Side::Away).unwrap(), 67.0);
        assert_eq!(session.minute(), 10);
        assert_eq!(session.state().goal_minutes(Side::Away), vec![67.0]);
        assert!(session.logs.back().unwrap().ends_with("Goal AWAY at 67' (0-1)"));
    }

    #[test]
    fn blank_goal_minute_uses_clock_even_at_kickoff() {
        let mut session = seeded();
        assert_eq!(session.record_goal("", Side::Home).unwrap(), 0.0);
        session.set_minute(41);
        assert_eq!(session.record_goal("  ", Side::Home).unwrap(), 41.0);
        assert_eq!(session.scoreline(), (2, 0));
    }

    #[test]
    fn bad_goal_minute_is_warned_and_skipped() {
        let mut session = seeded();
        assert!(session.record_goal("95", Side::Home).is_err());
        assert!(session.record_goal("x", Side::Away).is_err());
        assert!(session.events().is_empty());
        assert!(session.logs.back().unwrap().contains("[WARN] Goal not recorded"));
    }

    #[test]
    fn parse_goal_minute_bounds() {
        assert_eq!(parse_goal_minute(" 0 ").unwrap(), 0.0);
        assert_eq!(parse_goal_minute("90").unwrap(), 90.0);
        assert!(parse_goal_minute("91").is_err());
        assert!(parse_goal_minute("-1").is_err());
        assert!(parse_goal_minute("NaN").is_err());
    }

    #[test]
    fn reset_clears_goals_and_clock() {
        let mut session = seeded();
        session.set_minute(60);
        session.add_goal(12.0, Side::Away);
        session.reset();
        assert!(session.events().is_empty());
        assert_eq!(session.minute(), 0);
        assert!(!session.has_started());
        assert!(session.logs.back().unwrap().ends_with("Match reset"));
    }

    #[test]
    fn log_is_bounded() {
        let mut session = seeded();
        for i in 0..(MAX_LOGS + 25) {
            session.push_log(format!("[INFO] line {i}"));
        }
        assert_eq!(session.logs.len(), MAX_LOGS);
        assert!(session.logs.back().unwrap().ends_with(&format!("line {}", MAX_LOGS + 24)));
    }

    #[test]
    fn seeded_sessions_forecast_identically() {
        let cfg = EngineConfig {
            seed: Some(77),
            ..EngineConfig::default()
        };
        let mut a = MatchSession::new(cfg.clone());
        let mut b = MatchSession::new(cfg);
        a.set_minute(50);
        b.set_minute(50);
        assert_eq!(a.forecast(), b.forecast());
    }

    #[test]
    fn result_labels() {
        assert_eq!(result_label(None), "Level");
        assert_eq!(result_label(Some(Side::Away)), "Away winning");
    }
}
