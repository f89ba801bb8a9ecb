use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

pub const MATCH_MINUTES: f64 = 90.0;

const DEFAULT_MAX_GOALS: u32 = 9;
const DEFAULT_TRIALS: usize = 1000;

/// Ceiling for any full-match rate setting. Simulation work grows with trials times rate.
pub const MAX_RATE: f64 = 20.0;

/// Scoring-rate constants for a full match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub base_home_rate: f64,
    pub base_away_rate: f64,
    pub home_advantage: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            base_home_rate: 1.5,
            base_away_rate: 1.2,
            home_advantage: 0.3,
        }
    }
}

impl ModelParams {
    /// Home and away roles exchanged, with the advantage folded into the away base.
    pub fn mirrored(&self) -> Self {
        Self {
            base_home_rate: self.base_away_rate,
            base_away_rate: self.base_home_rate + self.home_advantage,
            home_advantage: 0.0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("base_home_rate", self.base_home_rate),
            ("base_away_rate", self.base_away_rate),
            ("home_advantage", self.home_advantage),
        ];
        for (name, v) in fields {
            if !rate_in_range(v) {
                return Err(anyhow!("{name} = {v} must be finite and within 0..={MAX_RATE}"));
            }
        }
        Ok(())
    }
}

fn rate_in_range(v: f64) -> bool {
    v.is_finite() && (0.0..=MAX_RATE).contains(&v)
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub params: ModelParams,
    /// Highest number of further goals per side enumerated by the scoreline sum.
    pub max_goals: u32,
    pub trials: usize,
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            params: ModelParams::default(),
            max_goals: DEFAULT_MAX_GOALS,
            trials: DEFAULT_TRIALS,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut params = match env::var("LIVE_ODDS_PARAMS_FILE") {
            Ok(path) if !path.trim().is_empty() => {
                load_params_file(Path::new(path.trim())).unwrap_or_else(|err| {
                    tracing::warn!("ignoring params file: {err:#}");
                    ModelParams::default()
                })
            }
            _ => ModelParams::default(),
        };

        if let Some(v) = env_f64("LIVE_ODDS_BASE_HOME_RATE") {
            params.base_home_rate = v;
        }
        if let Some(v) = env_f64("LIVE_ODDS_BASE_AWAY_RATE") {
            params.base_away_rate = v;
        }
        if let Some(v) = env_f64("LIVE_ODDS_HOME_ADVANTAGE") {
            params.home_advantage = v;
        }

        let max_goals = env::var("LIVE_ODDS_MAX_GOALS")
            .ok()
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_GOALS)
            .clamp(1, 30);
        let trials = env::var("LIVE_ODDS_TRIALS")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_TRIALS)
            .clamp(1, 100_000);
        let seed = env::var("LIVE_ODDS_SEED")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok());

        Self {
            params,
            max_goals,
            trials,
            seed,
        }
    }
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<f64>().ok())
        .filter(|v| rate_in_range(*v))
}

pub fn load_params_file(path: &Path) -> Result<ModelParams> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read params file {}", path.display()))?;
    let params: ModelParams =
        serde_json::from_str(&raw).context("parse model params json")?;
    params
        .validate()
        .with_context(|| format!("invalid params file {}", path.display()))?;
    Ok(params)
}

/// Strict check for minutes arriving from user input. The engine itself accepts any value.
pub fn validate_minute(minute: f64) -> Result<f64> {
    if !minute.is_finite() || !(0.0..=MATCH_MINUTES).contains(&minute) {
        return Err(anyhow!(
            "InvalidMinute: {minute} is outside 0..={MATCH_MINUTES}"
        ));
    }
    Ok(minute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_model_constants() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.params.base_home_rate, 1.5);
        assert_eq!(cfg.params.base_away_rate, 1.2);
        assert_eq!(cfg.params.home_advantage, 0.3);
        assert_eq!(cfg.max_goals, 9);
        assert_eq!(cfg.trials, 1000);
        assert!(cfg.seed.is_none());
    }

    #[test]
    fn validate_minute_rejects_out_of_range() {
        assert_eq!(validate_minute(0.0).unwrap(), 0.0);
        assert_eq!(validate_minute(90.0).unwrap(), 90.0);
        assert!(validate_minute(-1.0).is_err());
        assert!(validate_minute(90.5).is_err());
        assert!(validate_minute(f64::NAN).is_err());
    }

    #[test]
    fn params_file_round_trips_through_json() {
        let path = env::temp_dir().join(format!("live_odds_params_{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"base_home_rate":1.7,"base_away_rate":1.1,"home_advantage":0.2}"#,
        )
        .unwrap();
        let params = load_params_file(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(params.base_home_rate, 1.7);
        assert_eq!(params.base_away_rate, 1.1);
        assert_eq!(params.home_advantage, 0.2);
    }

    #[test]
    fn params_file_rejects_negative_rates() {
        let path = env::temp_dir().join(format!("live_odds_bad_{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"base_home_rate":-1.0,"base_away_rate":1.1,"home_advantage":0.2}"#,
        )
        .unwrap();
        let res = load_params_file(&path);
        let _ = fs::remove_file(&path);
        assert!(res.is_err());
    }

    #[test]
    fn params_file_rejects_oversized_rates() {
        let path = env::temp_dir().join(format!("live_odds_huge_{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"base_home_rate":1e9,"base_away_rate":1.1,"home_advantage":0.2}"#,
        )
        .unwrap();
        let res = load_params_file(&path);
        let _ = fs::remove_file(&path);
        assert!(res.is_err());
    }

    #[test]
    fn validate_bounds_each_rate() {
        assert!(ModelParams::default().validate().is_ok());
        let edge = ModelParams {
            base_home_rate: MAX_RATE,
            base_away_rate: 0.0,
            home_advantage: 0.0,
        };
        assert!(edge.validate().is_ok());
        let over = ModelParams {
            home_advantage: MAX_RATE + 0.1,
            ..ModelParams::default()
        };
        assert!(over.validate().is_err());
        let nan = ModelParams {
            base_away_rate: f64::NAN,
            ..ModelParams::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn mirrored_swaps_roles() {
        let m = ModelParams::default().mirrored();
        assert_eq!(m.base_home_rate, 1.2);
        assert!((m.base_away_rate - 1.8).abs() < 1e-12);
        assert_eq!(m.home_advantage, 0.0);
    }
}
