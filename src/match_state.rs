use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Home => "HOME",
            Side::Away => "AWAY",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Side {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "h" | "home" | "1" => Ok(Side::Home),
            "a" | "away" | "2" => Ok(Side::Away),
            other => Err(anyhow!("unknown side {other:?} (expected home/away)")),
        }
    }
}

/// A recorded goal. Minutes are kept as given; range checks belong to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalEvent {
    pub minute: f64,
    pub side: Side,
}

/// Append-only goal log with scoreline counts kept in step with the events.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchState {
    events: Vec<GoalEvent>,
    home_goals: u32,
    away_goals: u32,
}

impl MatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_goal(&mut self, minute: f64, side: Side) {
        self.events.push(GoalEvent { minute, side });
        match side {
            Side::Home => self.home_goals += 1,
            Side::Away => self.away_goals += 1,
        }
    }

    pub fn reset(&mut self) {
        self.events.clear();
        self.home_goals = 0;
        self.away_goals = 0;
    }

    pub fn goal_count(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home_goals,
            Side::Away => self.away_goals,
        }
    }

    pub fn home_goals(&self) -> u32 {
        self.home_goals
    }

    pub fn away_goals(&self) -> u32 {
        self.away_goals
    }

    pub fn scoreline(&self) -> (u32, u32) {
        (self.home_goals, self.away_goals)
    }

    /// Side currently ahead, `None` when level.
    pub fn leader(&self) -> Option<Side> {
        if self.home_goals > self.away_goals {
            Some(Side::Home)
        } else if self.away_goals > self.home_goals {
            Some(Side::Away)
        } else {
            None
        }
    }

    /// Goals in the order they were recorded.
    pub fn events(&self) -> &[GoalEvent] {
        &self.events
    }

    /// Minutes of one side's goals, in recording order.
    pub fn goal_minutes(&self, side: Side) -> Vec<f64> {
        self.events
            .iter()
            .filter(|e| e.side == side)
            .map(|e| e.minute)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
