use anyhow::{Context, Result, anyhow};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use live_odds::config::{EngineConfig, validate_minute};
use live_odds::forecast::{GoalForecast, forecast_next_goals};
use live_odds::match_state::{GoalEvent, MatchState, Side};
use live_odds::odds::{OddsSnapshot, compute_odds};

#[derive(Debug, Serialize)]
struct Quote<'a> {
    minute: f64,
    score_home: u32,
    score_away: u32,
    goals: &'a [GoalEvent],
    snapshot: OddsSnapshot,
    forecast: GoalForecast,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if has_flag(&args, "--help") {
        print_usage();
        return Ok(());
    }

    let mut config = EngineConfig::from_env();
    if let Some(seed) = parse_value(&args, "--seed") {
        config.seed = Some(seed.parse::<u64>().context("--seed expects an integer")?);
    }

    let minute = parse_value(&args, "--minute").context("--minute is required")?;
    let minute = validate_minute(minute.parse::<f64>().context("--minute expects a number")?)?;

    let mut state = MatchState::new();
    for raw in parse_values(&args, "--goal") {
        let (goal_minute, side) = parse_goal(raw)?;
        state.add_goal(goal_minute, side);
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let snapshot = compute_odds(&config.params, &state, minute, config.max_goals);
    let forecast = forecast_next_goals(&config.params, &state, minute, config.trials, &mut rng);

    let (score_home, score_away) = state.scoreline();
    if has_flag(&args, "--json") {
        let quote = Quote {
            minute,
            score_home,
            score_away,
            goals: state.events(),
            snapshot,
            forecast,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&quote).context("serialize quote")?
        );
        return Ok(());
    }

    println!("Minute: {minute:.0}'  Score: {score_home}-{score_away}");
    println!(
        "1: {:>6.2}  ({:.1}%)",
        snapshot.odds.home,
        snapshot.probs.home * 100.0
    );
    println!(
        "X: {:>6.2}  ({:.1}%)",
        snapshot.odds.draw,
        snapshot.probs.draw * 100.0
    );
    println!(
        "2: {:>6.2}  ({:.1}%)",
        snapshot.odds.away,
        snapshot.probs.away * 100.0
    );
    println!(
        "Rates: home {:.3}  away {:.3}",
        snapshot.rates.home, snapshot.rates.away
    );
    println!("Next goals home: {}", format_minutes(&forecast.home));
    println!("Next goals away: {}", format_minutes(&forecast.away));

    Ok(())
}

fn parse_goal(raw: &str) -> Result<(f64, Side)> {
    let (minute, side) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("goal {raw:?} must look like MINUTE:SIDE, e.g. 23:H"))?;
    let minute = minute
        .trim()
        .parse::<f64>()
        .with_context(|| format!("goal minute in {raw:?}"))?;
    let minute = validate_minute(minute)?;
    let side = side.parse::<Side>()?;
    Ok((minute, side))
}

fn format_minutes(minutes: &[f64]) -> String {
    if minutes.is_empty() {
        return "-".to_string();
    }
    minutes
        .iter()
        .map(|m| format!("{m:.0}'"))
        .collect::<Vec<_>>()
        .join(" / ")
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn parse_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    parse_values(args, name).into_iter().last()
}

fn parse_values<'a>(args: &'a [String], name: &str) -> Vec<&'a str> {
    let prefix = format!("{name}=");
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == name {
            if let Some(val) = iter.next() {
                out.push(val.as_str());
            }
        } else if let Some(val) = arg.strip_prefix(&prefix) {
            out.push(val);
        }
    }
    out
}

fn print_usage() {
    println!("usage: quote --minute M [--goal MIN:SIDE ...] [--seed N] [--json]");
    println!("  SIDE is H/home or A/away; minutes must lie in 0..=90");
}
