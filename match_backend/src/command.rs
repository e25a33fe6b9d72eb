//! Transport-agnostic command surface.
//!
//! A command arrives as an action name plus string parameters, is parsed into
//! a `Command` (parse failures become defaults, never errors) and runs against
//! one player's state, producing the common snapshot plus command extras.

use crate::catchup;
use crate::config::{parse_flag, parse_int};
use crate::draw::EntropySource;
use crate::game;
use crate::types::{CatchUpOutcome, CommandReply, GameState, RawConfig, TickOutcome};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Status,
    NewGame(RawConfig),
    SetRate(Option<i64>),
    Start { reset_top3: bool },
    Stop,
    Reset,
    Tick,
    CatchUp { ticks: i64 },
    /// Catch up for time spent away: ticks owed = away_ms * rate / 1000.
    CatchUpElapsed { away_ms: u64 },
    Unknown(String),
}

impl Command {
    pub fn parse(action: &str, params: &[(String, String)]) -> Command {
        let int = |key: &str| param(params, key).and_then(parse_int);

        match action.trim() {
            "" | "status" => Command::Status,
            "new_game" => Command::NewGame(RawConfig {
                count: int("count"),
                min: int("min"),
                max: int("max"),
                rate: int("rate"),
            }),
            "set_rate" => Command::SetRate(int("rate")),
            "start" => Command::Start {
                reset_top3: parse_flag(param(params, "reset_top3"), true),
            },
            "stop" => Command::Stop,
            "reset" => Command::Reset,
            "tick" => Command::Tick,
            "catchup" => Command::CatchUp { ticks: int("ticks").unwrap_or(0) },
            "catchup_elapsed" => Command::CatchUpElapsed {
                away_ms: int("away_ms").unwrap_or(0).max(0) as u64,
            },
            other => Command::Unknown(other.to_string()),
        }
    }

    /// Commands that never change the state and need no write-back.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Command::Status | Command::Unknown(_))
    }

    /// Commands that may consume entropy.
    pub fn draws(&self) -> bool {
        matches!(self, Command::Tick | Command::CatchUp { .. } | Command::CatchUpElapsed { .. })
    }
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

/// Apply `command` to `state` and build the reply.
///
/// Only draw commands can fail, and only when `source` fails.
pub fn execute<E: EntropySource + ?Sized>(
    state: &mut GameState,
    command: &Command,
    source: &mut E,
    now_ms: u64,
) -> Result<CommandReply, String> {
    let extras = match command {
        Command::Status => Extras::None,
        Command::NewGame(raw) => {
            game::new_game(state, raw, now_ms);
            Extras::Started { mode: "new_game", reset_top3_applied: None }
        }
        Command::SetRate(rate) => {
            game::set_rate(state, *rate);
            Extras::RateUpdated
        }
        Command::Start { reset_top3 } => {
            let cleared = game::start(state, *reset_top3, now_ms);
            Extras::Started { mode: "resume", reset_top3_applied: Some(cleared) }
        }
        Command::Stop => {
            game::stop(state, now_ms);
            Extras::Stopped
        }
        Command::Reset => {
            game::reset(state, now_ms);
            Extras::Reset
        }
        Command::Tick => Extras::Tick(game::tick(state, source, now_ms)?),
        Command::CatchUp { ticks } => {
            Extras::CatchUp(catchup::catchup(state, *ticks, source, now_ms)?, None)
        }
        Command::CatchUpElapsed { away_ms } => {
            let owed = catchup::ticks_owed(*away_ms, state.cfg.rate_per_sec);
            let requested = owed.min(i64::MAX as u64) as i64;
            let outcome = catchup::catchup(state, requested, source, now_ms)?;
            let remaining = outcome.as_ref().map(|o| catchup::remaining_after(owed, o));
            Extras::CatchUp(outcome, remaining)
        }
        Command::Unknown(_) => Extras::Error("Unknown action"),
    };

    let reply = CommandReply::from(state.snapshot(now_ms));
    Ok(extras.apply(reply))
}

enum Extras {
    None,
    Started { mode: &'static str, reset_top3_applied: Option<bool> },
    RateUpdated,
    Stopped,
    Reset,
    Tick(Option<TickOutcome>),
    CatchUp(Option<CatchUpOutcome>, Option<u64>),
    Error(&'static str),
}

impl Extras {
    fn apply(self, mut reply: CommandReply) -> CommandReply {
        match self {
            Extras::None => reply,
            Extras::Started { mode, reset_top3_applied } => {
                reply.started = Some(true);
                reply.mode = Some(mode.to_string());
                reply.reset_top3_applied = reset_top3_applied;
                reply
            }
            Extras::RateUpdated => {
                reply.rate_updated = Some(true);
                reply
            }
            Extras::Stopped => {
                reply.stopped = Some(true);
                reply
            }
            Extras::Reset => {
                reply.reset = Some(true);
                reply
            }
            Extras::Tick(outcome) => reply.with_tick(outcome),
            Extras::CatchUp(outcome, remaining) => {
                let mut reply = reply.with_catchup(outcome);
                reply.remaining = remaining;
                reply
            }
            Extras::Error(msg) => {
                reply.error = Some(msg.to_string());
                reply
            }
        }
    }
}
