//! Line-based commands read from stdin.

use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result, bail};
use rechess_core::Move;
use rechess_game::{Event, SessionConfig};
use tracing::{debug, warn};

pub const HELP: &str = "\
commands:
  e2e4 | e7e8q       play a move (promotion defaults to a queen)
  select <k>         show the position after ply k (-1 for the start)
  new                start a new game
  fen <fen>          set up a position
  go                 let the engine move for the side on turn
  analyze | stop     start or stop analysis of the shown position
  flip               flip the board
  set <key>=<value>  change a setting (clock.time, engine.depth, ...)
  load <path>        load another UCI engine
  help               show this list
  quit               leave";

/// One parsed line.
#[derive(Debug)]
pub enum Input {
    Event(Event),
    Help,
}

/// Parse one line. `config` tracks settings so `set` can send the whole new configuration.
pub fn parse_line(line: &str, config: &mut SessionConfig) -> Result<Input> {
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let event = match word {
        "help" | "?" => return Ok(Input::Help),
        "quit" | "exit" => Event::Quit,
        "new" => Event::NewGame,
        "go" | "now" => Event::PlayMoveNow,
        "analyze" => Event::StartAnalysis,
        "stop" => Event::StopAnalysis,
        "flip" => Event::FlipPerspective,
        "select" => {
            let k = rest
                .parse::<isize>()
                .with_context(|| format!("invalid ply \"{rest}\""))?;
            Event::SelectPly(k)
        }
        "fen" => {
            if rest.is_empty() {
                bail!("fen needs a position");
            }
            Event::SetFen(rest.to_string())
        }
        "set" => {
            let mut updated = config.clone();
            updated.set_pair(rest)?;
            *config = updated.clone();
            Event::SettingsChanged(updated)
        }
        "load" => {
            if rest.is_empty() {
                bail!("load needs an engine path");
            }
            Event::LoadEngine(rest.into())
        }
        _ => {
            let mv = Move::from_uci(word).with_context(|| format!("unknown command \"{word}\""))?;
            Event::HumanMove {
                origin: mv.origin(),
                target: mv.target(),
                promotion: mv.promotion(),
            }
        }
    };
    Ok(Input::Event(event))
}

/// Read stdin on a background thread until it closes, sending parsed events.
///
/// Closing stdin sends [`Event::Quit`].
pub fn spawn_reader(events: Sender<Event>, mut config: SessionConfig) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "failed to read input");
                    break;
                }
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            debug!(input = trimmed, "received command");
            match parse_line(trimmed, &mut config) {
                Ok(Input::Event(event)) => {
                    let quit = matches!(event, Event::Quit);
                    if events.send(event).is_err() || quit {
                        return;
                    }
                }
                Ok(Input::Help) => println!("{HELP}"),
                Err(e) => println!("error: {e:#}"),
            }
        }
        let _ = events.send(Event::Quit);
    })
}

#[cfg(test)]
mod tests {
    use rechess_core::{Color, PromotionPiece, Square};

    use super::*;

    fn event(line: &str) -> Event {
        match parse_line(line, &mut SessionConfig::default()) {
            Ok(Input::Event(event)) => event,
            other => panic!("expected an event for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn move_becomes_human_move() {
        assert!(matches!(
            event("e7e8n"),
            Event::HumanMove {
                origin: Square::E7,
                target: Square::E8,
                promotion: Some(PromotionPiece::Knight),
            }
        ));
    }

    #[test]
    fn select_accepts_root() {
        assert!(matches!(event("select -1"), Event::SelectPly(-1)));
        assert!(parse_line("select x", &mut SessionConfig::default()).is_err());
    }

    #[test]
    fn fen_keeps_all_fields() {
        let fen = "8/8/8/8/8/8/8/K6k w - - 0 1";
        match event(&format!("fen {fen}")) {
            Event::SetFen(text) => assert_eq!(text, fen),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn set_accumulates_settings() {
        let mut config = SessionConfig::default();
        parse_line("set clock.time=60", &mut config).unwrap();
        let Input::Event(Event::SettingsChanged(sent)) =
            parse_line("set engine.is_white=true", &mut config).unwrap()
        else {
            panic!("expected settings");
        };
        assert_eq!(sent.clock_time, 60);
        assert_eq!(sent.engine_color, Color::White);
        assert_eq!(config, sent);
    }

    #[test]
    fn rejected_setting_leaves_config_alone() {
        let mut config = SessionConfig::default();
        assert!(parse_line("set clock.time=true", &mut config).is_err());
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn unknown_word_is_an_error() {
        assert!(parse_line("castle", &mut SessionConfig::default()).is_err());
    }
}
