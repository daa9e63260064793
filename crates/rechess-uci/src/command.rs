//! Commands sent to a UCI engine.

use std::fmt;
use std::time::Duration;

use rechess_core::{Move, Position};

/// Parameters for the `go` command.
///
/// All fields are optional; a bare `go` leaves the limits to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    /// White's remaining time.
    pub wtime: Option<Duration>,
    /// Black's remaining time.
    pub btime: Option<Duration>,
    /// White's increment per move.
    pub winc: Option<Duration>,
    /// Black's increment per move.
    pub binc: Option<Duration>,
    /// Moves until next time control.
    pub movestogo: Option<u32>,
    /// Search to this depth only.
    pub depth: Option<u32>,
    /// Search for exactly this duration.
    pub movetime: Option<Duration>,
    /// Search this many nodes only.
    pub nodes: Option<u64>,
    /// Search until `stop` (no limit).
    pub infinite: bool,
    /// Search in pondering mode.
    pub ponder: bool,
}

impl GoParams {
    /// A search bounded by `depth` plies.
    pub fn depth(depth: u32) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    /// A pondering search, ended by `stop` or `ponderhit`.
    pub fn ponder() -> Self {
        Self {
            ponder: true,
            ..Self::default()
        }
    }
}

impl fmt::Display for GoParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "go")?;
        if self.ponder {
            write!(f, " ponder")?;
        }
        let millis = [
            ("wtime", self.wtime),
            ("btime", self.btime),
            ("winc", self.winc),
            ("binc", self.binc),
        ];
        for (name, value) in millis {
            if let Some(d) = value {
                write!(f, " {name} {}", d.as_millis())?;
            }
        }
        if let Some(n) = self.movestogo {
            write!(f, " movestogo {n}")?;
        }
        if let Some(d) = self.depth {
            write!(f, " depth {d}")?;
        }
        if let Some(n) = self.nodes {
            write!(f, " nodes {n}")?;
        }
        if let Some(d) = self.movetime {
            write!(f, " movetime {}", d.as_millis())?;
        }
        if self.infinite {
            write!(f, " infinite")?;
        }
        Ok(())
    }
}

/// A command line for the engine. `Display` renders the exact protocol text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `uci` -- ask the engine to identify itself.
    Uci,
    /// `isready` -- synchronization ping.
    IsReady,
    /// `ucinewgame` -- the next position belongs to a different game.
    UciNewGame,
    /// `setoption name <name> value <value>`.
    SetOption { name: String, value: String },
    /// `position fen <fen> [moves ...]`.
    Position { fen: String, moves: Vec<Move> },
    /// `go` -- start searching with the given parameters.
    Go(GoParams),
    /// `ponderhit` -- the opponent played the expected move.
    PonderHit,
    /// `stop` -- halt the current search.
    Stop,
    /// `quit` -- exit the engine.
    Quit,
}

impl Command {
    /// `setoption` for any displayable value.
    pub fn set_option(name: &str, value: impl fmt::Display) -> Self {
        Command::SetOption {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// `position fen` for `position`, with no moves appended.
    pub fn position(position: &Position) -> Self {
        Command::Position {
            fen: position.fen(),
            moves: Vec::new(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Uci => write!(f, "uci"),
            Command::IsReady => write!(f, "isready"),
            Command::UciNewGame => write!(f, "ucinewgame"),
            Command::SetOption { name, value } => write!(f, "setoption name {name} value {value}"),
            Command::Position { fen, moves } => {
                write!(f, "position fen {fen}")?;
                if !moves.is_empty() {
                    write!(f, " moves")?;
                    for mv in moves {
                        write!(f, " {mv}")?;
                    }
                }
                Ok(())
            }
            Command::Go(params) => write!(f, "{params}"),
            Command::PonderHit => write!(f, "ponderhit"),
            Command::Stop => write!(f, "stop"),
            Command::Quit => write!(f, "quit"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rechess_core::{Move, Position, STARTING_FEN};

    use super::*;

    #[test]
    fn simple_commands() {
        assert_eq!(Command::Uci.to_string(), "uci");
        assert_eq!(Command::IsReady.to_string(), "isready");
        assert_eq!(Command::UciNewGame.to_string(), "ucinewgame");
        assert_eq!(Command::Stop.to_string(), "stop");
        assert_eq!(Command::PonderHit.to_string(), "ponderhit");
        assert_eq!(Command::Quit.to_string(), "quit");
    }

    #[test]
    fn setoption_line() {
        let cmd = Command::set_option("Hash", 256);
        assert_eq!(cmd.to_string(), "setoption name Hash value 256");
        let cmd = Command::set_option("Ponder", true);
        assert_eq!(cmd.to_string(), "setoption name Ponder value true");
    }

    #[test]
    fn position_without_moves() {
        let cmd = Command::position(&Position::starting());
        assert_eq!(cmd.to_string(), format!("position fen {STARTING_FEN}"));
    }

    #[test]
    fn position_with_moves() {
        let cmd = Command::Position {
            fen: STARTING_FEN.to_string(),
            moves: vec![
                Move::from_uci("e2e4").unwrap(),
                Move::from_uci("e7e5").unwrap(),
            ],
        };
        assert_eq!(
            cmd.to_string(),
            format!("position fen {STARTING_FEN} moves e2e4 e7e5")
        );
    }

    #[test]
    fn go_bare() {
        assert_eq!(Command::Go(GoParams::default()).to_string(), "go");
    }

    #[test]
    fn go_depth() {
        assert_eq!(GoParams::depth(30).to_string(), "go depth 30");
    }

    #[test]
    fn go_ponder() {
        assert_eq!(GoParams::ponder().to_string(), "go ponder");
    }

    #[test]
    fn go_wtime_btime_winc_binc() {
        let params = GoParams {
            wtime: Some(Duration::from_millis(300000)),
            btime: Some(Duration::from_millis(300000)),
            winc: Some(Duration::from_millis(2000)),
            binc: Some(Duration::from_millis(2000)),
            ..GoParams::default()
        };
        assert_eq!(
            params.to_string(),
            "go wtime 300000 btime 300000 winc 2000 binc 2000"
        );
    }

    #[test]
    fn go_movetime_nodes_infinite() {
        let params = GoParams {
            movetime: Some(Duration::from_millis(5000)),
            nodes: Some(1_000_000),
            movestogo: Some(20),
            infinite: true,
            ..GoParams::default()
        };
        assert_eq!(
            params.to_string(),
            "go movestogo 20 nodes 1000000 movetime 5000 infinite"
        );
    }
}
