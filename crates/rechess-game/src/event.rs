//! Events handled by the controller and the notifications it produces.

use std::path::PathBuf;

use rechess_core::{Color, FenError, Move, MoveError, Outcome, PromotionPiece, Square};
use rechess_uci::{Analysis, EngineEvent};

use crate::config::SessionConfig;
use crate::session::MoveApplied;

/// Input to [`Controller::dispatch`](crate::Controller::dispatch).
///
/// Human input, clock ticks and engine results all arrive on one channel and
/// are handled in the order they were sent.
#[derive(Debug)]
pub enum Event {
    /// The user moved a piece from `origin` to `target`.
    HumanMove {
        origin: Square,
        target: Square,
        promotion: Option<PromotionPiece>,
    },
    /// Show the position after ply `k` (`-1` for the root).
    SelectPly(isize),
    /// Output of an engine worker.
    Engine(EngineEvent),
    /// One second passed.
    Tick,
    NewGame,
    SetFen(String),
    /// Make the engine move for the side on turn.
    PlayMoveNow,
    StartAnalysis,
    StopAnalysis,
    FlipPerspective,
    SettingsChanged(SessionConfig),
    LoadEngine(PathBuf),
    Quit,
}

impl From<EngineEvent> for Event {
    fn from(event: EngineEvent) -> Self {
        Event::Engine(event)
    }
}

/// What changed after an event, for display collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    MoveApplied(MoveApplied),
    MoveRejected(MoveError),
    InvalidFen(FenError),
    /// The engine started searching for a move.
    EngineThinking,
    /// The engine's move, reported just before it is applied.
    EngineMovePlayed(Move),
    AnalysisUpdate(Analysis),
    AnalysisStopped,
    TimeExpired(Color),
    GameOver(Outcome),
    EngineLoaded(String),
    EngineError(String),
    /// The displayed position, perspective or arrow changed without a move.
    PositionChanged,
}
