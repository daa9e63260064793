//! Engine session: one engine process, at most one command in flight.
//!
//! The session lives on the caller's thread and owns the engine's input.
//! Each `play_move` or `start_analysis` hands the engine's output to a worker
//! thread, which reports back on the caller's event channel and returns the
//! reader inside its [`CommandDone`] event. The caller passes that event to
//! [`EngineSession::finish`] to make the session idle again.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use rechess_core::{Move, Oracle, Position};

use crate::cancel::CancelToken;
use crate::command::{Command, GoParams};
use crate::error::UciError;
use crate::options::EngineOptions;
use crate::process::{EngineProcess, EngineReader, EngineWriter, ProcessHandle};
use crate::response::{Info, Response};
use crate::score::Score;

/// How long a new engine gets to finish `uci` and `isready`.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Name reported when the engine sends no `id name`.
const UNNAMED_ENGINE: &str = "Unnamed engine";

/// What the session is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineState {
    Idle,
    Playing,
    Analyzing,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::Playing => "playing",
            EngineState::Analyzing => "analyzing",
        };
        f.write_str(name)
    }
}

/// One analysis snapshot, scored from White's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    /// First move of the principal variation.
    pub best_move: Move,
    /// Evaluation from White's point of view.
    pub score: Score,
    /// Evaluation bar value in `0..=1000`, 0 meaning White is winning.
    pub bar: u16,
    /// The principal variation in numbered SAN, e.g. `1. e4 e5 2. Nf3`.
    pub variation: String,
    /// The principal variation as sent by the engine.
    pub pv: Vec<Move>,
    /// Search depth reached.
    pub depth: u32,
}

impl Analysis {
    /// Build a snapshot from an `info` line about `position`.
    ///
    /// Returns `None` unless the line carries both a score and a principal variation.
    pub fn from_info(info: &Info, position: &Position, oracle: &dyn Oracle) -> Option<Analysis> {
        let score = info.score?;
        let best_move = *info.pv.first()?;
        Some(Analysis {
            best_move,
            score: score.for_white(position.side_to_move()),
            bar: score.bar_value_for(position.side_to_move()),
            variation: oracle.variation_san(position, &info.pv),
            pv: info.pv.clone(),
            depth: info.depth.unwrap_or(0),
        })
    }
}

/// Outcome of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// The engine chose `mv` in `source`.
    MovePlayed {
        source: Position,
        mv: Move,
        ponder: Option<Move>,
    },
    /// The analysis stream ended.
    AnalysisStopped,
}

/// Completion of a command, carrying the engine's output back to the session.
pub struct CommandDone {
    generation: u64,
    reader: EngineReader,
    result: Result<CommandResult, UciError>,
}

impl fmt::Debug for CommandDone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDone")
            .field("generation", &self.generation)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

/// Events sent by engine workers.
#[derive(Debug)]
pub enum EngineEvent {
    AnalysisUpdate(Analysis),
    Done(CommandDone),
}

/// The engine currently installed.
struct LoadedEngine {
    name: String,
    writer: EngineWriter,
    handle: ProcessHandle,
    /// `None` while a worker owns it.
    reader: Option<EngineReader>,
    /// A `go ponder` search is running.
    pondering: bool,
    /// A stopped ponder search still owes a `bestmove`.
    unread_bestmove: bool,
}

impl LoadedEngine {
    fn stop_pondering(&mut self) -> Result<(), UciError> {
        if self.pondering {
            self.writer.send(&Command::Stop)?;
            self.pondering = false;
            self.unread_bestmove = true;
        }
        Ok(())
    }

    fn shutdown(&mut self, state: EngineState) {
        if self.pondering || state != EngineState::Idle {
            let _ = self.writer.send(&Command::Stop);
        }
        if let Err(e) = self.writer.send(&Command::Quit) {
            debug!(error = %e, "engine gone before quit");
        }
        self.handle.terminate();
        info!(name = %self.name, "engine terminated");
    }
}

/// Client side of a UCI engine.
///
/// Worker events are wrapped into the caller's event type `E`, so they queue
/// up behind every other event the caller handles.
pub struct EngineSession<E> {
    options: EngineOptions,
    oracle: Arc<dyn Oracle>,
    events: Sender<E>,
    engine: Option<LoadedEngine>,
    state: EngineState,
    generation: u64,
    cancel: Option<CancelToken>,
    options_pending: bool,
    /// Ponder on the reply once the running `play_move` finishes.
    ponder_after: bool,
}

impl<E> EngineSession<E>
where
    E: From<EngineEvent> + Send + 'static,
{
    /// Create a session with no engine loaded.
    pub fn new(options: EngineOptions, oracle: Arc<dyn Oracle>, events: Sender<E>) -> Self {
        Self {
            options,
            oracle,
            events,
            engine: None,
            state: EngineState::Idle,
            generation: 0,
            cancel: None,
            options_pending: false,
            ponder_after: false,
        }
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Name of the loaded engine.
    pub fn name(&self) -> Option<&str> {
        self.engine.as_ref().map(|e| e.name.as_str())
    }

    /// Return `true` if an engine is loaded.
    pub fn is_loaded(&self) -> bool {
        self.engine.is_some()
    }

    /// Standing options.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Start the engine at `path` and install it in place of the current one.
    ///
    /// On failure the current engine stays installed.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), UciError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading engine");
        let process = EngineProcess::spawn(path)?;
        self.install(process)
    }

    /// Handshake with an already connected engine and install it.
    ///
    /// The previous engine is terminated only after the new one answered
    /// `readyok`. Commands still running on the previous engine are dropped.
    pub fn install(&mut self, process: EngineProcess) -> Result<(), UciError> {
        let (reader, writer, mut handle) = process.into_parts();
        let options = self.options.clone();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut reader, mut writer) = (reader, writer);
            let result = handshake(&mut reader, &mut writer, &options);
            let _ = tx.send((result, reader, writer));
        });

        let (name, reader, writer) = match rx.recv_timeout(HANDSHAKE_TIMEOUT) {
            Ok((Ok(name), reader, writer)) => (name, reader, writer),
            Ok((Err(e), _, _)) => {
                warn!(error = %e, "engine handshake failed");
                handle.terminate();
                return Err(e);
            }
            Err(_) => {
                warn!(timeout = ?HANDSHAKE_TIMEOUT, "engine handshake timed out");
                handle.terminate();
                return Err(UciError::Timeout {
                    timeout: HANDSHAKE_TIMEOUT,
                });
            }
        };

        self.quit();
        info!(name = %name, generation = self.generation, "engine ready");
        self.engine = Some(LoadedEngine {
            name,
            writer,
            handle,
            reader: Some(reader),
            pondering: false,
            unread_bestmove: false,
        });
        self.options_pending = false;
        Ok(())
    }

    /// Ask the engine for a move in `position`.
    ///
    /// The result arrives as an [`EngineEvent::Done`] carrying
    /// [`CommandResult::MovePlayed`]. With `ponder` set, the engine then
    /// searches the reply it expects until the next command.
    pub fn play_move(&mut self, position: Position, ponder: bool) -> Result<(), UciError> {
        let depth = self.options.depth;
        let (reader, drain) = self.begin(&position, GoParams::depth(depth))?;
        info!(fen = %position.fen(), depth, "engine thinking");

        let generation = self.generation;
        let events = self.events.clone();
        thread::spawn(move || {
            let mut reader = reader;
            let result = wait_for_move(&mut reader, position, drain);
            let done = CommandDone {
                generation,
                reader,
                result,
            };
            let _ = events.send(E::from(EngineEvent::Done(done)));
        });

        self.state = EngineState::Playing;
        self.ponder_after = ponder;
        Ok(())
    }

    /// Start streaming analysis of `position`.
    ///
    /// Updates arrive as [`EngineEvent::AnalysisUpdate`] until
    /// [`stop_analysis`](EngineSession::stop_analysis) or the engine reaches
    /// its depth limit; the stream then ends with [`CommandResult::AnalysisStopped`].
    pub fn start_analysis(&mut self, position: Position) -> Result<(), UciError> {
        let depth = self.options.analysis_depth;
        let (reader, drain) = self.begin(&position, GoParams::depth(depth))?;
        info!(fen = %position.fen(), depth, "analysis started");

        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let oracle = Arc::clone(&self.oracle);
        let generation = self.generation;
        let events = self.events.clone();
        thread::spawn(move || {
            let mut reader = reader;
            let result = stream_analysis(&mut reader, &position, oracle.as_ref(), &worker_cancel, &events, drain);
            let done = CommandDone {
                generation,
                reader,
                result,
            };
            let _ = events.send(E::from(EngineEvent::Done(done)));
        });

        self.cancel = Some(cancel);
        self.state = EngineState::Analyzing;
        Ok(())
    }

    /// Stop delivering analysis updates and tell the engine to stop.
    ///
    /// No update is sent after this returns. The worker still reads up to the
    /// engine's `bestmove` and reports [`CommandResult::AnalysisStopped`].
    pub fn stop_analysis(&mut self) {
        if self.state != EngineState::Analyzing {
            return;
        }
        let Some(cancel) = &self.cancel else {
            return;
        };
        if cancel.is_cancelled() {
            return;
        }
        cancel.cancel();
        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = engine.writer.send(&Command::Stop) {
                warn!(error = %e, "failed to send stop");
            }
        }
        info!("analysis stopping");
    }

    /// Ask a running `play_move` search to answer now.
    ///
    /// The move still arrives through [`finish`](EngineSession::finish).
    pub fn stop_search(&mut self) {
        if self.state != EngineState::Playing {
            return;
        }
        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = engine.writer.send(&Command::Stop) {
                warn!(error = %e, "failed to send stop");
            }
        }
        debug!("search stop requested");
    }

    /// Take back the engine's output from a finished command.
    ///
    /// Returns `None` for completions from an engine that has since been
    /// replaced or quit.
    pub fn finish(&mut self, done: CommandDone) -> Option<Result<CommandResult, UciError>> {
        if done.generation != self.generation {
            debug!(
                stale = done.generation,
                current = self.generation,
                "dropping completion from a previous engine"
            );
            return None;
        }

        let CommandDone { reader, result, .. } = done;
        self.state = EngineState::Idle;
        self.cancel = None;
        let ponder_after = std::mem::take(&mut self.ponder_after);

        let engine = self.engine.as_mut()?;
        engine.reader = Some(reader);

        if self.options_pending {
            self.options_pending = false;
            if let Err(e) = apply_options(&mut engine.writer, &self.options) {
                warn!(error = %e, "failed to apply deferred engine options");
            }
        }

        match &result {
            Ok(CommandResult::MovePlayed {
                source,
                mv,
                ponder: Some(ponder),
            }) if ponder_after => {
                if let Err(e) = start_pondering(engine, source, *mv, *ponder) {
                    warn!(error = %e, "failed to start pondering");
                }
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "engine command failed"),
        }

        Some(result)
    }

    /// Replace the standing options and send them to the engine.
    ///
    /// While a command is running they are sent once it finishes.
    pub fn configure(&mut self, options: EngineOptions) {
        self.options = options;
        let state = self.state;
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        if state != EngineState::Idle {
            self.options_pending = true;
            return;
        }
        let result = engine
            .stop_pondering()
            .and_then(|()| apply_options(&mut engine.writer, &self.options));
        if let Err(e) = result {
            warn!(error = %e, "failed to apply engine options");
        }
    }

    /// Tell an idle engine that the next position belongs to a new game.
    pub fn new_game(&mut self) -> Result<(), UciError> {
        let state = self.state;
        let engine = self.engine.as_mut().ok_or(UciError::NotLoaded)?;
        if state != EngineState::Idle {
            return Err(UciError::Busy { state });
        }
        engine.stop_pondering()?;
        engine.writer.send(&Command::UciNewGame)
    }

    /// Shut the engine down. Does nothing when no engine is loaded.
    pub fn quit(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(mut engine) = self.engine.take() {
            engine.shutdown(self.state);
        }
        self.generation += 1;
        self.state = EngineState::Idle;
        self.options_pending = false;
        self.ponder_after = false;
    }

    /// Validate the state, send `position` and `go`, and take the reader.
    fn begin(&mut self, position: &Position, go: GoParams) -> Result<(EngineReader, bool), UciError> {
        let state = self.state;
        let engine = self.engine.as_mut().ok_or(UciError::NotLoaded)?;
        if state != EngineState::Idle || engine.reader.is_none() {
            warn!(%state, "engine command requested while busy");
            return Err(UciError::Busy { state });
        }

        engine.stop_pondering()?;
        engine.writer.send(&Command::position(position))?;
        engine.writer.send(&Command::Go(go))?;

        let reader = engine.reader.take().ok_or(UciError::Busy { state })?;
        Ok((reader, std::mem::take(&mut engine.unread_bestmove)))
    }
}

impl<E> Drop for EngineSession<E> {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if let Some(mut engine) = self.engine.take() {
            engine.shutdown(self.state);
        }
    }
}

/// `uci` through `uciok`, then the standing options, then `isready` through `readyok`.
fn handshake(
    reader: &mut EngineReader,
    writer: &mut EngineWriter,
    options: &EngineOptions,
) -> Result<String, UciError> {
    writer.send(&Command::Uci)?;
    let mut name = None;
    loop {
        match reader.read_response()? {
            Response::IdName(id) => name = Some(id),
            Response::UciOk => break,
            _ => {}
        }
    }

    apply_options(writer, options)?;

    writer.send(&Command::IsReady)?;
    while reader.read_response()? != Response::ReadyOk {}

    Ok(name.unwrap_or_else(|| UNNAMED_ENGINE.to_string()))
}

fn apply_options(writer: &mut EngineWriter, options: &EngineOptions) -> Result<(), UciError> {
    for command in options.commands() {
        writer.send(&command)?;
    }
    Ok(())
}

/// Ponder on the expected reply after the engine's own move.
fn start_pondering(engine: &mut LoadedEngine, source: &Position, mv: Move, ponder: Move) -> Result<(), UciError> {
    engine.writer.send(&Command::Position {
        fen: source.fen(),
        moves: vec![mv, ponder],
    })?;
    engine.writer.send(&Command::Go(GoParams::ponder()))?;
    engine.pondering = true;
    debug!(expected = %ponder, "pondering");
    Ok(())
}

/// Skip output up to and including the next `bestmove`.
fn skip_to_bestmove(reader: &mut EngineReader) -> Result<(), UciError> {
    while !matches!(reader.read_response()?, Response::BestMove { .. }) {}
    Ok(())
}

fn wait_for_move(reader: &mut EngineReader, source: Position, drain: bool) -> Result<CommandResult, UciError> {
    if drain {
        skip_to_bestmove(reader)?;
    }
    loop {
        if let Response::BestMove { best, ponder } = reader.read_response()? {
            let mv = best.ok_or(UciError::NoMove)?;
            return Ok(CommandResult::MovePlayed { source, mv, ponder });
        }
    }
}

fn stream_analysis<E: From<EngineEvent>>(
    reader: &mut EngineReader,
    source: &Position,
    oracle: &dyn Oracle,
    cancel: &CancelToken,
    events: &Sender<E>,
    drain: bool,
) -> Result<CommandResult, UciError> {
    if drain {
        skip_to_bestmove(reader)?;
    }
    loop {
        match reader.read_response()? {
            Response::Info(info) => {
                let Some(analysis) = Analysis::from_info(&info, source, oracle) else {
                    continue;
                };
                // Keep reading after cancellation: the engine still owes a bestmove.
                let _ = cancel.run_unless_cancelled(|| events.send(E::from(EngineEvent::AnalysisUpdate(analysis))));
            }
            Response::BestMove { .. } => return Ok(CommandResult::AnalysisStopped),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use rechess_core::{Position, StandardOracle};

    use super::*;

    #[test]
    fn state_display_is_lowercase() {
        assert_eq!(EngineState::Idle.to_string(), "idle");
        assert_eq!(EngineState::Playing.to_string(), "playing");
        assert_eq!(EngineState::Analyzing.to_string(), "analyzing");
    }

    #[test]
    fn analysis_needs_score_and_pv() {
        let oracle = StandardOracle;
        let position = Position::starting();
        let info = Info {
            depth: Some(5),
            ..Info::default()
        };
        assert!(Analysis::from_info(&info, &position, &oracle).is_none());
    }

    #[test]
    fn analysis_scores_for_white() {
        let oracle = StandardOracle;
        let position: Position = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
            .parse()
            .unwrap();
        let info = Info {
            depth: Some(12),
            score: Some(Score::Centipawns(-40)),
            pv: vec![Move::from_uci("e7e5").unwrap(), Move::from_uci("g1f3").unwrap()],
            ..Info::default()
        };
        let analysis = Analysis::from_info(&info, &position, &oracle).unwrap();
        assert_eq!(analysis.score, Score::Centipawns(40));
        assert_eq!(analysis.bar, 460);
        assert_eq!(analysis.best_move, Move::from_uci("e7e5").unwrap());
        assert_eq!(analysis.variation, "1... e5 2. Nf3");
        assert_eq!(analysis.depth, 12);
    }

    #[test]
    fn commands_need_an_engine() {
        let (tx, _rx) = mpsc::channel::<EngineEvent>();
        let mut session = EngineSession::new(EngineOptions::default(), Arc::new(StandardOracle), tx);
        assert!(matches!(
            session.play_move(Position::starting(), false),
            Err(UciError::NotLoaded)
        ));
        assert!(matches!(session.new_game(), Err(UciError::NotLoaded)));
        assert_eq!(session.name(), None);
        session.quit();
        session.quit();
        assert_eq!(session.state(), EngineState::Idle);
    }
}
