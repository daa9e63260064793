//! Event-driven coordination of the game, the clocks and the engine.
//!
//! The controller is the single writer of all session state. Everything that
//! can change it arrives as an [`Event`] on one channel, including the
//! engine's results, so events are handled strictly in the order they were
//! queued.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};

use rechess_core::{Move, Oracle, Position};
use rechess_uci::{CommandResult, EngineEvent, EngineProcess, EngineSession, EngineState, UciError};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::SessionConfig;
use crate::event::{Event, Notification};
use crate::session::GameSession;

/// Engine command waiting for the running one to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Play,
    Analysis,
}

/// Owner of the game session, the clock pair and the engine session.
pub struct Controller {
    game: GameSession,
    clock: Clock,
    engine: EngineSession<Event>,
    config: SessionConfig,
    /// Analysis updates are shown only while this is set.
    analyzing: bool,
    /// Requested while the engine was busy; started once it is idle.
    pending: Option<Pending>,
    /// Position the running `play_move` search started from, `None` once it was told to stop.
    thinking_on: Option<Position>,
    /// Position of a search forced by `PlayMoveNow`, accepted under a historical cursor.
    forced: Option<Position>,
    quitting: bool,
}

impl Controller {
    /// Create a controller with no engine loaded.
    ///
    /// `events` is the sending side of the channel that feeds [`dispatch`](Controller::dispatch);
    /// engine workers report through it.
    pub fn new(config: SessionConfig, oracle: Arc<dyn Oracle>, events: Sender<Event>) -> Self {
        let game = GameSession::new(Arc::clone(&oracle), config.engine_color, config.orientation);
        let clock = Clock::new(config.clock_time, config.clock_increment);
        let engine = EngineSession::new(config.engine.clone(), oracle, events);
        Self {
            game,
            clock,
            engine,
            config,
            analyzing: false,
            pending: None,
            thinking_on: None,
            forced: None,
            quitting: false,
        }
    }

    pub fn game(&self) -> &GameSession {
        &self.game
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn engine(&self) -> &EngineSession<Event> {
        &self.engine
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Return `true` after a [`Event::Quit`] was handled.
    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    /// Start the side on turn's clock and let the engine move if it is on turn.
    pub fn start(&mut self) -> Vec<Notification> {
        let mut notes = Vec::new();
        if !self.game.is_over() {
            self.clock.start(self.game.side_to_move());
        }
        self.maybe_invoke_engine(&mut notes);
        notes
    }

    /// Install an already connected engine, as [`Event::LoadEngine`] does for a path.
    pub fn install_engine(&mut self, process: EngineProcess) -> Vec<Notification> {
        self.replace_engine(|engine| engine.install(process))
    }

    /// Handle one event.
    pub fn dispatch(&mut self, event: Event) -> Vec<Notification> {
        let mut notes = Vec::new();
        match event {
            Event::HumanMove {
                origin,
                target,
                promotion,
            } => match self.game.legal_move(origin, target, promotion) {
                Ok(mv) => self.play(mv, &mut notes),
                Err(e) => {
                    debug!(error = %e, "human move rejected");
                    notes.push(Notification::MoveRejected(e));
                }
            },
            Event::SelectPly(k) => self.select_ply(k, &mut notes),
            Event::Engine(EngineEvent::AnalysisUpdate(analysis)) => {
                if self.analyzing {
                    self.game.set_arrow(analysis.best_move);
                    notes.push(Notification::AnalysisUpdate(analysis));
                }
            }
            Event::Engine(EngineEvent::Done(done)) => {
                if let Some(result) = self.engine.finish(done) {
                    self.command_finished(result, &mut notes);
                }
                if self.engine.state() == EngineState::Idle {
                    match self.pending.take() {
                        Some(Pending::Play) => self.resume_play(&mut notes),
                        Some(Pending::Analysis) => self.begin_analysis(&mut notes),
                        None => {}
                    }
                }
            }
            Event::Tick => {
                if let Some(side) = self.clock.running() {
                    if self.clock.tick(side) {
                        self.clock.stop_all();
                        notes.push(Notification::TimeExpired(side));
                    }
                }
            }
            Event::NewGame => self.new_game(&mut notes),
            Event::SetFen(fen) => self.set_fen(&fen, &mut notes),
            Event::PlayMoveNow => self.play_move_now(&mut notes),
            Event::StartAnalysis => self.start_analysis(&mut notes),
            Event::StopAnalysis => {
                self.halt_analysis();
                if self.game.is_live() && !self.game.is_over() {
                    self.clock.start(self.game.side_to_move());
                }
                self.maybe_invoke_engine(&mut notes);
            }
            Event::FlipPerspective => {
                self.game.flip_perspective();
                notes.push(Notification::PositionChanged);
            }
            Event::SettingsChanged(config) => self.apply_settings(config, &mut notes),
            Event::LoadEngine(path) => {
                notes.extend(self.replace_engine(|engine| engine.load(&path)));
            }
            Event::Quit => {
                self.halt_analysis();
                self.clock.stop_all();
                self.engine.quit();
                self.quitting = true;
                info!("quitting");
            }
        }
        notes
    }

    /// Handle events until [`Event::Quit`], passing every batch of notifications to `notify`.
    pub fn run<F>(mut self, events: &Receiver<Event>, mut notify: F)
    where
        F: FnMut(&Controller, &[Notification]),
    {
        let notes = self.start();
        notify(&self, &notes);

        for event in events {
            let notes = self.dispatch(event);
            if !notes.is_empty() {
                notify(&self, &notes);
            }
            if self.quitting {
                break;
            }
        }

        info!("rechess shutting down");
    }

    /// Apply a move to the displayed position and hand the turn over.
    fn play(&mut self, mv: Move, notes: &mut Vec<Notification>) {
        let mover = self.game.side_to_move();
        let applied = match self.game.apply_move(mv) {
            Ok(applied) => applied,
            Err(e) => {
                debug!(error = %e, "move rejected");
                notes.push(Notification::MoveRejected(e));
                return;
            }
        };

        self.clock.add_increment(mover);
        self.clock.stop(mover);
        self.clock.start(!mover);
        notes.push(Notification::MoveApplied(applied));

        self.halt_analysis();

        if self.game.is_over() {
            self.clock.stop_all();
            let outcome = self.game.result();
            info!(%outcome, "game over");
            notes.push(Notification::GameOver(outcome));
            return;
        }

        self.maybe_invoke_engine(notes);
    }

    fn command_finished(&mut self, result: Result<CommandResult, UciError>, notes: &mut Vec<Notification>) {
        let searched = self.thinking_on.take();
        let forced = if searched.is_some() && searched == self.forced {
            self.forced.take()
        } else {
            None
        };
        match result {
            Ok(CommandResult::MovePlayed { source, mv, .. }) => {
                let current = self.game.position();
                let accepted = searched == Some(source)
                    && source == current
                    && (self.game.is_live() || forced == Some(source));
                if !accepted || self.game.is_over() {
                    debug!(mv = %mv, "discarding stale engine move");
                    return;
                }
                notes.push(Notification::EngineMovePlayed(mv));
                self.play(mv, notes);
            }
            Ok(CommandResult::AnalysisStopped) => {
                self.analyzing = false;
                notes.push(Notification::AnalysisStopped);
            }
            Err(e) => notes.push(Notification::EngineError(e.to_string())),
        }
    }

    /// Issue the move request that waited for the engine.
    fn resume_play(&mut self, notes: &mut Vec<Notification>) {
        match self.forced {
            Some(position) if position == self.game.position() && !self.game.is_over() => {
                self.request_engine_move(notes);
            }
            _ => {
                self.forced = None;
                self.maybe_invoke_engine(notes);
            }
        }
    }

    fn maybe_invoke_engine(&mut self, notes: &mut Vec<Notification>) {
        if self.game.is_live() && self.game.is_engine_on_turn() && !self.game.is_over() {
            self.request_engine_move(notes);
        }
    }

    /// Start a search on the displayed position, or queue one behind the running command.
    fn request_engine_move(&mut self, notes: &mut Vec<Notification>) {
        if !self.engine.is_loaded() {
            debug!("no engine loaded");
            return;
        }
        let position = self.game.position();
        match self.engine.state() {
            EngineState::Idle => match self.engine.play_move(position, self.config.engine.ponder) {
                Ok(()) => {
                    self.thinking_on = Some(position);
                    notes.push(Notification::EngineThinking);
                }
                Err(e) => notes.push(Notification::EngineError(e.to_string())),
            },
            EngineState::Playing if self.thinking_on == Some(position) => {}
            EngineState::Playing => {
                self.stop_search();
                self.pending = Some(Pending::Play);
            }
            EngineState::Analyzing => {
                self.halt_analysis();
                self.pending = Some(Pending::Play);
            }
        }
    }

    /// Stop showing analysis and tell the engine to stop, leaving the clocks alone.
    fn halt_analysis(&mut self) {
        self.analyzing = false;
        if self.pending == Some(Pending::Analysis) {
            self.pending = None;
        }
        if self.engine.state() == EngineState::Analyzing {
            self.engine.stop_analysis();
        }
    }

    /// Cut the running move search short. Its answer will be discarded.
    fn stop_search(&mut self) {
        if self.thinking_on.take().is_some() {
            self.engine.stop_search();
        }
    }

    fn select_ply(&mut self, k: isize, notes: &mut Vec<Notification>) {
        if !(-1..self.game.len() as isize).contains(&k) {
            debug!(ply = k, len = self.game.len(), "ignoring selection outside the move list");
            return;
        }
        self.game.select_ply(k);
        self.halt_analysis();
        self.stop_search();
        self.pending = None;
        self.forced = None;
        self.clock.stop_all();
        notes.push(Notification::PositionChanged);
        if self.game.is_over() {
            notes.push(Notification::GameOver(self.game.result()));
        }
    }

    fn new_game(&mut self, notes: &mut Vec<Notification>) {
        self.halt_analysis();
        self.stop_search();
        self.forced = None;
        if self.engine.is_loaded() && self.engine.state() == EngineState::Idle {
            if let Err(e) = self.engine.new_game() {
                warn!(error = %e, "failed to announce new game");
            }
        }

        self.game.new_game();
        if self.game.is_engine_on_turn() {
            // Human at the bottom.
            if self.game.perspective() == self.game.engine_color() {
                self.game.flip_perspective();
            }
        }
        self.clock.stop_all();
        self.clock.reset_all();
        self.clock.start(self.game.side_to_move());
        notes.push(Notification::PositionChanged);
        self.maybe_invoke_engine(notes);
    }

    fn set_fen(&mut self, fen: &str, notes: &mut Vec<Notification>) {
        if let Err(e) = self.game.set_fen(fen) {
            warn!(error = %e, "rejected FEN");
            notes.push(Notification::InvalidFen(e));
            return;
        }
        self.halt_analysis();
        self.stop_search();
        self.forced = None;
        self.clock.stop_all();
        notes.push(Notification::PositionChanged);

        if self.game.is_over() {
            notes.push(Notification::GameOver(self.game.result()));
            return;
        }
        self.clock.start(self.game.side_to_move());
        self.maybe_invoke_engine(notes);
    }

    fn play_move_now(&mut self, notes: &mut Vec<Notification>) {
        if self.game.is_over() {
            return;
        }
        self.game.set_engine_color(self.game.side_to_move());
        self.game.clear_arrow();
        self.halt_analysis();
        self.forced = Some(self.game.position());
        self.request_engine_move(notes);
    }

    fn start_analysis(&mut self, notes: &mut Vec<Notification>) {
        if self.analyzing {
            return;
        }
        if !self.engine.is_loaded() {
            notes.push(Notification::EngineError(UciError::NotLoaded.to_string()));
            return;
        }
        self.clock.stop_all();
        match self.engine.state() {
            EngineState::Idle => self.begin_analysis(notes),
            EngineState::Playing => {
                self.stop_search();
                self.pending = Some(Pending::Analysis);
            }
            // Still winding down a halted analysis.
            EngineState::Analyzing => self.pending = Some(Pending::Analysis),
        }
    }

    fn begin_analysis(&mut self, notes: &mut Vec<Notification>) {
        match self.engine.start_analysis(self.game.position()) {
            Ok(()) => self.analyzing = true,
            Err(e) => notes.push(Notification::EngineError(e.to_string())),
        }
    }

    fn apply_settings(&mut self, config: SessionConfig, notes: &mut Vec<Notification>) {
        info!("settings changed");
        self.engine.configure(config.engine.clone());
        self.clock.reconfigure(config.clock_time, config.clock_increment);
        if !self.game.is_in_progress() {
            self.clock.reset_all();
        }
        self.game.set_engine_color(config.engine_color);
        if self.game.perspective() != config.orientation {
            self.game.flip_perspective();
        }
        self.config = config;
        notes.push(Notification::PositionChanged);
        self.maybe_invoke_engine(notes);
    }

    /// Load a new engine through `load`, then let it move if it is on turn.
    fn replace_engine<F>(&mut self, load: F) -> Vec<Notification>
    where
        F: FnOnce(&mut EngineSession<Event>) -> Result<(), UciError>,
    {
        let mut notes = Vec::new();
        self.halt_analysis();
        if let Err(e) = load(&mut self.engine) {
            warn!(error = %e, "engine load failed");
            notes.push(Notification::EngineError(e.to_string()));
            return notes;
        }

        self.pending = None;
        self.thinking_on = None;
        self.forced = None;
        let name = self.engine.name().unwrap_or_default().to_string();
        notes.push(Notification::EngineLoaded(name));
        self.maybe_invoke_engine(&mut notes);
        notes
    }
}
