//! The game session: one linear mainline and a cursor into it.

use std::sync::Arc;

use rechess_core::{
    Color, FenError, Move, MoveError, MoveEffect, Oracle, Outcome, Position, PromotionPiece, Square,
};
use tracing::{debug, info};

/// Which position is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cursor {
    /// The latest position.
    Live,
    /// The position after ply `k`, or the root position for `-1`.
    Historical(isize),
}

/// One played move and the position it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryEntry {
    position: Position,
    mv: Move,
    san: String,
}

/// Record of a move accepted by [`GameSession::apply_move`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveApplied {
    /// Ply index of the move in the history.
    pub ply: usize,
    pub mv: Move,
    pub san: String,
    pub effect: MoveEffect,
    /// Position after the move.
    pub position: Position,
}

/// Position history, cursor, arrow, and color bookkeeping of one game.
pub struct GameSession {
    oracle: Arc<dyn Oracle>,
    root: Position,
    history: Vec<HistoryEntry>,
    cursor: Cursor,
    arrow: Option<(Square, Square)>,
    engine_color: Color,
    perspective: Color,
}

impl GameSession {
    /// A new game from the starting position.
    pub fn new(oracle: Arc<dyn Oracle>, engine_color: Color, perspective: Color) -> Self {
        Self {
            oracle,
            root: Position::starting(),
            history: Vec::new(),
            cursor: Cursor::Live,
            arrow: None,
            engine_color,
            perspective,
        }
    }

    /// Start over from the standard starting position.
    pub fn new_game(&mut self) {
        self.reset_to(Position::starting());
        info!("new game");
    }

    /// Start over from the position described by `fen`.
    ///
    /// On error the session is unchanged.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let position: Position = fen.parse()?;
        self.reset_to(position);
        info!(fen = %position.fen(), "position set");
        Ok(())
    }

    fn reset_to(&mut self, root: Position) {
        self.root = root;
        self.history.clear();
        self.cursor = Cursor::Live;
        self.arrow = None;
    }

    /// The displayed position: the live one, or the one under a historical cursor.
    pub fn position(&self) -> Position {
        let ply = match self.cursor {
            Cursor::Live => self.history.len() as isize - 1,
            Cursor::Historical(k) => k,
        };
        self.position_after(ply)
    }

    /// The position at the end of the mainline, regardless of the cursor.
    pub fn live_position(&self) -> Position {
        self.position_after(self.history.len() as isize - 1)
    }

    fn position_after(&self, ply: isize) -> Position {
        usize::try_from(ply)
            .ok()
            .and_then(|i| self.history.get(i))
            .map_or(self.root, |entry| entry.position)
    }

    /// FEN of the displayed position.
    pub fn fen(&self) -> String {
        self.position().fen()
    }

    /// The position the game started from.
    pub fn root(&self) -> Position {
        self.root
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn is_live(&self) -> bool {
        self.cursor == Cursor::Live
    }

    /// SAN of every move, in order.
    pub fn notation(&self) -> Vec<&str> {
        self.history.iter().map(|e| e.san.as_str()).collect()
    }

    pub fn moves(&self) -> Vec<Move> {
        self.history.iter().map(|e| e.mv).collect()
    }

    /// Number of plies played.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Return `true` once a move has been played.
    pub fn is_in_progress(&self) -> bool {
        !self.history.is_empty()
    }

    /// Origin and target squares of the highlighted move.
    pub fn arrow(&self) -> Option<(Square, Square)> {
        self.arrow
    }

    pub fn set_arrow(&mut self, mv: Move) {
        self.arrow = Some((mv.origin(), mv.target()));
    }

    pub fn clear_arrow(&mut self) {
        self.arrow = None;
    }

    pub fn engine_color(&self) -> Color {
        self.engine_color
    }

    pub fn set_engine_color(&mut self, color: Color) {
        self.engine_color = color;
    }

    /// Color shown at the bottom of the board.
    pub fn perspective(&self) -> Color {
        self.perspective
    }

    pub fn flip_perspective(&mut self) {
        self.perspective = !self.perspective;
    }

    pub fn side_to_move(&self) -> Color {
        self.position().side_to_move()
    }

    pub fn is_engine_on_turn(&self) -> bool {
        self.side_to_move() == self.engine_color
    }

    /// Resolve a human move from two squares in the displayed position.
    pub fn legal_move(
        &self,
        origin: Square,
        target: Square,
        promotion: Option<PromotionPiece>,
    ) -> Result<Move, MoveError> {
        self.oracle.legal_move(&self.position(), origin, target, promotion)
    }

    /// Play `mv` in the displayed position.
    ///
    /// Under a historical cursor the moves after it are discarded first. An
    /// illegal move leaves the session untouched.
    pub fn apply_move(&mut self, mv: Move) -> Result<MoveApplied, MoveError> {
        let current = self.position();
        let (position, san) = self.oracle.apply(&current, mv)?;
        let effect = self.oracle.effect(&current, mv);

        if let Cursor::Historical(k) = self.cursor {
            let keep = usize::try_from(k + 1).unwrap_or(0);
            debug!(discarded = self.history.len() - keep, "truncating history");
            self.history.truncate(keep);
        }

        self.history.push(HistoryEntry {
            position,
            mv,
            san: san.clone(),
        });
        self.cursor = Cursor::Live;
        self.set_arrow(mv);

        let ply = self.history.len() - 1;
        debug!(ply, mv = %mv, san = %san, "move applied");
        Ok(MoveApplied {
            ply,
            mv,
            san,
            effect,
            position,
        })
    }

    /// Show the position after ply `k`, or the root position for `-1`.
    ///
    /// # Panics
    ///
    /// Panics unless `-1 <= k < len`.
    pub fn select_ply(&mut self, k: isize) {
        assert!(
            (-1..self.history.len() as isize).contains(&k),
            "ply {k} outside -1..{}",
            self.history.len()
        );
        self.cursor = Cursor::Historical(k);
        self.arrow = usize::try_from(k)
            .ok()
            .map(|i| self.history[i].mv)
            .map(|mv| (mv.origin(), mv.target()));
    }

    /// Legal target squares for the piece on `square`.
    ///
    /// Empty under a historical cursor or for a piece of the side not on turn.
    pub fn legal_targets_from(&self, square: Square) -> Vec<Square> {
        if !self.is_live() {
            return Vec::new();
        }
        let position = self.position();
        match position.piece_on(square) {
            Some((_, color)) if color == position.side_to_move() => self.oracle.legal_targets(&position, square),
            _ => Vec::new(),
        }
    }

    /// Result of the displayed position, counting threefold repetition as a draw.
    pub fn result(&self) -> Outcome {
        let position = self.position();
        match self.oracle.result(&position) {
            Outcome::Undetermined if self.repetitions(&position) >= 3 => Outcome::Draw,
            outcome => outcome,
        }
    }

    pub fn is_over(&self) -> bool {
        self.result() != Outcome::Undetermined
    }

    /// Square of the king in check in the displayed position.
    pub fn king_in_check(&self) -> Option<Square> {
        self.oracle.king_in_check_square(&self.position())
    }

    /// Numbered SAN for `moves` played from the displayed position.
    pub fn variation_san(&self, moves: &[Move]) -> String {
        self.oracle.variation_san(&self.position(), moves)
    }

    /// How often the board of `position` occurs up to the cursor, root included.
    fn repetitions(&self, position: &Position) -> usize {
        let last = match self.cursor {
            Cursor::Live => self.history.len(),
            Cursor::Historical(k) => usize::try_from(k + 1).unwrap_or(0),
        };
        std::iter::once(&self.root)
            .chain(self.history[..last].iter().map(|e| &e.position))
            .filter(|p| p.board() == position.board())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use rechess_core::{STARTING_FEN, StandardOracle};

    use super::*;

    fn session() -> GameSession {
        GameSession::new(Arc::new(StandardOracle), Color::Black, Color::White)
    }

    fn mv(text: &str) -> Move {
        Move::from_uci(text).unwrap()
    }

    fn play(session: &mut GameSession, moves: &[&str]) {
        for text in moves {
            session.apply_move(mv(text)).unwrap();
        }
    }

    #[test]
    fn apply_records_history() {
        let mut game = session();
        let applied = game.apply_move(mv("e2e4")).unwrap();
        assert_eq!(applied.ply, 0);
        assert_eq!(applied.san, "e4");
        assert_eq!(applied.effect, MoveEffect::Quiet);
        assert_eq!(game.len(), 1);
        assert_eq!(game.notation(), ["e4"]);
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(game.arrow(), Some((Square::E2, Square::E4)));
        assert!(game.is_engine_on_turn());
    }

    #[test]
    fn illegal_move_leaves_session_untouched() {
        let mut game = session();
        play(&mut game, &["e2e4"]);
        let before = game.position();
        assert!(game.apply_move(mv("e2e4")).is_err());
        assert_eq!(game.position(), before);
        assert_eq!(game.len(), 1);
        assert_eq!(game.arrow(), Some((Square::E2, Square::E4)));
    }

    #[test]
    fn select_root_then_move_replaces_history() {
        let mut game = session();
        play(&mut game, &["e2e4"]);
        game.select_ply(-1);
        assert_eq!(game.position(), Position::starting());
        assert_eq!(game.cursor(), Cursor::Historical(-1));
        assert_eq!(game.arrow(), None);

        play(&mut game, &["d2d4"]);
        assert_eq!(game.notation(), ["d4"]);
        assert_eq!(game.cursor(), Cursor::Live);
    }

    #[test]
    fn select_then_move_truncates_after_cursor() {
        let mut game = session();
        play(&mut game, &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]);
        game.select_ply(1);
        assert_eq!(game.arrow(), Some((Square::E7, Square::E5)));
        play(&mut game, &["d2d4"]);
        assert_eq!(game.len(), 1 + 2);
        assert_eq!(game.notation(), ["e4", "e5", "d4"]);
    }

    #[test]
    fn select_never_mutates_history() {
        let mut game = session();
        play(&mut game, &["e2e4", "e7e5"]);
        let final_position = game.position();
        game.select_ply(0);
        assert_eq!(game.len(), 2);
        assert_eq!(game.live_position(), final_position);
        assert_eq!(game.side_to_move(), Color::Black);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn select_out_of_range_panics() {
        let mut game = session();
        play(&mut game, &["e2e4"]);
        game.select_ply(1);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn select_below_root_panics() {
        session().select_ply(-2);
    }

    #[test]
    fn legal_targets_only_for_side_to_move_when_live() {
        let mut game = session();
        assert_eq!(game.legal_targets_from(Square::G1), vec![Square::F3, Square::H3]);
        assert!(game.legal_targets_from(Square::G8).is_empty());
        assert!(game.legal_targets_from(Square::E4).is_empty());

        play(&mut game, &["e2e4"]);
        game.select_ply(-1);
        assert!(game.legal_targets_from(Square::G1).is_empty());
    }

    #[test]
    fn fools_mate_is_over() {
        let mut game = session();
        play(&mut game, &["f2f3", "e7e5", "g2g4"]);
        let applied = game.apply_move(mv("d8h4")).unwrap();
        assert_eq!(applied.effect, MoveEffect::GameOver);
        assert!(game.is_over());
        assert_eq!(game.result(), Outcome::BlackWins);
        assert_eq!(game.king_in_check(), Some(Square::E1));
    }

    #[test]
    fn threefold_repetition_is_draw() {
        let mut game = session();
        play(&mut game, &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1"]);
        assert_eq!(game.result(), Outcome::Undetermined);
        play(&mut game, &["f6g8"]);
        assert_eq!(game.result(), Outcome::Draw);

        game.select_ply(3);
        assert_eq!(game.result(), Outcome::Undetermined);
    }

    #[test]
    fn set_fen_replaces_root() {
        let mut game = session();
        play(&mut game, &["e2e4"]);
        game.set_fen("4k3/8/8/8/8/8/4P3/4K3 b - - 0 40").unwrap();
        assert!(game.is_empty());
        assert!(!game.is_in_progress());
        assert_eq!(game.side_to_move(), Color::Black);
        assert_eq!(game.fen(), "4k3/8/8/8/8/8/4P3/4K3 b - - 0 40");

        assert!(game.set_fen("not a fen").is_err());
        assert_eq!(game.root().fullmove_number(), 40);

        game.new_game();
        assert_eq!(game.fen(), STARTING_FEN);
    }

    #[test]
    fn flip_and_engine_color() {
        let mut game = session();
        game.flip_perspective();
        assert_eq!(game.perspective(), Color::Black);
        assert!(!game.is_engine_on_turn());
        game.set_engine_color(Color::White);
        assert!(game.is_engine_on_turn());
    }

    #[test]
    fn variation_from_displayed_position() {
        let game = session();
        assert_eq!(game.variation_san(&[mv("e2e4"), mv("e7e5")]), "1. e4 e5");
    }
}
