//! The position oracle: move legality, move application and game outcome.
//!
//! Everything rule-related goes through [`Oracle`]. Game state never decides
//! legality on its own. [`StandardOracle`] implements the trait for orthodox
//! chess.

use std::fmt;

use chess::{BitBoard, BoardStatus, ChessMove, Color, EMPTY, MoveGen, Piece, Square};

use crate::chess_move::{Move, PromotionPiece};
use crate::error::MoveError;
use crate::notation;
use crate::position::Position;

/// Halfmove clock value at which a draw may be claimed (fifty moves each).
pub const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Result of a game as seen from a single position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The game is still going.
    Undetermined,
    Draw,
    WhiteWins,
    BlackWins,
}

impl Outcome {
    /// The outcome when `loser` runs out of time or is mated.
    pub fn loss_for(loser: Color) -> Outcome {
        match loser {
            Color::White => Outcome::BlackWins,
            Color::Black => Outcome::WhiteWins,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Undetermined => write!(f, "Undetermined game"),
            Outcome::Draw => write!(f, "Draw"),
            Outcome::WhiteWins => write!(f, "White wins"),
            Outcome::BlackWins => write!(f, "Black wins"),
        }
    }
}

/// What kind of move was played, for feedback such as sound effects.
///
/// When several apply, the first in declaration order wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveEffect {
    GameOver,
    Check,
    Promotion,
    Capture,
    Castling,
    Quiet,
}

/// Chess rules, consulted by the game session for everything legality-related.
pub trait Oracle: Send + Sync {
    /// Find the legal move from `origin` to `target`.
    ///
    /// A pawn reaching the last rank without an explicit `promotion` promotes
    /// to a queen.
    fn legal_move(
        &self,
        position: &Position,
        origin: Square,
        target: Square,
        promotion: Option<PromotionPiece>,
    ) -> Result<Move, MoveError>;

    /// Return `true` if `mv` is legal in `position`.
    fn is_legal(&self, position: &Position, mv: Move) -> bool;

    /// Apply a legal move, returning the new position and the move's SAN.
    fn apply(&self, position: &Position, mv: Move) -> Result<(Position, String), MoveError>;

    /// Return `true` if the game cannot continue from `position`.
    fn is_over(&self, position: &Position) -> bool {
        self.result(position) != Outcome::Undetermined
    }

    /// Outcome determined by `position` alone.
    fn result(&self, position: &Position) -> Outcome;

    /// Square of the side to move's king when it is in check.
    fn king_in_check_square(&self, position: &Position) -> Option<Square>;

    /// Target squares of the legal moves of the piece on `square`.
    fn legal_targets(&self, position: &Position, square: Square) -> Vec<Square>;

    /// Classify a legal move before it is played.
    fn effect(&self, position: &Position, mv: Move) -> MoveEffect;

    /// Render `moves`, played in order from `position`, as numbered SAN.
    ///
    /// Rendering stops at the first illegal move.
    fn variation_san(&self, position: &Position, moves: &[Move]) -> String {
        let mut parts = Vec::with_capacity(moves.len() + moves.len() / 2 + 1);
        let mut current = *position;

        for (i, &mv) in moves.iter().enumerate() {
            let Ok((next, san)) = self.apply(&current, mv) else {
                break;
            };
            match current.side_to_move() {
                Color::White => parts.push(format!("{}.", current.fullmove_number())),
                Color::Black if i == 0 => parts.push(format!("{}...", current.fullmove_number())),
                Color::Black => {}
            }
            parts.push(san);
            current = next;
        }

        parts.join(" ")
    }
}

/// Orthodox chess rules backed by the `chess` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardOracle;

impl StandardOracle {
    fn illegal(position: &Position, mv: Move) -> MoveError {
        MoveError::Illegal {
            uci_move: mv.to_uci(),
            fen: position.fen(),
        }
    }
}

impl Oracle for StandardOracle {
    fn legal_move(
        &self,
        position: &Position,
        origin: Square,
        target: Square,
        promotion: Option<PromotionPiece>,
    ) -> Result<Move, MoveError> {
        let candidates: Vec<ChessMove> = MoveGen::new_legal(position.board())
            .filter(|m| m.get_source() == origin && m.get_dest() == target)
            .collect();

        let wanted = promotion.unwrap_or(PromotionPiece::Queen).to_piece();
        let found = candidates
            .iter()
            .find(|m| m.get_promotion().is_none_or(|p| p == wanted))
            .copied();

        found.map(Move::from).ok_or_else(|| {
            Self::illegal(
                position,
                match promotion {
                    Some(promo) => Move::with_promotion(origin, target, promo),
                    None => Move::new(origin, target),
                },
            )
        })
    }

    fn is_legal(&self, position: &Position, mv: Move) -> bool {
        let chess_move: ChessMove = mv.into();
        MoveGen::new_legal(position.board()).any(|m| m == chess_move)
    }

    fn apply(&self, position: &Position, mv: Move) -> Result<(Position, String), MoveError> {
        if !self.is_legal(position, mv) {
            return Err(Self::illegal(position, mv));
        }
        let chess_move: ChessMove = mv.into();
        let san = notation::san(position.board(), chess_move);
        Ok((position.after(chess_move), san))
    }

    fn result(&self, position: &Position) -> Outcome {
        let board = position.board();
        match board.status() {
            BoardStatus::Checkmate => Outcome::loss_for(board.side_to_move()),
            BoardStatus::Stalemate => Outcome::Draw,
            BoardStatus::Ongoing => {
                if position.halfmove_clock() >= FIFTY_MOVE_HALFMOVES
                    || has_insufficient_material(position)
                {
                    Outcome::Draw
                } else {
                    Outcome::Undetermined
                }
            }
        }
    }

    fn king_in_check_square(&self, position: &Position) -> Option<Square> {
        let board = position.board();
        if *board.checkers() == EMPTY {
            return None;
        }
        Some(board.king_square(board.side_to_move()))
    }

    fn legal_targets(&self, position: &Position, square: Square) -> Vec<Square> {
        let mut targets: Vec<Square> = MoveGen::new_legal(position.board())
            .filter(|m| m.get_source() == square)
            .map(|m| m.get_dest())
            .collect();
        targets.sort_by_key(|sq| sq.to_index());
        targets.dedup();
        targets
    }

    fn effect(&self, position: &Position, mv: Move) -> MoveEffect {
        let board = position.board();
        let chess_move: ChessMove = mv.into();
        let after = position.after(chess_move);
        let piece = board.piece_on(mv.origin());

        if self.is_over(&after) {
            MoveEffect::GameOver
        } else if *after.board().checkers() != EMPTY {
            MoveEffect::Check
        } else if mv.promotion().is_some() {
            MoveEffect::Promotion
        } else if board.piece_on(mv.target()).is_some()
            || (piece == Some(Piece::Pawn) && mv.origin().get_file() != mv.target().get_file())
        {
            MoveEffect::Capture
        } else if piece == Some(Piece::King)
            && mv.origin().get_file().to_index().abs_diff(mv.target().get_file().to_index()) == 2
        {
            MoveEffect::Castling
        } else {
            MoveEffect::Quiet
        }
    }
}

/// Return `true` when neither side can possibly deliver mate.
///
/// Covers king against king, a single minor piece against a bare king, and
/// one bishop each on squares of the same color.
fn has_insufficient_material(position: &Position) -> bool {
    let board = position.board();
    let heavy_or_pawns = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
    if heavy_or_pawns != EMPTY {
        return false;
    }

    let knights = *board.pieces(Piece::Knight);
    let bishops = *board.pieces(Piece::Bishop);
    let minors = (knights | bishops).popcnt();

    if minors <= 1 {
        return true;
    }

    // Exactly one bishop per side, both on the same square color.
    if knights == EMPTY && bishops.popcnt() == 2 {
        let white = bishops & *board.color_combined(Color::White);
        let black = bishops & *board.color_combined(Color::Black);
        if white.popcnt() == 1 && black.popcnt() == 1 {
            return square_shade(white) == square_shade(black);
        }
    }

    false
}

fn square_shade(single: BitBoard) -> usize {
    let sq = single.to_square();
    (sq.get_rank().to_index() + sq.get_file().to_index()) % 2
}

#[cfg(test)]
mod tests {
    use chess::{Color, Square};

    use super::{MoveEffect, Oracle, Outcome, StandardOracle};
    use crate::chess_move::{Move, PromotionPiece};
    use crate::position::Position;

    fn pos(fen: &str) -> Position {
        fen.parse().unwrap()
    }

    #[test]
    fn legal_move_found() {
        let mv = StandardOracle
            .legal_move(&Position::starting(), Square::E2, Square::E4, None)
            .unwrap();
        assert_eq!(mv, Move::new(Square::E2, Square::E4));
    }

    #[test]
    fn illegal_move_rejected() {
        let err = StandardOracle.legal_move(&Position::starting(), Square::E2, Square::E5, None);
        assert!(err.is_err());
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let p = pos("8/P7/8/8/8/8/8/k1K5 w - - 0 1");
        let mv = StandardOracle.legal_move(&p, Square::A7, Square::A8, None).unwrap();
        assert_eq!(mv.promotion(), Some(PromotionPiece::Queen));

        let under = StandardOracle
            .legal_move(&p, Square::A7, Square::A8, Some(PromotionPiece::Knight))
            .unwrap();
        assert_eq!(under.promotion(), Some(PromotionPiece::Knight));
    }

    #[test]
    fn apply_returns_san() {
        let (after, san) = StandardOracle
            .apply(&Position::starting(), Move::new(Square::G1, Square::F3))
            .unwrap();
        assert_eq!(san, "Nf3");
        assert_eq!(after.side_to_move(), Color::Black);
    }

    #[test]
    fn apply_rejects_illegal() {
        let result = StandardOracle.apply(&Position::starting(), Move::new(Square::E1, Square::E2));
        assert!(result.is_err());
    }

    #[test]
    fn checkmate_result() {
        let p = pos("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert_eq!(StandardOracle.result(&p), Outcome::BlackWins);
        assert!(StandardOracle.is_over(&p));
        assert_eq!(StandardOracle.king_in_check_square(&p), Some(Square::E1));
    }

    #[test]
    fn stalemate_is_draw() {
        let p = pos("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(StandardOracle.result(&p), Outcome::Draw);
    }

    #[test]
    fn insufficient_material_is_draw() {
        assert_eq!(StandardOracle.result(&pos("8/8/8/3k4/8/3K4/8/8 w - - 0 1")), Outcome::Draw);
        assert_eq!(StandardOracle.result(&pos("8/8/8/3k4/8/3K1N2/8/8 w - - 0 1")), Outcome::Draw);
        assert_eq!(
            StandardOracle.result(&pos("8/8/8/3k4/8/3K4/4P3/8 w - - 0 1")),
            Outcome::Undetermined
        );
    }

    #[test]
    fn same_colored_bishops_are_draw() {
        // c1 and f8 are both dark squares.
        let p = pos("5b2/8/8/3k4/8/3K4/8/2B5 w - - 0 1");
        assert_eq!(StandardOracle.result(&p), Outcome::Draw);
    }

    #[test]
    fn fifty_move_rule_is_draw() {
        let p = pos("8/8/8/3k4/8/3K4/3R4/8 w - - 100 80");
        assert_eq!(StandardOracle.result(&p), Outcome::Draw);
    }

    #[test]
    fn starting_position_is_undetermined() {
        assert_eq!(StandardOracle.result(&Position::starting()), Outcome::Undetermined);
        assert_eq!(StandardOracle.king_in_check_square(&Position::starting()), None);
    }

    #[test]
    fn legal_targets_for_knight() {
        let targets = StandardOracle.legal_targets(&Position::starting(), Square::G1);
        assert_eq!(targets, vec![Square::F3, Square::H3]);
    }

    #[test]
    fn legal_targets_empty_square() {
        assert!(StandardOracle.legal_targets(&Position::starting(), Square::E4).is_empty());
    }

    #[test]
    fn promotion_targets_are_deduplicated() {
        let p = pos("8/P7/8/8/8/8/8/k1K5 w - - 0 1");
        assert_eq!(StandardOracle.legal_targets(&p, Square::A7), vec![Square::A8]);
    }

    #[test]
    fn move_effects() {
        let start = Position::starting();
        assert_eq!(
            StandardOracle.effect(&start, Move::new(Square::E2, Square::E4)),
            MoveEffect::Quiet
        );

        let castle = pos("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(
            StandardOracle.effect(&castle, Move::new(Square::E1, Square::G1)),
            MoveEffect::Castling
        );

        let capture = pos("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2");
        assert_eq!(
            StandardOracle.effect(&capture, Move::new(Square::E4, Square::D5)),
            MoveEffect::Capture
        );

        let mate = pos("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
        assert_eq!(
            StandardOracle.effect(&mate, Move::new(Square::H5, Square::F7)),
            MoveEffect::GameOver
        );
    }

    #[test]
    fn variation_from_white() {
        let moves: Vec<Move> = ["e2e4", "e7e5", "g1f3"]
            .iter()
            .map(|m| m.parse().unwrap())
            .collect();
        let text = StandardOracle.variation_san(&Position::starting(), &moves);
        assert_eq!(text, "1. e4 e5 2. Nf3");
    }

    #[test]
    fn variation_from_black() {
        let p = pos("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        let moves: Vec<Move> = ["e7e5", "g1f3"].iter().map(|m| m.parse().unwrap()).collect();
        assert_eq!(StandardOracle.variation_san(&p, &moves), "1... e5 2. Nf3");
    }

    #[test]
    fn variation_stops_at_illegal_move() {
        let moves: Vec<Move> = ["e2e4", "e2e4"].iter().map(|m| m.parse().unwrap()).collect();
        assert_eq!(StandardOracle.variation_san(&Position::starting(), &moves), "1. e4");
    }

    #[test]
    fn outcome_display() {
        assert_eq!(Outcome::WhiteWins.to_string(), "White wins");
        assert_eq!(Outcome::Draw.to_string(), "Draw");
        assert_eq!(Outcome::loss_for(Color::White), Outcome::BlackWins);
    }
}
