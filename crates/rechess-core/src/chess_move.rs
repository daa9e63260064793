//! Chess move representation: origin square, target square and an optional promotion.

use std::fmt;
use std::str::FromStr;

use chess::{ChessMove, Piece, Square};

use crate::error::MoveError;

/// The piece a pawn promotes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromotionPiece {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl PromotionPiece {
    /// All promotion pieces, weakest first.
    pub const ALL: [PromotionPiece; 4] = [
        PromotionPiece::Knight,
        PromotionPiece::Bishop,
        PromotionPiece::Rook,
        PromotionPiece::Queen,
    ];

    /// Return the UCI character for this promotion.
    pub const fn uci_char(self) -> char {
        match self {
            PromotionPiece::Knight => 'n',
            PromotionPiece::Bishop => 'b',
            PromotionPiece::Rook => 'r',
            PromotionPiece::Queen => 'q',
        }
    }

    /// Parse a UCI promotion character (case-insensitive).
    pub fn from_uci_char(c: char) -> Option<PromotionPiece> {
        match c.to_ascii_lowercase() {
            'n' => Some(PromotionPiece::Knight),
            'b' => Some(PromotionPiece::Bishop),
            'r' => Some(PromotionPiece::Rook),
            'q' => Some(PromotionPiece::Queen),
            _ => None,
        }
    }

    /// Convert to the rules crate's piece type.
    pub const fn to_piece(self) -> Piece {
        match self {
            PromotionPiece::Knight => Piece::Knight,
            PromotionPiece::Bishop => Piece::Bishop,
            PromotionPiece::Rook => Piece::Rook,
            PromotionPiece::Queen => Piece::Queen,
        }
    }

    /// Convert from the rules crate's piece type; pawns and kings yield `None`.
    pub const fn from_piece(piece: Piece) -> Option<PromotionPiece> {
        match piece {
            Piece::Knight => Some(PromotionPiece::Knight),
            Piece::Bishop => Some(PromotionPiece::Bishop),
            Piece::Rook => Some(PromotionPiece::Rook),
            Piece::Queen => Some(PromotionPiece::Queen),
            Piece::Pawn | Piece::King => None,
        }
    }
}

/// A move from one square to another, with a promotion piece for pawns reaching the last rank.
///
/// Equality is structural. Whether a move is legal depends on a position and is
/// answered by an [`Oracle`](crate::Oracle), never by this type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    origin: Square,
    target: Square,
    promotion: Option<PromotionPiece>,
}

impl Move {
    /// Create a move without promotion.
    pub const fn new(origin: Square, target: Square) -> Move {
        Move {
            origin,
            target,
            promotion: None,
        }
    }

    /// Create a promotion move.
    pub const fn with_promotion(origin: Square, target: Square, promotion: PromotionPiece) -> Move {
        Move {
            origin,
            target,
            promotion: Some(promotion),
        }
    }

    /// The square the piece leaves.
    pub const fn origin(self) -> Square {
        self.origin
    }

    /// The square the piece lands on.
    pub const fn target(self) -> Square {
        self.target
    }

    /// The promotion piece, if any.
    pub const fn promotion(self) -> Option<PromotionPiece> {
        self.promotion
    }

    /// Return the UCI string representation (`e2e4`, `e7e8q`).
    pub fn to_uci(self) -> String {
        match self.promotion {
            Some(promo) => format!("{}{}{}", self.origin, self.target, promo.uci_char()),
            None => format!("{}{}", self.origin, self.target),
        }
    }

    /// Parse a UCI move string. Only the syntax is checked.
    pub fn from_uci(text: &str) -> Result<Move, MoveError> {
        let invalid = || MoveError::InvalidUci {
            text: text.to_string(),
        };

        if !text.is_ascii() || !(4..=5).contains(&text.len()) {
            return Err(invalid());
        }

        let origin = Square::from_str(&text[0..2]).map_err(|_| invalid())?;
        let target = Square::from_str(&text[2..4]).map_err(|_| invalid())?;
        let promotion = match text[4..].chars().next() {
            Some(c) => Some(PromotionPiece::from_uci_char(c).ok_or_else(invalid)?),
            None => None,
        };

        Ok(Move {
            origin,
            target,
            promotion,
        })
    }
}

impl From<Move> for ChessMove {
    fn from(mv: Move) -> ChessMove {
        ChessMove::new(mv.origin, mv.target, mv.promotion.map(PromotionPiece::to_piece))
    }
}

impl From<ChessMove> for Move {
    fn from(mv: ChessMove) -> Move {
        Move {
            origin: mv.get_source(),
            target: mv.get_dest(),
            promotion: mv.get_promotion().and_then(PromotionPiece::from_piece),
        }
    }
}

impl FromStr for Move {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Move, MoveError> {
        Move::from_uci(s)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_uci())
    }
}

#[cfg(test)]
mod tests {
    use chess::Square;

    use super::{Move, PromotionPiece};

    #[test]
    fn parse_quiet_move() {
        let mv = Move::from_uci("e2e4").unwrap();
        assert_eq!(mv.origin(), Square::E2);
        assert_eq!(mv.target(), Square::E4);
        assert_eq!(mv.promotion(), None);
    }

    #[test]
    fn parse_promotion() {
        let mv = Move::from_uci("a7a8n").unwrap();
        assert_eq!(mv.promotion(), Some(PromotionPiece::Knight));
        assert_eq!(mv.to_uci(), "a7a8n");
    }

    #[test]
    fn reject_malformed() {
        assert!(Move::from_uci("").is_err());
        assert!(Move::from_uci("e2").is_err());
        assert!(Move::from_uci("e2e9").is_err());
        assert!(Move::from_uci("e7e8k").is_err());
        assert!(Move::from_uci("e7e8qq").is_err());
        assert!(Move::from_uci("0000").is_err());
    }

    #[test]
    fn structural_equality() {
        assert_eq!(Move::new(Square::G1, Square::F3), "g1f3".parse().unwrap());
        assert_ne!(
            Move::new(Square::E7, Square::E8),
            Move::with_promotion(Square::E7, Square::E8, PromotionPiece::Queen)
        );
    }

    #[test]
    fn chess_move_conversion_keeps_promotion() {
        let mv = Move::with_promotion(Square::B2, Square::B1, PromotionPiece::Rook);
        let converted: chess::ChessMove = mv.into();
        assert_eq!(Move::from(converted), mv);
    }

    #[test]
    fn debug_and_display() {
        let mv = Move::new(Square::E2, Square::E4);
        assert_eq!(format!("{mv}"), "e2e4");
        assert_eq!(format!("{mv:?}"), "Move(e2e4)");
    }
}
