//! Core chess types for ReChess: moves, positions, notation and the rules oracle.

mod chess_move;
mod error;
mod notation;
mod oracle;
mod position;
pub mod table;

pub use chess::{Color, Piece, Square};
pub use chess_move::{Move, PromotionPiece};
pub use error::{FenError, MoveError};
pub use oracle::{FIFTY_MOVE_HALFMOVES, MoveEffect, Oracle, Outcome, StandardOracle};
pub use position::{Position, PrettyPosition, STARTING_FEN};
