//! A complete chess position: board state plus the FEN move counters.

use std::fmt;
use std::str::FromStr;

use chess::{Board, ChessMove, Color, File, Piece, Rank, Square};

use crate::error::FenError;

/// The FEN string for the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A chess position that round-trips through FEN.
///
/// The rules crate's [`Board`] does not track the halfmove clock or the
/// fullmove number, so they are carried alongside it. Positions recorded in a
/// game history are never mutated; applying a move produces a new one.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Position {
    /// Return the standard starting position.
    pub fn starting() -> Position {
        Position {
            board: Board::default(),
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// The underlying board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Which side moves next.
    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Halfmoves since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Fullmove number, starting at 1 and incremented after Black moves.
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// The piece and its color on `square`, if any.
    pub fn piece_on(&self, square: Square) -> Option<(Piece, Color)> {
        Some((self.board.piece_on(square)?, self.board.color_on(square)?))
    }

    /// Play an already-validated move and update the counters.
    pub(crate) fn after(&self, mv: ChessMove) -> Position {
        let is_pawn_move = self.board.piece_on(mv.get_source()) == Some(Piece::Pawn);
        let is_capture = self.board.piece_on(mv.get_dest()).is_some();

        let halfmove_clock = if is_pawn_move || is_capture {
            0
        } else {
            self.halfmove_clock + 1
        };
        let fullmove_number = match self.side_to_move() {
            Color::White => self.fullmove_number,
            Color::Black => self.fullmove_number + 1,
        };

        Position {
            board: self.board.make_move_new(mv),
            halfmove_clock,
            fullmove_number,
        }
    }

    /// Serialize as a 6-field FEN string.
    pub fn fen(&self) -> String {
        let board_fen = self.board.to_string();
        let fields: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            fields.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Wrapper that prints the position as an 8x8 grid with `bottom` nearest the viewer.
    pub fn pretty(&self, bottom: Color) -> PrettyPosition<'_> {
        PrettyPosition {
            position: self,
            bottom,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::starting()
    }
}

impl FromStr for Position {
    type Err = FenError;

    /// Parse a FEN string. The two move counters are optional and default to `0 1`.
    fn from_str(fen: &str) -> Result<Position, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 4 && fields.len() != 6 {
            return Err(FenError::WrongFieldCount {
                found: fields.len(),
            });
        }

        let (halfmove_clock, fullmove_number) = if fields.len() == 6 {
            let halfmove = fields[4]
                .parse::<u32>()
                .map_err(|_| FenError::InvalidMoveCounter {
                    field: "halfmove clock",
                    found: fields[4].to_string(),
                })?;
            let fullmove = fields[5]
                .parse::<u32>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| FenError::InvalidMoveCounter {
                    field: "fullmove number",
                    found: fields[5].to_string(),
                })?;
            (halfmove, fullmove)
        } else {
            (0, 1)
        };

        let normalized = format!("{} 0 1", fields[..4].join(" "));
        let board = Board::from_str(&normalized).map_err(|_| FenError::InvalidBoard {
            fen: fen.to_string(),
        })?;

        Ok(Position {
            board,
            halfmove_clock,
            fullmove_number,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position(\"{}\")", self.fen())
    }
}

/// Wrapper for pretty-printing a position as an 8x8 grid.
pub struct PrettyPosition<'a> {
    position: &'a Position,
    bottom: Color,
}

impl fmt::Display for PrettyPosition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ranks: Vec<usize> = match self.bottom {
            Color::White => (0..8).rev().collect(),
            Color::Black => (0..8).collect(),
        };
        let files: Vec<usize> = match self.bottom {
            Color::White => (0..8).collect(),
            Color::Black => (0..8).rev().collect(),
        };

        for &rank_idx in &ranks {
            write!(f, "{}  ", rank_idx + 1)?;
            for (i, &file_idx) in files.iter().enumerate() {
                let sq = Square::make_square(Rank::from_index(rank_idx), File::from_index(file_idx));
                let c = match self.position.piece_on(sq) {
                    Some((piece, color)) => piece_char(piece, color),
                    None => '.',
                };
                if i < 7 {
                    write!(f, "{c} ")?;
                } else {
                    write!(f, "{c}")?;
                }
            }
            writeln!(f)?;
        }

        let footer: String = files
            .iter()
            .map(|&file_idx| (b'a' + file_idx as u8) as char)
            .map(String::from)
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "   {footer}")
    }
}

fn piece_char(piece: Piece, color: Color) -> char {
    let c = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => c.to_ascii_uppercase(),
        Color::Black => c,
    }
}

#[cfg(test)]
mod tests {
    use chess::{ChessMove, Color, Piece, Square};

    use super::{Position, STARTING_FEN};

    #[test]
    fn starting_position_fen() {
        assert_eq!(Position::starting().fen(), STARTING_FEN);
    }

    #[test]
    fn parse_starting_fen() {
        let pos: Position = STARTING_FEN.parse().unwrap();
        assert_eq!(pos, Position::starting());
    }

    #[test]
    fn parse_four_field_fen_defaults_counters() {
        let pos: Position = "8/8/8/3k4/8/3K4/4P3/8 w - -".parse().unwrap();
        assert_eq!(pos.halfmove_clock(), 0);
        assert_eq!(pos.fullmove_number(), 1);
    }

    #[test]
    fn parse_keeps_counters() {
        let pos: Position = "8/8/8/3k4/8/3K4/4P3/8 b - - 12 40".parse().unwrap();
        assert_eq!(pos.halfmove_clock(), 12);
        assert_eq!(pos.fullmove_number(), 40);
        assert_eq!(pos.side_to_move(), Color::Black);
        assert!(pos.fen().ends_with(" b - - 12 40"));
    }

    #[test]
    fn reject_bad_fens() {
        assert!("".parse::<Position>().is_err());
        assert!("not a fen".parse::<Position>().is_err());
        assert!("8/8/8/8/8/8/8/8 w - - 0 1".parse::<Position>().is_err());
        assert!("8/8/8/3k4/8/3K4/4P3/8 w - - x 1".parse::<Position>().is_err());
        assert!("8/8/8/3k4/8/3K4/4P3/8 w - - 0 0".parse::<Position>().is_err());
    }

    #[test]
    fn counters_follow_moves() {
        let start = Position::starting();
        let after_knight = start.after(ChessMove::new(Square::G1, Square::F3, None));
        assert_eq!(after_knight.halfmove_clock(), 1);
        assert_eq!(after_knight.fullmove_number(), 1);

        let after_pawn = after_knight.after(ChessMove::new(Square::E7, Square::E5, None));
        assert_eq!(after_pawn.halfmove_clock(), 0);
        assert_eq!(after_pawn.fullmove_number(), 2);
    }

    #[test]
    fn piece_on_reports_color() {
        let pos = Position::starting();
        assert_eq!(pos.piece_on(Square::E1), Some((Piece::King, Color::White)));
        assert_eq!(pos.piece_on(Square::D8), Some((Piece::Queen, Color::Black)));
        assert_eq!(pos.piece_on(Square::E4), None);
    }

    #[test]
    fn pretty_respects_orientation() {
        let pos = Position::starting();
        let white = pos.pretty(Color::White).to_string();
        let black = pos.pretty(Color::Black).to_string();
        assert!(white.starts_with("8  r n b q k b n r"));
        assert!(white.ends_with("   a b c d e f g h"));
        assert!(black.starts_with("1  R N B K Q B N R"));
        assert!(black.ends_with("   h g f e d c b a"));
    }
}
