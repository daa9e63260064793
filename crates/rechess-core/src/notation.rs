//! Standard algebraic notation (SAN) for single moves.

use chess::{Board, BoardStatus, ChessMove, EMPTY, MoveGen, Piece};

/// Render a legal `mv` in SAN relative to `board`, with `+`/`#` suffixes.
pub(crate) fn san(board: &Board, mv: ChessMove) -> String {
    let source = mv.get_source();
    let dest = mv.get_dest();
    let piece = board.piece_on(source).unwrap_or(Piece::Pawn);

    let mut text = String::new();

    let file_distance = source.get_file().to_index().abs_diff(dest.get_file().to_index());
    if piece == Piece::King && file_distance == 2 {
        if dest.get_file().to_index() > source.get_file().to_index() {
            text.push_str("O-O");
        } else {
            text.push_str("O-O-O");
        }
    } else {
        let is_capture = board.piece_on(dest).is_some()
            || (piece == Piece::Pawn && source.get_file() != dest.get_file());

        if piece == Piece::Pawn {
            if is_capture {
                text.push(file_char(source.get_file().to_index()));
            }
        } else {
            text.push(piece_letter(piece));
            text.push_str(&disambiguation(board, mv, piece));
        }

        if is_capture {
            text.push('x');
        }
        text.push_str(&dest.to_string());

        if let Some(promo) = mv.get_promotion() {
            text.push('=');
            text.push(piece_letter(promo));
        }
    }

    let after = board.make_move_new(mv);
    if after.status() == BoardStatus::Checkmate {
        text.push('#');
    } else if *after.checkers() != EMPTY {
        text.push('+');
    }

    text
}

/// Origin file, rank, or both, when another piece of the same kind can reach the same square.
fn disambiguation(board: &Board, mv: ChessMove, piece: Piece) -> String {
    let source = mv.get_source();
    let rivals: Vec<ChessMove> = MoveGen::new_legal(board)
        .filter(|other| {
            other.get_dest() == mv.get_dest()
                && other.get_source() != source
                && board.piece_on(other.get_source()) == Some(piece)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let shares_file = rivals
        .iter()
        .any(|other| other.get_source().get_file() == source.get_file());
    let shares_rank = rivals
        .iter()
        .any(|other| other.get_source().get_rank() == source.get_rank());

    let file = file_char(source.get_file().to_index());
    let rank = rank_char(source.get_rank().to_index());
    match (shares_file, shares_rank) {
        (false, _) => file.to_string(),
        (true, false) => rank.to_string(),
        (true, true) => format!("{file}{rank}"),
    }
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn file_char(index: usize) -> char {
    (b'a' + index as u8) as char
}

fn rank_char(index: usize) -> char {
    (b'1' + index as u8) as char
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chess::{Board, ChessMove, Piece, Square};

    use super::san;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).unwrap()
    }

    #[test]
    fn pawn_push() {
        let b = Board::default();
        assert_eq!(san(&b, ChessMove::new(Square::E2, Square::E4, None)), "e4");
    }

    #[test]
    fn knight_development() {
        let b = Board::default();
        assert_eq!(san(&b, ChessMove::new(Square::G1, Square::F3, None)), "Nf3");
    }

    #[test]
    fn pawn_capture_uses_origin_file() {
        let b = board("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2");
        assert_eq!(san(&b, ChessMove::new(Square::E4, Square::D5, None)), "exd5");
    }

    #[test]
    fn castling_both_sides() {
        let b = board("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(san(&b, ChessMove::new(Square::E1, Square::G1, None)), "O-O");
        assert_eq!(san(&b, ChessMove::new(Square::E1, Square::C1, None)), "O-O-O");
    }

    #[test]
    fn file_disambiguation() {
        let b = board("4k3/8/8/8/8/8/8/R4RK1 w - - 0 1");
        assert_eq!(san(&b, ChessMove::new(Square::A1, Square::D1, None)), "Rad1");
    }

    #[test]
    fn rank_disambiguation() {
        let b = board("4k3/8/8/R7/8/8/8/R3K3 w - - 0 1");
        assert_eq!(san(&b, ChessMove::new(Square::A1, Square::A3, None)), "R1a3");
    }

    #[test]
    fn promotion_with_check() {
        let b = board("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(
            san(&b, ChessMove::new(Square::B7, Square::B8, Some(Piece::Queen))),
            "b8=Q+"
        );
    }

    #[test]
    fn checkmate_suffix() {
        let b = board("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4");
        assert_eq!(san(&b, ChessMove::new(Square::H5, Square::F7, None)), "Qxf7#");
    }
}
