//! Error types for move parsing, move legality and FEN parsing.

/// Errors produced when a move cannot be parsed or is not legal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The text is not a well-formed UCI move such as `e2e4` or `e7e8q`.
    #[error("invalid UCI move: \"{text}\"")]
    InvalidUci {
        /// The text that failed to parse.
        text: String,
    },

    /// The move is well-formed but not legal in the given position.
    #[error("illegal move {uci_move} in position {fen}")]
    Illegal {
        /// The rejected move in UCI notation.
        uci_move: String,
        /// The position the move was checked against.
        fen: String,
    },
}

/// Errors that occur when parsing a FEN string into a position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    /// The FEN string has neither 4 nor 6 space-separated fields.
    #[error("expected 4 or 6 FEN fields, found {found}")]
    WrongFieldCount {
        /// Number of fields found.
        found: usize,
    },

    /// The placement, side, castling or en passant fields do not describe a sane board.
    #[error("invalid board: \"{fen}\"")]
    InvalidBoard {
        /// The offending FEN string.
        fen: String,
    },

    /// A move counter (halfmove clock or fullmove number) is not a valid number.
    #[error("invalid {field}: \"{found}\"")]
    InvalidMoveCounter {
        /// The field name ("halfmove clock" or "fullmove number").
        field: &'static str,
        /// The invalid string.
        found: String,
    },
}
