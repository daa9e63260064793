//! Two-column move table layout: ply numbers to (row, column) cells and back.
//!
//! Row `n` holds move `n + 1`; column 0 is White's half-move and column 1 is
//! Black's. These are plain functions so a display can lay out the notation
//! list without owning any game state.

/// Number of columns in the move table.
pub const COLUMN_COUNT: usize = 2;

/// Column headers, indexed by column.
pub const COLUMN_HEADERS: [&str; COLUMN_COUNT] = ["White", "Black"];

/// Cell holding the half-move at `ply`.
pub const fn to_cell(ply: usize) -> (usize, usize) {
    (ply / 2, ply % 2)
}

/// Ply stored in the cell at `row`, `col`.
pub const fn to_ply(row: usize, col: usize) -> usize {
    2 * row + col
}

/// Rows needed to show `plies` half-moves.
pub const fn row_count(plies: usize) -> usize {
    plies.div_ceil(2)
}

/// Text of the cell at `row`, `col`, or `None` for an empty cell.
pub fn cell_text<S: AsRef<str>>(notation: &[S], row: usize, col: usize) -> Option<&str> {
    if col >= COLUMN_COUNT {
        return None;
    }
    notation.get(to_ply(row, col)).map(AsRef::as_ref)
}

/// Header of the row at `row` (the fullmove number, counted from 1).
pub const fn row_header(row: usize) -> usize {
    row + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_for_first_plies() {
        assert_eq!(to_cell(0), (0, 0));
        assert_eq!(to_cell(1), (0, 1));
        assert_eq!(to_cell(2), (1, 0));
        assert_eq!(to_cell(7), (3, 1));
    }

    #[test]
    fn round_trip() {
        for ply in 0..200 {
            let (row, col) = to_cell(ply);
            assert_eq!(to_ply(row, col), ply);
            assert!(col < COLUMN_COUNT);
        }
    }

    #[test]
    fn row_count_rounds_up() {
        assert_eq!(row_count(0), 0);
        assert_eq!(row_count(1), 1);
        assert_eq!(row_count(2), 1);
        assert_eq!(row_count(3), 2);
        for n in 0..100 {
            assert_eq!(row_count(n), (n + 1) / 2);
        }
    }

    #[test]
    fn cell_text_lookup() {
        let notation = vec!["e4".to_string(), "e5".to_string(), "Nf3".to_string()];
        assert_eq!(cell_text(&notation, 0, 0), Some("e4"));
        assert_eq!(cell_text(&notation, 0, 1), Some("e5"));
        assert_eq!(cell_text(&notation, 1, 0), Some("Nf3"));
        assert_eq!(cell_text(&notation, 1, 1), None);
        assert_eq!(cell_text(&notation, 0, 2), None);
    }

    #[test]
    fn headers() {
        assert_eq!(COLUMN_HEADERS[0], "White");
        assert_eq!(row_header(0), 1);
    }
}
