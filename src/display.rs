//! Plain-text rendering of the controller's state and notifications.

use std::fmt::Write;

use rechess_core::table::{COLUMN_HEADERS, cell_text, row_count, row_header};
use rechess_core::{Color, MoveEffect};
use rechess_game::{Controller, Cursor, Notification, format_time};

/// Text for one notification, or `None` when the redrawn board says it all.
pub fn describe(note: &Notification) -> Option<String> {
    let text = match note {
        Notification::MoveApplied(applied) => {
            let effect = match applied.effect {
                MoveEffect::GameOver => " (game over)",
                MoveEffect::Check => " (check)",
                MoveEffect::Promotion => " (promotion)",
                MoveEffect::Capture => " (capture)",
                MoveEffect::Castling => " (castling)",
                MoveEffect::Quiet => "",
            };
            let dots = if applied.ply % 2 == 0 { "." } else { "..." };
            format!("{}{dots} {}{effect}", applied.ply / 2 + 1, applied.san)
        }
        Notification::MoveRejected(e) => format!("illegal move: {e}"),
        Notification::InvalidFen(e) => format!("invalid FEN: {e}"),
        Notification::EngineThinking => "engine thinking...".to_string(),
        Notification::EngineMovePlayed(mv) => format!("engine plays {mv}"),
        Notification::AnalysisUpdate(analysis) => format!(
            "depth {} score {} bar {}  {}",
            analysis.depth,
            analysis.score,
            analysis.bar,
            analysis.variation
        ),
        Notification::AnalysisStopped => "analysis stopped".to_string(),
        Notification::TimeExpired(side) => format!("{} ran out of time", side_name(*side)),
        Notification::GameOver(outcome) => format!("game over: {outcome}"),
        Notification::EngineLoaded(name) => format!("engine loaded: {name}"),
        Notification::EngineError(e) => format!("engine error: {e}"),
        Notification::PositionChanged => return None,
    };
    Some(text)
}

/// Whether a batch changes what the board shows.
pub fn needs_board(notes: &[Notification]) -> bool {
    notes.iter().any(|note| {
        matches!(
            note,
            Notification::MoveApplied(_) | Notification::PositionChanged
        )
    })
}

/// Board, clocks and move table as shown after a position change.
pub fn render(controller: &Controller) -> String {
    let game = controller.game();
    let clock = controller.clock();
    let mut out = String::new();

    let top = !game.perspective();
    let _ = writeln!(out, "{:>20}", clock_line(controller, top));
    let _ = writeln!(out, "{}", game.position().pretty(game.perspective()));
    let _ = writeln!(out, "{:>20}", clock_line(controller, game.perspective()));

    if let Some((origin, target)) = game.arrow() {
        let _ = writeln!(out, "arrow: {origin}-{target}");
    }
    if let Some(square) = game.king_in_check() {
        let _ = writeln!(out, "check on {square}");
    }

    let notation = game.notation();
    if !notation.is_empty() {
        let [white, black] = COLUMN_HEADERS;
        let _ = writeln!(out, "     {white:<8} {black}");
    }
    for row in 0..row_count(notation.len()) {
        let white = cell_text(&notation, row, 0).unwrap_or("");
        let black = cell_text(&notation, row, 1).unwrap_or("");
        let _ = writeln!(out, "{:>3}. {white:<8} {black}", row_header(row));
    }
    if let Cursor::Historical(k) = game.cursor() {
        let _ = writeln!(out, "viewing ply {k} of {}", game.len());
    }
    if clock.running().is_none() && game.is_over() {
        let _ = writeln!(out, "{}", game.result());
    }
    out
}

fn clock_line(controller: &Controller, side: Color) -> String {
    let marker = if controller.clock().running() == Some(side) {
        "*"
    } else {
        " "
    };
    format!(
        "{marker}{} {}",
        side_name(side),
        format_time(controller.clock().remaining(side))
    )
}

fn side_name(side: Color) -> &'static str {
    match side {
        Color::White => "White",
        Color::Black => "Black",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::mpsc;

    use rechess_core::{Outcome, Square, StandardOracle};
    use rechess_game::{Event, SessionConfig};

    use super::*;

    #[test]
    fn start_position_shows_both_clocks() {
        let (tx, _rx) = mpsc::channel();
        let config = SessionConfig {
            clock_time: 90,
            ..SessionConfig::default()
        };
        let controller = Controller::new(config, Arc::new(StandardOracle), tx);
        let text = render(&controller);
        assert!(text.contains("White 01:30"));
        assert!(text.contains("Black 01:30"));
        assert!(!text.contains("viewing"));
    }

    #[test]
    fn move_table_gets_column_headers_once_moves_exist() {
        let (tx, _rx) = mpsc::channel();
        let mut controller = Controller::new(SessionConfig::default(), Arc::new(StandardOracle), tx);
        assert!(!render(&controller).contains("White    Black"));

        controller.dispatch(Event::HumanMove {
            origin: Square::E2,
            target: Square::E4,
            promotion: None,
        });
        let text = render(&controller);
        assert!(text.contains("     White    Black"));
        assert!(text.contains("  1. e4"));
    }

    #[test]
    fn position_change_has_no_line_of_its_own() {
        assert_eq!(describe(&Notification::PositionChanged), None);
        assert_eq!(
            describe(&Notification::GameOver(Outcome::Draw)).as_deref(),
            Some("game over: Draw")
        );
        assert!(needs_board(&[Notification::PositionChanged]));
        assert!(!needs_board(&[Notification::EngineThinking]));
    }
}
