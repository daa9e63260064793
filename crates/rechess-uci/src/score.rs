//! Engine evaluations: centipawns or a forced mate distance.

use std::fmt;

use rechess_core::Color;

/// Upper end of the evaluation bar range.
pub const BAR_MAX: u16 = 1000;

/// Midpoint of the evaluation bar, meaning an equal position.
pub const BAR_MIDPOINT: u16 = BAR_MAX / 2;

/// An engine evaluation.
///
/// The engine reports scores from the side to move's point of view.
/// [`for_white`](Score::for_white) converts them to White's, which is the
/// convention for everything leaving the engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Score {
    /// Material-style advantage in hundredths of a pawn.
    Centipawns(i32),
    /// Forced mate in N moves; positive when the scoring side mates.
    Mate(i32),
}

impl Score {
    /// Re-express a side-to-move score from White's point of view.
    pub fn for_white(self, side_to_move: Color) -> Score {
        match side_to_move {
            Color::White => self,
            Color::Black => self.negate(),
        }
    }

    /// Evaluation bar value for a score from `side_to_move`'s point of view.
    ///
    /// `Mate(0)` means the side to move is already mated. Its sign is lost by
    /// [`for_white`](Score::for_white), so it is resolved here first.
    pub fn bar_value_for(self, side_to_move: Color) -> u16 {
        match (self, side_to_move) {
            (Score::Mate(0), Color::White) => BAR_MAX,
            (Score::Mate(0), Color::Black) => 0,
            _ => self.for_white(side_to_move).bar_value(),
        }
    }

    /// The same evaluation from the other side's point of view.
    pub fn negate(self) -> Score {
        match self {
            Score::Centipawns(cp) => Score::Centipawns(-cp),
            Score::Mate(n) => Score::Mate(-n),
        }
    }

    /// Return `true` for a forced mate.
    pub fn is_mate(self) -> bool {
        matches!(self, Score::Mate(_))
    }

    /// Position on a `0..=1000` evaluation bar for a White-perspective score.
    ///
    /// White's advantage moves the value toward 0. Mate scores are pinned to
    /// the ends instead of going through `500 - cp`. `Mate(0)` reads as White
    /// being mated; use [`bar_value_for`](Score::bar_value_for) on the engine's
    /// own score when Black may be the mated side.
    pub fn bar_value(self) -> u16 {
        match self {
            Score::Mate(n) if n > 0 => 0,
            Score::Mate(_) => BAR_MAX,
            Score::Centipawns(cp) => {
                let value = i64::from(BAR_MIDPOINT) - i64::from(cp);
                value.clamp(0, i64::from(BAR_MAX)) as u16
            }
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Mate(n) => write!(f, "M{n}"),
            Score::Centipawns(cp) => write!(f, "{:.2}", f64::from(*cp) / 100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use rechess_core::Color;

    use super::{BAR_MAX, BAR_MIDPOINT, Score};

    #[test]
    fn white_to_move_unchanged() {
        assert_eq!(Score::Centipawns(35).for_white(Color::White), Score::Centipawns(35));
        assert_eq!(Score::Mate(3).for_white(Color::White), Score::Mate(3));
    }

    #[test]
    fn black_to_move_negated() {
        assert_eq!(Score::Centipawns(35).for_white(Color::Black), Score::Centipawns(-35));
        assert_eq!(Score::Mate(2).for_white(Color::Black), Score::Mate(-2));
    }

    #[test]
    fn bar_centipawns() {
        assert_eq!(Score::Centipawns(0).bar_value(), BAR_MIDPOINT);
        assert_eq!(Score::Centipawns(120).bar_value(), 380);
        assert_eq!(Score::Centipawns(-120).bar_value(), 620);
    }

    #[test]
    fn bar_clamps_large_scores() {
        assert_eq!(Score::Centipawns(2500).bar_value(), 0);
        assert_eq!(Score::Centipawns(-2500).bar_value(), BAR_MAX);
    }

    #[test]
    fn bar_mate_pinned_to_ends() {
        assert_eq!(Score::Mate(4).bar_value(), 0);
        assert_eq!(Score::Mate(-4).bar_value(), BAR_MAX);
    }

    #[test]
    fn mated_side_decides_the_bar_end() {
        assert_eq!(Score::Mate(0).bar_value_for(Color::White), BAR_MAX);
        assert_eq!(Score::Mate(0).bar_value_for(Color::Black), 0);
        assert_eq!(Score::Mate(2).bar_value_for(Color::Black), BAR_MAX);
        assert_eq!(Score::Centipawns(100).bar_value_for(Color::Black), 600);
    }

    #[test]
    fn display() {
        assert_eq!(Score::Centipawns(35).to_string(), "0.35");
        assert_eq!(Score::Centipawns(-150).to_string(), "-1.50");
        assert_eq!(Score::Mate(3).to_string(), "M3");
        assert_eq!(Score::Mate(-2).to_string(), "M-2");
        assert!(Score::Mate(1).is_mate());
        assert!(!Score::Centipawns(1).is_mate());
    }
}
