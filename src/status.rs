//! Check, mate and draw detection.

use std::collections::HashMap;

use log::trace;

use crate::board::{Color, PieceKind};
use crate::movegen::GenOptions;
use crate::position::Position;

/// Half-moves without a capture or pawn move after which the game is drawn.
pub const FIFTY_MOVE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    Checkmate(Color), // Color is the winner
    Stalemate,
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

impl Position {
    /// Whether the side to move is in check.
    pub fn in_check(&self) -> bool {
        self.king_attacked(self.turn)
    }

    fn has_legal_moves(&mut self) -> bool {
        !self.legal_moves(&GenOptions::legal()).is_empty()
    }

    pub fn in_checkmate(&mut self) -> bool {
        self.in_check() && !self.has_legal_moves()
    }

    pub fn in_stalemate(&mut self) -> bool {
        !self.in_check() && !self.has_legal_moves()
    }

    /// Material from which no mate can arise: king against king, a single
    /// minor piece against a bare king, or any number of bishops that all
    /// stand on squares of one color.
    pub fn insufficient_material(&self) -> bool {
        let mut counts = [0usize; 6];
        let mut total = 0;
        let mut bishop_shades = [false; 2];

        for (square, piece) in self.board.pieces() {
            counts[piece.kind.index()] += 1;
            total += 1;
            if piece.kind == PieceKind::Bishop {
                bishop_shades[square.is_light() as usize] = true;
            }
        }

        let bishops = counts[PieceKind::Bishop.index()];
        let knights = counts[PieceKind::Knight.index()];

        if total == 2 {
            true
        } else if total == 3 && (bishops == 1 || knights == 1) {
            true
        } else if bishops > 0 && total == bishops + 2 {
            !(bishop_shades[0] && bishop_shades[1])
        } else {
            false
        }
    }

    /// Whether any position reached since setup has occurred at least three
    /// times, comparing placement, side to move, castling and en passant.
    ///
    /// The history is rewound and replayed, so the position is exactly as
    /// before on return.
    pub fn in_threefold_repetition(&mut self) -> bool {
        let mut undone = Vec::with_capacity(self.history.len());
        while let Some(mv) = self.undo_move() {
            undone.push(mv);
        }

        let mut seen: HashMap<String, u32> = HashMap::new();
        let mut repetition = false;
        loop {
            let count = seen.entry(self.position_key()).or_insert(0);
            *count += 1;
            if *count >= 3 {
                repetition = true;
            }
            match undone.pop() {
                Some(mv) => self.make_move(mv),
                None => break,
            }
        }

        trace!("{} distinct positions in history", seen.len());
        repetition
    }

    pub fn fifty_move_rule(&self) -> bool {
        self.halfmove_clock >= FIFTY_MOVE_LIMIT
    }

    pub fn in_draw(&mut self) -> bool {
        self.fifty_move_rule()
            || self.in_stalemate()
            || self.insufficient_material()
            || self.in_threefold_repetition()
    }

    pub fn is_game_over(&mut self) -> bool {
        self.in_checkmate() || self.in_draw()
    }

    /// The terminal condition that applies, if any. Mate and stalemate take
    /// precedence over the draw rules.
    pub fn game_state(&mut self) -> GameState {
        if !self.has_legal_moves() {
            return if self.in_check() {
                GameState::Checkmate(self.turn.opposite())
            } else {
                GameState::Stalemate
            };
        }

        if self.insufficient_material() {
            return GameState::InsufficientMaterial;
        }
        if self.in_threefold_repetition() {
            return GameState::ThreefoldRepetition;
        }
        if self.fifty_move_rule() {
            return GameState::FiftyMoveRule;
        }

        GameState::Ongoing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn play(position: &mut Position, sans: &[&str]) {
        for san in sans {
            let mv = position.move_from_san(san, false).unwrap();
            position.make_move(mv);
        }
    }

    #[test]
    fn test_checkmate() {
        let mut board = Position::new();
        play(&mut board, &["f3", "e5", "g4", "Qh4#"]);
        assert!(board.in_check());
        assert!(board.in_checkmate());
        assert!(!board.in_stalemate());
        assert!(board.is_game_over());
        assert_eq!(board.game_state(), GameState::Checkmate(Color::Black));
    }

    #[test]
    fn test_stalemate() {
        let mut board = position("4k3/4P3/4K3/8/8/8/8/8 b - - 0 78");
        assert!(!board.in_check());
        assert!(board.in_stalemate());
        assert!(board.in_draw());
        assert_eq!(board.game_state(), GameState::Stalemate);
    }

    #[test]
    fn test_insufficient_material() {
        for (fen, expected) in [
            ("8/8/8/8/8/8/8/k6K w - - 0 1", true),
            ("8/2p5/8/8/8/8/8/k6K w - - 0 1", false),
            ("8/8/8/8/8/8/8/k5NK w - - 0 1", true),
            ("8/8/8/8/8/8/8/k5BK w - - 0 1", true),
            ("8/b7/8/8/8/8/8/k5BK w - - 0 1", true),
            ("8/8/8/8/8/8/b7/k5BK w - - 0 1", false),
            ("8/b1B1b1B1/1b1B1b1B/8/8/8/8/1k5K w - - 0 1", true),
            ("8/8/8/8/8/8/8/k4NNK w - - 0 1", false),
            ("8/8/8/8/8/8/8/k4RBK w - - 0 1", false),
        ] {
            let mut board = position(fen);
            assert_eq!(board.insufficient_material(), expected, "{}", fen);
            if expected {
                assert_eq!(board.game_state(), GameState::InsufficientMaterial);
            }
        }
    }

    #[test]
    fn test_threefold_repetition() {
        let mut board = Position::new();
        let cycle = ["Nf3", "Nf6", "Ng1", "Ng8"];

        play(&mut board, &cycle);
        assert!(!board.in_threefold_repetition());
        play(&mut board, &cycle);
        assert!(board.in_threefold_repetition());
        assert_eq!(board.game_state(), GameState::ThreefoldRepetition);
        assert_eq!(board.history_len(), 8);

        board.undo_move();
        assert!(!board.in_threefold_repetition());
        play(&mut board, &["Ng8"]);
        assert!(board.in_threefold_repetition());
    }

    #[test]
    fn test_earlier_repetition_still_counts() {
        let mut board = Position::new();
        let cycle = ["Nf3", "Nf6", "Ng1", "Ng8"];
        play(&mut board, &cycle);
        play(&mut board, &cycle);
        play(&mut board, &["e4"]);
        assert!(board.in_threefold_repetition());
    }

    #[test]
    fn test_repetition_check_preserves_position() {
        let mut board = Position::new();
        play(&mut board, &["e4", "e5", "Nf3", "Nc6"]);
        let before = board.clone();
        board.in_threefold_repetition();
        assert_eq!(board, before);
    }

    #[test]
    fn test_fifty_move_rule() {
        let mut board = position("4k3/8/8/8/8/8/8/R3K3 w - - 99 80");
        assert!(!board.fifty_move_rule());
        play(&mut board, &["Ra2"]);
        assert!(board.fifty_move_rule());
        assert!(board.in_draw());
        assert_eq!(board.game_state(), GameState::FiftyMoveRule);
    }

    #[test]
    fn test_ongoing() {
        let mut board = Position::new();
        assert_eq!(board.game_state(), GameState::Ongoing);
        assert!(!board.is_game_over());
    }
}
