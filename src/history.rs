//! Applying and reversing moves.
//!
//! Every [`Position::make_move`] pushes a snapshot of the state a move
//! cannot reconstruct on its own; [`Position::undo_move`] pops it. Undoing
//! in LIFO order restores the position exactly, which move legality,
//! notation and repetition checks all depend on.

use crate::board::{Color, Piece, PieceKind};
use crate::geometry::{pawn_push, Square, EAST, WEST};
use crate::movegen::{Move, MoveFlags};
use crate::position::{CastleSide, CastlingRights, Position};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub(crate) mv: Move,
    turn: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl HistoryEntry {
    pub fn mv(&self) -> &Move {
        &self.mv
    }
}

/// Rook origin and destination for a castling move, derived from where the
/// king lands.
fn castling_rook(mv: &Move) -> Option<(Square, Square)> {
    match mv.castle_side()? {
        CastleSide::Kingside => Some((mv.to.offset(EAST)?, mv.to.offset(WEST)?)),
        CastleSide::Queenside => Some((mv.to.offset(2 * WEST)?, mv.to.offset(EAST)?)),
    }
}

/// The square of the pawn taken en passant: one step behind the destination.
fn en_passant_victim(mv: &Move) -> Option<Square> {
    mv.to.offset(-pawn_push(mv.color))
}

impl Position {
    /// Applies `mv`, which must have been generated for this position.
    pub fn make_move(&mut self, mv: Move) {
        let us = self.turn;
        let them = us.opposite();

        self.history.push(HistoryEntry {
            mv,
            turn: self.turn,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        });

        let placed = Piece::new(mv.promotion.unwrap_or(mv.piece), us);
        self.board.take(mv.from);
        self.board.set(mv.to, Some(placed));

        if mv.is_en_passant() {
            if let Some(victim) = en_passant_victim(&mv) {
                self.board.take(victim);
            }
        }
        if mv.captured == Some(PieceKind::King) {
            self.kings[them.index()] = None;
        }

        if mv.piece == PieceKind::King {
            self.kings[us.index()] = Some(mv.to);
            if let Some((rook_from, rook_to)) = castling_rook(&mv) {
                if let Some(rook) = self.board.take(rook_from) {
                    self.board.set(rook_to, Some(rook));
                }
            }
            self.castling.clear(us);
        }

        for side in [CastleSide::Kingside, CastleSide::Queenside] {
            if self.castling.has(us, side) && mv.from == side.rook_home(us) {
                self.castling.remove(us, side);
            }
            if self.castling.has(them, side) && mv.to == side.rook_home(them) {
                self.castling.remove(them, side);
            }
        }

        self.en_passant = if mv.is_double_push() {
            mv.from.offset(pawn_push(us))
        } else {
            None
        };

        if mv.piece == PieceKind::Pawn || mv.is_capture() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.turn = them;
    }

    /// Reverses the most recent move, or returns `None` when there is none.
    pub fn undo_move(&mut self) -> Option<Move> {
        let entry = self.history.pop()?;
        let mv = entry.mv;

        self.turn = entry.turn;
        self.castling = entry.castling;
        self.en_passant = entry.en_passant;
        self.halfmove_clock = entry.halfmove_clock;
        self.fullmove_number = entry.fullmove_number;

        let us = self.turn;
        let them = us.opposite();

        self.board.take(mv.to);
        self.board.set(mv.from, Some(Piece::new(mv.piece, us)));
        if mv.piece == PieceKind::King {
            self.kings[us.index()] = Some(mv.from);
        }

        if mv.flags.contains(MoveFlags::CAPTURE) {
            if let Some(kind) = mv.captured {
                self.board.set(mv.to, Some(Piece::new(kind, them)));
                if kind == PieceKind::King {
                    self.kings[them.index()] = Some(mv.to);
                }
            }
        } else if mv.is_en_passant() {
            if let Some(victim) = en_passant_victim(&mv) {
                self.board
                    .set(victim, Some(Piece::new(PieceKind::Pawn, them)));
            }
        }

        if let Some((rook_from, rook_to)) = castling_rook(&mv) {
            if let Some(rook) = self.board.take(rook_to) {
                self.board.set(rook_from, Some(rook));
            }
        }

        Some(mv)
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.history.last().map(HistoryEntry::mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::GenOptions;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn find(position: &mut Position, from: &str, to: &str) -> Move {
        position
            .legal_moves(&GenOptions::legal().on_square(sq(from)))
            .into_iter()
            .find(|mv| mv.to == sq(to))
            .unwrap()
    }

    #[test]
    fn test_undo_on_empty_history() {
        let mut position = Position::new();
        assert_eq!(position.undo_move(), None);
        assert_eq!(position, Position::new());
    }

    #[test]
    fn test_make_move_updates_state() {
        let mut position = Position::new();
        let mv = find(&mut position, "e2", "e4");
        position.make_move(mv);
        assert_eq!(position.turn(), Color::Black);
        assert_eq!(position.en_passant(), Some(sq("e3")));
        assert_eq!(position.halfmove_clock(), 0);
        assert_eq!(position.fullmove_number(), 1);
        assert_eq!(position.last_move(), Some(&mv));

        let mv = find(&mut position, "g8", "f6");
        position.make_move(mv);
        assert_eq!(position.en_passant(), None);
        assert_eq!(position.halfmove_clock(), 1);
        assert_eq!(position.fullmove_number(), 2);
        assert_eq!(
            position.to_fen(),
            "rnbqkb1r/pppppppp/5n2/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 1 2"
        );
    }

    #[test]
    fn test_castling_moves_rook_and_undoes() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 3 10";
        let mut position = Position::from_fen(fen).unwrap();
        let before = position.clone();

        let castle = find(&mut position, "e1", "g1");
        position.make_move(castle);
        assert_eq!(position.to_fen(), "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 4 10");
        assert_eq!(position.king_square(Color::White), Some(Square::G1));

        let castle = find(&mut position, "e8", "c8");
        position.make_move(castle);
        assert_eq!(position.to_fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 5 11");

        position.undo_move();
        position.undo_move();
        assert_eq!(position, before);
    }

    #[test]
    fn test_rook_moves_and_captures_clear_rights() {
        let mut position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mv = find(&mut position, "a1", "a8");
        position.make_move(mv);
        // White loses queenside by moving the rook, Black loses queenside by losing it.
        assert_eq!(position.to_fen(), "R3k2r/8/8/8/8/8/8/4K2R b Kk - 0 1");
        position.undo_move();
        assert_eq!(position.to_fen(), "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    }

    #[test]
    fn test_en_passant_capture_and_undo() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2";
        let mut position = Position::from_fen(fen).unwrap();
        let before = position.clone();
        let mv = find(&mut position, "e5", "d6");
        assert!(mv.is_en_passant());
        position.make_move(mv);
        assert_eq!(position.get(sq("d5")), None);
        assert_eq!(position.to_fen(), "4k3/8/3P4/8/8/8/8/4K3 b - - 0 2");
        position.undo_move();
        assert_eq!(position, before);
    }

    #[test]
    fn test_promotion_capture_and_undo() {
        let fen = "1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1";
        let mut position = Position::from_fen(fen).unwrap();
        let before = position.clone();
        let mv = position
            .legal_moves(&GenOptions::legal().on_square(sq("a7")))
            .into_iter()
            .find(|mv| mv.to == sq("b8") && mv.promotion == Some(PieceKind::Knight))
            .unwrap();
        position.make_move(mv);
        assert_eq!(
            position.get(sq("b8")),
            Some(Piece::new(PieceKind::Knight, Color::White))
        );
        assert_eq!(position.get(sq("a7")), None);
        position.undo_move();
        assert_eq!(position, before);
        assert_eq!(
            position.get(sq("a7")),
            Some(Piece::new(PieceKind::Pawn, Color::White))
        );
    }

    #[test]
    fn test_clocks_saturate_at_their_limit() {
        let mut position =
            Position::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 4294967295 4294967295").unwrap();
        let mv = find(&mut position, "e8", "d8");
        position.make_move(mv);
        assert_eq!(position.halfmove_clock(), u32::MAX);
        assert_eq!(position.fullmove_number(), u32::MAX);
        assert!(position.fifty_move_rule());

        position.undo_move();
        assert_eq!(
            position.to_fen(),
            "4k3/8/8/8/8/8/8/R3K3 b - - 4294967295 4294967295"
        );
    }

    #[test]
    fn test_every_pseudo_legal_move_undoes_exactly() {
        for fen in [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/8/8/8/3pPp2/8/8/R3K2R b KQkq e3 0 1",
        ] {
            let mut position = Position::from_fen(fen).unwrap();
            let before = position.clone();
            for mv in position.pseudo_legal_moves(&GenOptions::pseudo_legal()) {
                position.make_move(mv);
                assert_eq!(position.undo_move(), Some(mv));
                assert_eq!(position, before, "{} after {}", fen, mv);
            }
        }
    }
}
