use std::fmt;

use crate::board::{Board, Color, Piece, PieceKind};
use crate::error::PlacementError;
use crate::geometry::Square;
use crate::history::HistoryEntry;
use crate::movegen::Move;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    fn bit(self) -> u8 {
        match self {
            CastleSide::Kingside => 0b01,
            CastleSide::Queenside => 0b10,
        }
    }

    /// Where the rook of `color` starts for this side.
    pub(crate) fn rook_home(self, color: Color) -> Square {
        match (color, self) {
            (Color::White, CastleSide::Kingside) => Square::H1,
            (Color::White, CastleSide::Queenside) => Square::A1,
            (Color::Black, CastleSide::Kingside) => Square::H8,
            (Color::Black, CastleSide::Queenside) => Square::A8,
        }
    }
}

/// Per-color `{kingside, queenside}` castling rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights([u8; 2]);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights([0, 0]);
    pub const ALL: CastlingRights = CastlingRights([0b11, 0b11]);

    pub fn has(self, color: Color, side: CastleSide) -> bool {
        self.0[color.index()] & side.bit() != 0
    }

    pub fn any(self, color: Color) -> bool {
        self.0[color.index()] != 0
    }

    pub fn insert(&mut self, color: Color, side: CastleSide) {
        self.0[color.index()] |= side.bit();
    }

    pub fn remove(&mut self, color: Color, side: CastleSide) {
        self.0[color.index()] &= !side.bit();
    }

    pub fn clear(&mut self, color: Color) {
        self.0[color.index()] = 0;
    }
}

/// A full game position plus the stack of moves that led to it.
///
/// Board contents change only through [`Position::put`], [`Position::remove`],
/// [`Position::make_move`] and [`Position::undo_move`], all of which keep the
/// king-square cache in sync with the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub(crate) board: Board,
    pub(crate) turn: Color,
    pub(crate) castling: CastlingRights,
    pub(crate) en_passant: Option<Square>,
    pub(crate) halfmove_clock: u32,
    pub(crate) fullmove_number: u32,
    pub(crate) kings: [Option<Square>; 2],
    pub(crate) history: Vec<HistoryEntry>,
}

impl Position {
    /// The standard starting position.
    pub fn new() -> Self {
        Self {
            board: Board::starting(),
            castling: CastlingRights::ALL,
            kings: [Some(Square::E1), Some(Square::E8)],
            ..Position::empty()
        }
    }

    /// An empty board, White to move, no rights.
    pub fn empty() -> Self {
        Self {
            board: Board::empty(),
            turn: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            kings: [None, None],
            history: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.kings[color.index()]
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.board.get(square)
    }

    /// Places `piece` on `square`, replacing whatever stood there.
    ///
    /// A king may only be placed when its color has none on the board, or on
    /// the square its king already occupies.
    pub fn put(&mut self, piece: Piece, square: Square) -> Result<(), PlacementError> {
        if piece.kind == PieceKind::King {
            if let Some(existing) = self.kings[piece.color.index()] {
                if existing != square {
                    return Err(PlacementError::DuplicateKing(piece.color));
                }
            }
        }

        if let Some(replaced) = self.board.get(square) {
            self.forget_king(replaced, square);
        }
        self.board.set(square, Some(piece));
        if piece.kind == PieceKind::King {
            self.kings[piece.color.index()] = Some(square);
        }
        Ok(())
    }

    /// Empties `square`, returning the piece that stood there.
    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        let piece = self.board.take(square)?;
        self.forget_king(piece, square);
        Some(piece)
    }

    fn forget_king(&mut self, piece: Piece, square: Square) {
        if piece.kind == PieceKind::King && self.kings[piece.color.index()] == Some(square) {
            self.kings[piece.color.index()] = None;
        }
    }

    /// Moves applied since the position was set up, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Move> + '_ {
        self.history.iter().map(|entry| &entry.mv)
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.board)
    }
}
