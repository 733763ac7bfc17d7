use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::board::{Color, PieceKind};
use crate::geometry::{self, pawn_captures, pawn_push, piece_offsets, Square, EAST, WEST};
use crate::position::{CastleSide, Position};

/// Set of move properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MoveFlags(u8);

impl MoveFlags {
    pub const NORMAL: MoveFlags = MoveFlags(1);
    pub const CAPTURE: MoveFlags = MoveFlags(1 << 1);
    pub const DOUBLE_PAWN_PUSH: MoveFlags = MoveFlags(1 << 2);
    pub const EN_PASSANT: MoveFlags = MoveFlags(1 << 3);
    pub const PROMOTION: MoveFlags = MoveFlags(1 << 4);
    pub const KINGSIDE_CASTLE: MoveFlags = MoveFlags(1 << 5);
    pub const QUEENSIDE_CASTLE: MoveFlags = MoveFlags(1 << 6);

    const LETTERS: [(MoveFlags, char); 7] = [
        (MoveFlags::NORMAL, 'n'),
        (MoveFlags::CAPTURE, 'c'),
        (MoveFlags::DOUBLE_PAWN_PUSH, 'b'),
        (MoveFlags::EN_PASSANT, 'e'),
        (MoveFlags::PROMOTION, 'p'),
        (MoveFlags::KINGSIDE_CASTLE, 'k'),
        (MoveFlags::QUEENSIDE_CASTLE, 'q'),
    ];

    /// True when every flag in `other` is set.
    pub fn contains(self, other: MoveFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any flag in `other` is set.
    pub fn intersects(self, other: MoveFlags) -> bool {
        self.0 & other.0 != 0
    }

    /// One letter per set flag, in the order `n c b e p k q`.
    pub fn letters(self) -> String {
        Self::LETTERS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|&(_, letter)| letter)
            .collect()
    }
}

impl BitOr for MoveFlags {
    type Output = MoveFlags;

    fn bitor(self, rhs: MoveFlags) -> MoveFlags {
        MoveFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for MoveFlags {
    fn bitor_assign(&mut self, rhs: MoveFlags) {
        self.0 |= rhs.0;
    }
}

/// A move as produced by the generator. It describes the change but owns no
/// board state; applying it is [`Position::make_move`]'s job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub color: Color,
    pub flags: MoveFlags,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn is_capture(&self) -> bool {
        self.flags
            .intersects(MoveFlags::CAPTURE | MoveFlags::EN_PASSANT)
    }

    pub fn is_en_passant(&self) -> bool {
        self.flags.contains(MoveFlags::EN_PASSANT)
    }

    pub fn is_double_push(&self) -> bool {
        self.flags.contains(MoveFlags::DOUBLE_PAWN_PUSH)
    }

    pub fn is_promotion(&self) -> bool {
        self.flags.contains(MoveFlags::PROMOTION)
    }

    pub fn castle_side(&self) -> Option<CastleSide> {
        if self.flags.contains(MoveFlags::KINGSIDE_CASTLE) {
            Some(CastleSide::Kingside)
        } else if self.flags.contains(MoveFlags::QUEENSIDE_CASTLE) {
            Some(CastleSide::Queenside)
        } else {
            None
        }
    }

    pub fn is_castle(&self) -> bool {
        self.castle_side().is_some()
    }
}

/// Coordinate form: `e2e4`, `e7e8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char())?;
        }
        Ok(())
    }
}

/// What to generate: optionally one piece kind, optionally one origin square,
/// and whether to drop moves that leave the mover's king attacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenOptions {
    pub piece: Option<PieceKind>,
    pub square: Option<Square>,
    pub legal: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        GenOptions::legal()
    }
}

impl GenOptions {
    pub fn legal() -> Self {
        Self {
            piece: None,
            square: None,
            legal: true,
        }
    }

    pub fn pseudo_legal() -> Self {
        Self {
            legal: false,
            ..GenOptions::legal()
        }
    }

    pub fn with_piece(mut self, piece: PieceKind) -> Self {
        self.piece = Some(piece);
        self
    }

    pub fn on_square(mut self, square: Square) -> Self {
        self.square = Some(square);
        self
    }
}

fn pawn_start_rank(color: Color) -> u8 {
    match color {
        Color::White => 1,
        Color::Black => 6,
    }
}

impl Position {
    /// Whether `target` is attacked by any piece of color `by`.
    pub fn is_attacked(&self, by: Color, target: Square) -> bool {
        geometry::is_attacked(&self.board, by, target)
    }

    /// Whether the king of `color` stands on an attacked square. A missing
    /// king is never attacked.
    pub fn king_attacked(&self, color: Color) -> bool {
        match self.kings[color.index()] {
            Some(square) => self.is_attacked(color.opposite(), square),
            None => false,
        }
    }

    /// Legal or pseudo-legal moves for the side to move, per `options.legal`.
    pub fn generate_moves(&mut self, options: &GenOptions) -> Vec<Move> {
        if options.legal {
            self.legal_moves(options)
        } else {
            self.pseudo_legal_moves(options)
        }
    }

    /// Moves obeying piece movement rules, without checking whether the
    /// mover's own king is left attacked.
    pub fn pseudo_legal_moves(&self, options: &GenOptions) -> Vec<Move> {
        let mut moves = Vec::new();
        let us = self.turn;

        for from in Square::all() {
            if options.square.map_or(false, |only| only != from) {
                continue;
            }
            let piece = match self.board.get(from) {
                Some(piece) if piece.color == us => piece,
                _ => continue,
            };
            if options.piece.map_or(false, |only| only != piece.kind) {
                continue;
            }

            match piece.kind {
                PieceKind::Pawn => self.pawn_moves(from, &mut moves),
                PieceKind::King => {
                    self.piece_moves(from, piece.kind, &mut moves);
                    self.castling_moves(from, &mut moves);
                }
                kind => self.piece_moves(from, kind, &mut moves),
            }
        }

        moves
    }

    /// Pseudo-legal moves that do not leave the mover's king attacked.
    ///
    /// Each candidate is applied, tested and undone; the position is
    /// identical to its starting state on return.
    pub fn legal_moves(&mut self, options: &GenOptions) -> Vec<Move> {
        let us = self.turn;
        let candidates = self.pseudo_legal_moves(options);
        let mut legal = Vec::with_capacity(candidates.len());

        for mv in candidates {
            self.make_move(mv);
            if !self.king_attacked(us) {
                legal.push(mv);
            }
            self.undo_move();
        }

        legal
    }

    fn pawn_moves(&self, from: Square, moves: &mut Vec<Move>) {
        let us = self.turn;
        let push = pawn_push(us);

        if let Some(one) = from.offset(push) {
            if self.board.get(one).is_none() {
                self.add_move(moves, from, one, MoveFlags::NORMAL);

                if from.rank() == pawn_start_rank(us) {
                    if let Some(two) = one.offset(push) {
                        if self.board.get(two).is_none() {
                            self.add_move(moves, from, two, MoveFlags::DOUBLE_PAWN_PUSH);
                        }
                    }
                }
            }
        }

        for delta in pawn_captures(us) {
            let to = match from.offset(delta) {
                Some(to) => to,
                None => continue,
            };
            match self.board.get(to) {
                Some(target) if target.color != us => {
                    self.add_move(moves, from, to, MoveFlags::CAPTURE)
                }
                None if self.en_passant == Some(to) => {
                    self.add_move(moves, from, to, MoveFlags::EN_PASSANT)
                }
                _ => {}
            }
        }
    }

    /// Knight, bishop, rook, queen and the king's single steps.
    fn piece_moves(&self, from: Square, kind: PieceKind, moves: &mut Vec<Move>) {
        let (offsets, slides) = piece_offsets(kind);

        for &delta in offsets {
            let mut current = from.offset(delta);
            while let Some(to) = current {
                match self.board.get(to) {
                    None => self.add_move(moves, from, to, MoveFlags::NORMAL),
                    Some(target) => {
                        if target.color != self.turn {
                            self.add_move(moves, from, to, MoveFlags::CAPTURE);
                        }
                        break;
                    }
                }
                if !slides {
                    break;
                }
                current = to.offset(delta);
            }
        }
    }

    /// Castling needs the right, empty squares between king and rook, and a
    /// king that neither starts on, crosses nor lands on an attacked square.
    fn castling_moves(&self, from: Square, moves: &mut Vec<Move>) {
        let us = self.turn;
        let them = us.opposite();

        for (side, step, gap, flag) in [
            (CastleSide::Kingside, EAST, 2, MoveFlags::KINGSIDE_CASTLE),
            (CastleSide::Queenside, WEST, 3, MoveFlags::QUEENSIDE_CASTLE),
        ] {
            if !self.castling.has(us, side) {
                continue;
            }

            let mut between = Vec::with_capacity(gap);
            let mut current = from;
            for _ in 0..gap {
                match current.offset(step) {
                    Some(next) => {
                        between.push(next);
                        current = next;
                    }
                    None => break,
                }
            }
            if between.len() != gap || between.iter().any(|&sq| self.board.get(sq).is_some()) {
                continue;
            }

            let (crossing, to) = (between[0], between[1]);
            if [from, crossing, to]
                .iter()
                .any(|&sq| self.is_attacked(them, sq))
            {
                continue;
            }

            self.add_move(moves, from, to, flag);
        }
    }

    /// Builds the move from `from` to `to`, expanding a pawn reaching the last
    /// rank into one move per promotion kind.
    fn add_move(&self, moves: &mut Vec<Move>, from: Square, to: Square, flags: MoveFlags) {
        let piece = match self.board.get(from) {
            Some(piece) => piece,
            None => return,
        };
        let captured = match self.board.get(to) {
            Some(target) => Some(target.kind),
            None if flags.contains(MoveFlags::EN_PASSANT) => Some(PieceKind::Pawn),
            None => None,
        };
        let mv = Move {
            from,
            to,
            piece: piece.kind,
            color: self.turn,
            flags,
            captured,
            promotion: None,
        };

        if piece.kind == PieceKind::Pawn && (to.rank() == 0 || to.rank() == 7) {
            for promotion in PieceKind::PROMOTIONS {
                moves.push(Move {
                    flags: flags | MoveFlags::PROMOTION,
                    promotion: Some(promotion),
                    ..mv
                });
            }
        } else {
            moves.push(mv);
        }
    }
}
