//! Board geometry: square coordinates, movement offsets and the
//! displacement-indexed attack tables.
//!
//! Squares are embedded in a 16x8 (0x88) index space so that a single mask
//! test tells whether a step left the board. That embedding is private to this
//! module; everything else sees `(rank, file)` coordinates and the opaque
//! offsets exported here.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;

use crate::board::{Board, Color, PieceKind};
use crate::error::SquareParseError;

const OFF_BOARD: i16 = 0x88;

// Displacements between two on-board squares span -119..=119.
const DISPLACEMENT_BIAS: i16 = 119;
const TABLE_SIZE: usize = 239;

pub(crate) const NORTH: i8 = 16;
pub(crate) const SOUTH: i8 = -16;
pub(crate) const EAST: i8 = 1;
pub(crate) const WEST: i8 = -1;

pub(crate) const KNIGHT_OFFSETS: [i8; 8] = [33, 31, 18, 14, -14, -18, -31, -33];
pub(crate) const BISHOP_OFFSETS: [i8; 4] = [17, 15, -15, -17];
pub(crate) const ROOK_OFFSETS: [i8; 4] = [NORTH, EAST, SOUTH, WEST];
pub(crate) const KING_OFFSETS: [i8; 8] = [17, NORTH, 15, EAST, WEST, -15, SOUTH, -17];

/// Step offsets for a non-pawn piece, and whether the piece slides along them.
pub(crate) fn piece_offsets(kind: PieceKind) -> (&'static [i8], bool) {
    match kind {
        PieceKind::Knight => (&KNIGHT_OFFSETS, false),
        PieceKind::Bishop => (&BISHOP_OFFSETS, true),
        PieceKind::Rook => (&ROOK_OFFSETS, true),
        PieceKind::Queen => (&KING_OFFSETS, true),
        PieceKind::King => (&KING_OFFSETS, false),
        PieceKind::Pawn => (&[], false),
    }
}

/// Single-square push direction for pawns of `color`.
pub(crate) fn pawn_push(color: Color) -> i8 {
    match color {
        Color::White => NORTH,
        Color::Black => SOUTH,
    }
}

/// The two diagonal capture offsets for pawns of `color`.
pub(crate) fn pawn_captures(color: Color) -> [i8; 2] {
    let push = pawn_push(color);
    [push + WEST, push + EAST]
}

/// A square on the 8x8 board. Rank 0 is White's back rank, file 0 is the a-file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub const A1: Square = Square(0x00);
    pub const C1: Square = Square(0x02);
    pub const D1: Square = Square(0x03);
    pub const E1: Square = Square(0x04);
    pub const F1: Square = Square(0x05);
    pub const G1: Square = Square(0x06);
    pub const H1: Square = Square(0x07);
    pub const A8: Square = Square(0x70);
    pub const C8: Square = Square(0x72);
    pub const D8: Square = Square(0x73);
    pub const E8: Square = Square(0x74);
    pub const F8: Square = Square(0x75);
    pub const G8: Square = Square(0x76);
    pub const H8: Square = Square(0x77);

    /// Returns `None` unless both coordinates are in `0..8`.
    pub fn new(rank: u8, file: u8) -> Option<Square> {
        if rank < 8 && file < 8 {
            Some(Square(rank * 16 + file))
        } else {
            None
        }
    }

    pub fn rank(self) -> u8 {
        self.0 >> 4
    }

    pub fn file(self) -> u8 {
        self.0 & 7
    }

    /// Dense index in `0..64`, a1 = 0, h8 = 63.
    pub fn index(self) -> usize {
        (self.rank() * 8 + self.file()) as usize
    }

    pub fn is_light(self) -> bool {
        (self.rank() + self.file()) % 2 == 1
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file()) as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.rank()) as char
    }

    /// The square `delta` steps away, or `None` if that leaves the board.
    pub(crate) fn offset(self, delta: i8) -> Option<Square> {
        let target = self.0 as i16 + delta as i16;
        if target < 0 || target & OFF_BOARD != 0 {
            None
        } else {
            Some(Square(target as u8))
        }
    }

    /// All 64 squares in record order: a8..h8, a7..h7, ..., a1..h1.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8)
            .rev()
            .flat_map(|rank| (0..8u8).map(move |file| Square(rank * 16 + file)))
    }

    fn displacement_index(self, target: Square) -> usize {
        (self.0 as i16 - target.0 as i16 + DISPLACEMENT_BIAS) as usize
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(SquareParseError(s.to_string()));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Square::new(rank, file).ok_or_else(|| SquareParseError(s.to_string()))
    }
}

struct AttackTables {
    /// Bit `kind.index()` is set when a piece of that kind standing at
    /// `attacker` could reach `target` on an empty board.
    masks: [u8; TABLE_SIZE],
    /// Step from attacker toward target along a sliding line, zero otherwise.
    rays: [i8; TABLE_SIZE],
}

impl AttackTables {
    fn new() -> Self {
        let mut tables = AttackTables {
            masks: [0; TABLE_SIZE],
            rays: [0; TABLE_SIZE],
        };

        for from in Square::all() {
            for color in [Color::White, Color::Black] {
                for delta in pawn_captures(color) {
                    if let Some(to) = from.offset(delta) {
                        tables.masks[from.displacement_index(to)] |= PieceKind::Pawn.bit();
                    }
                }
            }

            for kind in [
                PieceKind::Knight,
                PieceKind::Bishop,
                PieceKind::Rook,
                PieceKind::Queen,
                PieceKind::King,
            ] {
                let (offsets, slides) = piece_offsets(kind);
                for &delta in offsets {
                    let mut current = from.offset(delta);
                    while let Some(to) = current {
                        let index = from.displacement_index(to);
                        tables.masks[index] |= kind.bit();
                        if !slides {
                            break;
                        }
                        tables.rays[index] = delta;
                        current = to.offset(delta);
                    }
                }
            }
        }

        tables
    }
}

lazy_static! {
    static ref ATTACKS: AttackTables = AttackTables::new();
}

/// Whether any piece of color `by` attacks `target`.
///
/// Scans the whole board on every call; nothing is maintained incrementally.
pub fn is_attacked(board: &Board, by: Color, target: Square) -> bool {
    for square in Square::all() {
        let piece = match board.get(square) {
            Some(piece) if piece.color == by => piece,
            _ => continue,
        };

        let index = square.displacement_index(target);
        if ATTACKS.masks[index] & piece.kind.bit() == 0 {
            continue;
        }

        match piece.kind {
            PieceKind::Pawn => {
                // White pawns attack toward higher ranks, so the attacker sits below the target.
                let attacker_below = square.rank() < target.rank();
                if attacker_below == (by == Color::White) {
                    return true;
                }
            }
            PieceKind::Knight | PieceKind::King => return true,
            PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
                let step = ATTACKS.rays[index];
                let mut current = square.offset(step);
                let mut blocked = false;
                while let Some(between) = current {
                    if between == target {
                        break;
                    }
                    if board.get(between).is_some() {
                        blocked = true;
                        break;
                    }
                    current = between.offset(step);
                }
                if !blocked {
                    return true;
                }
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Piece;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_square_coordinates() {
        let e4 = sq("e4");
        assert_eq!(e4.rank(), 3);
        assert_eq!(e4.file(), 4);
        assert_eq!(e4.index(), 28);
        assert_eq!(e4.to_string(), "e4");
        assert_eq!(Square::new(0, 0), Some(Square::A1));
        assert_eq!(Square::new(8, 0), None);
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
    }

    #[test]
    fn test_square_colors() {
        assert!(!Square::A1.is_light());
        assert!(Square::H1.is_light());
        assert!(sq("d1").is_light());
        assert!(!sq("d8").is_light());
    }

    #[test]
    fn test_offsets_stay_on_board() {
        assert_eq!(Square::H1.offset(EAST), None);
        assert_eq!(Square::A1.offset(SOUTH), None);
        assert_eq!(Square::A8.offset(NORTH), None);
        assert_eq!(Square::A1.offset(33), Some(sq("b3")));
        assert_eq!(sq("g1").offset(18), None);
    }

    #[test]
    fn test_all_squares_in_record_order() {
        let squares: Vec<Square> = Square::all().collect();
        assert_eq!(squares.len(), 64);
        assert_eq!(squares[0], Square::A8);
        assert_eq!(squares[7], Square::H8);
        assert_eq!(squares[63], Square::H1);
    }

    #[test]
    fn test_sliding_attacks_are_blocked() {
        let mut board = Board::empty();
        board.set(Square::A1, Some(Piece::new(PieceKind::Rook, Color::White)));
        assert!(is_attacked(&board, Color::White, Square::A8));
        assert!(is_attacked(&board, Color::White, Square::H1));
        assert!(!is_attacked(&board, Color::Black, Square::A8));

        board.set(sq("a4"), Some(Piece::new(PieceKind::Pawn, Color::Black)));
        assert!(is_attacked(&board, Color::White, sq("a4")));
        assert!(!is_attacked(&board, Color::White, sq("a5")));
        assert!(!is_attacked(&board, Color::White, sq("b2")));
    }

    #[test]
    fn test_pawn_attacks_respect_direction() {
        let mut board = Board::empty();
        board.set(sq("e4"), Some(Piece::new(PieceKind::Pawn, Color::White)));
        board.set(sq("d5"), Some(Piece::new(PieceKind::Pawn, Color::Black)));

        assert!(is_attacked(&board, Color::White, sq("d5")));
        assert!(is_attacked(&board, Color::White, sq("f5")));
        assert!(!is_attacked(&board, Color::White, sq("d3")));
        assert!(!is_attacked(&board, Color::White, sq("e5")));

        assert!(is_attacked(&board, Color::Black, sq("e4")));
        assert!(is_attacked(&board, Color::Black, sq("c4")));
        assert!(!is_attacked(&board, Color::Black, sq("c6")));
    }

    #[test]
    fn test_knight_and_king_attacks() {
        let mut board = Board::empty();
        board.set(sq("g1"), Some(Piece::new(PieceKind::Knight, Color::White)));
        board.set(sq("e8"), Some(Piece::new(PieceKind::King, Color::Black)));

        assert!(is_attacked(&board, Color::White, sq("f3")));
        assert!(is_attacked(&board, Color::White, sq("e2")));
        assert!(!is_attacked(&board, Color::White, sq("g3")));
        assert!(is_attacked(&board, Color::Black, sq("d7")));
        assert!(!is_attacked(&board, Color::Black, sq("e6")));
    }
}
