use std::fmt;

use crate::geometry::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Promotion choices in generation order.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    pub fn index(self) -> usize {
        match self {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
        }
    }

    pub(crate) fn bit(self) -> u8 {
        1 << self.index()
    }

    /// Lowercase letter: `p n b r q k`.
    pub fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    /// Accepts either case.
    pub fn from_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// `w` or `b`, as in position records.
    pub fn to_char(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// Uppercase letters are White, lowercase Black.
    pub fn from_char(c: char) -> Option<Piece> {
        let kind = PieceKind::from_char(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }

    pub fn to_char(self) -> char {
        let c = self.kind.to_char();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

/// Square contents. Each square holds at most one piece.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; 64],
}

impl Board {
    pub fn empty() -> Self {
        Self { squares: [None; 64] }
    }

    /// The standard initial arrangement.
    pub fn starting() -> Self {
        let mut board = Board::empty();
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, &kind) in back_rank.iter().enumerate() {
            let file = file as u8;
            for (rank, color) in [(0, Color::White), (7, Color::Black)] {
                board.set_at(rank, file, Piece::new(kind, color));
            }
            board.set_at(1, file, Piece::new(PieceKind::Pawn, Color::White));
            board.set_at(6, file, Piece::new(PieceKind::Pawn, Color::Black));
        }
        board
    }

    fn set_at(&mut self, rank: u8, file: u8, piece: Piece) {
        if let Some(square) = Square::new(rank, file) {
            self.set(square, Some(piece));
        }
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.index()] = piece;
    }

    /// Empties `square`, returning what stood there.
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self.squares[square.index()].take()
    }

    /// Occupied squares in record order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |square| self.get(square).map(|piece| (square, piece)))
    }

    /// Rows from rank 8 down to rank 1, files a..h.
    pub fn rows(&self) -> [[Option<Piece>; 8]; 8] {
        let mut rows = [[None; 8]; 8];
        for square in Square::all() {
            rows[7 - square.rank() as usize][square.file() as usize] = self.get(square);
        }
        rows
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "   +------------------------+")?;
        for (row, pieces) in self.rows().iter().enumerate() {
            write!(f, " {} |", 8 - row)?;
            for piece in pieces {
                match piece {
                    Some(piece) => write!(f, " {} ", piece.to_char())?,
                    None => write!(f, " . ")?,
                }
            }
            writeln!(f, "|")?;
        }
        writeln!(f, "   +------------------------+")?;
        writeln!(f, "     a  b  c  d  e  f  g  h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_letters() {
        let white_knight = Piece::from_char('N').unwrap();
        assert_eq!(white_knight, Piece::new(PieceKind::Knight, Color::White));
        assert_eq!(white_knight.to_char(), 'N');
        assert_eq!(Piece::from_char('q').unwrap().color, Color::Black);
        assert_eq!(Piece::from_char('x'), None);
    }

    #[test]
    fn test_starting_board() {
        let board = Board::starting();
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(
            board.get(Square::E1),
            Some(Piece::new(PieceKind::King, Color::White))
        );
        assert_eq!(
            board.get(Square::D8),
            Some(Piece::new(PieceKind::Queen, Color::Black))
        );
        let rows = board.rows();
        assert_eq!(rows[0][0], Some(Piece::new(PieceKind::Rook, Color::Black)));
        assert_eq!(rows[7][4], Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(rows[4], [None; 8]);
    }

    #[test]
    fn test_ascii_rendering() {
        let text = Board::starting().to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 11);
        assert_eq!(lines[1], " 8 | r  n  b  q  k  b  n  r |");
        assert_eq!(lines[5], " 4 | .  .  .  .  .  .  .  . |");
        assert_eq!(lines[8], " 1 | R  N  B  Q  K  B  N  R |");
        assert_eq!(lines[10], "     a  b  c  d  e  f  g  h");
    }
}
