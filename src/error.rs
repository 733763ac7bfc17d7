use thiserror::Error;

use crate::board::Color;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid square name: {0:?}")]
pub struct SquareParseError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("{0:?} already has a king on the board")]
    DuplicateKing(Color),
}

/// Reasons a position record is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("position record must have 6 space-separated fields")]
    FieldCount,
    #[error("6th field (move number) must be a positive integer")]
    InvalidMoveNumber,
    #[error("5th field (half move counter) must be a non-negative integer")]
    InvalidHalfmoveClock,
    #[error("4th field (en-passant square) is invalid")]
    InvalidEnPassant,
    #[error("3rd field (castling availability) is invalid")]
    InvalidCastling,
    #[error("2nd field (side to move) must be \"w\" or \"b\"")]
    InvalidSideToMove,
    #[error("1st field (board) must contain 8 \"/\"-separated rows")]
    RankCount,
    #[error("1st field (board) is invalid: consecutive numbers")]
    ConsecutiveDigits,
    #[error("1st field (board) is invalid: invalid piece {0:?}")]
    InvalidPiece(char),
    #[error("1st field (board) is invalid: row does not cover 8 squares")]
    RankSize,
    #[error("4th field is invalid: en-passant square impossible for side to move")]
    ImpossibleEnPassant,
    #[error(transparent)]
    Placement(#[from] PlacementError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PgnError {
    #[error("SetUp header present without a FEN header")]
    MissingFen,
    #[error("invalid FEN header: {0}")]
    Setup(#[from] FenError),
    #[error("illegal or unparseable move {san:?} at ply {ply}")]
    IllegalMove { san: String, ply: usize },
}
