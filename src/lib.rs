pub mod board;
pub mod error;
pub mod fen;
pub mod game;
pub mod geometry;
pub mod history;
pub mod movegen;
pub mod perft;
pub mod pgn;
pub mod position;
pub mod san;
pub mod status;

pub use board::{Board, Color, Piece, PieceKind};
pub use error::{FenError, PgnError, PlacementError, SquareParseError};
pub use fen::{validate_fen, DEFAULT_FEN};
pub use game::{Game, MoveInfo, MoveRequest, SquareColor};
pub use geometry::Square;
pub use movegen::{GenOptions, Move, MoveFlags};
pub use pgn::{PgnLoadOptions, PgnOptions};
pub use position::{CastleSide, CastlingRights, Position};
pub use status::GameState;
