//! Position records (FEN): validation, loading and export.

use std::str::FromStr;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::board::{Color, Piece};
use crate::error::FenError;
use crate::geometry::Square;
use crate::position::{CastleSide, Position};

pub const DEFAULT_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

lazy_static! {
    static ref EN_PASSANT_FIELD: Regex = Regex::new(r"^(-|[a-h][1-9])$").unwrap();
    static ref CASTLING_FIELD: Regex = Regex::new(r"^(KQ?k?q?|Qk?q?|kq?|q|-)$").unwrap();
}

/// Splits a record into its six fields, defaulting the clocks of a
/// four-field record to `0` and `1`.
fn fields(fen: &str) -> Result<[&str; 6], FenError> {
    let mut tokens: Vec<&str> = fen.split_whitespace().collect();
    if tokens.len() == 4 {
        tokens.extend(["0", "1"]);
    }
    match tokens.as_slice() {
        &[placement, turn, castling, en_passant, halfmove, fullmove] => {
            Ok([placement, turn, castling, en_passant, halfmove, fullmove])
        }
        _ => Err(FenError::FieldCount),
    }
}

/// Checks a position record without building a position.
///
/// Checks run in a fixed order and the first violation found is reported.
pub fn validate_fen(fen: &str) -> Result<(), FenError> {
    let [placement, turn, castling, en_passant, halfmove, fullmove] = fields(fen)?;

    match fullmove.parse::<u32>() {
        Ok(n) if n > 0 => {}
        _ => return Err(FenError::InvalidMoveNumber),
    }
    if halfmove.parse::<u32>().is_err() {
        return Err(FenError::InvalidHalfmoveClock);
    }

    if !EN_PASSANT_FIELD.is_match(en_passant) {
        return Err(FenError::InvalidEnPassant);
    }
    if !CASTLING_FIELD.is_match(castling) {
        return Err(FenError::InvalidCastling);
    }
    if turn != "w" && turn != "b" {
        return Err(FenError::InvalidSideToMove);
    }

    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return Err(FenError::RankCount);
    }
    for row in rows {
        let mut files = 0u32;
        let mut previous_was_digit = false;
        for c in row.chars() {
            if let Some(run) = c.to_digit(10) {
                if previous_was_digit {
                    return Err(FenError::ConsecutiveDigits);
                }
                if run == 0 {
                    return Err(FenError::RankSize);
                }
                files += run;
                previous_was_digit = true;
            } else {
                if Piece::from_char(c).is_none() {
                    return Err(FenError::InvalidPiece(c));
                }
                files += 1;
                previous_was_digit = false;
            }
        }
        if files != 8 {
            return Err(FenError::RankSize);
        }
    }

    if (en_passant.ends_with('3') && turn == "w") || (en_passant.ends_with('6') && turn == "b") {
        return Err(FenError::ImpossibleEnPassant);
    }

    Ok(())
}

impl Position {
    /// Builds a position from a record. The history starts empty.
    pub fn from_fen(fen: &str) -> Result<Position, FenError> {
        validate_fen(fen)?;
        let [placement, turn, castling, en_passant, halfmove, fullmove] = fields(fen)?;

        let mut position = Position::empty();
        for (row, pieces) in placement.split('/').enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;
            for c in pieces.chars() {
                if let Some(run) = c.to_digit(10) {
                    file += run as u8;
                    continue;
                }
                let piece = Piece::from_char(c).ok_or(FenError::InvalidPiece(c))?;
                let square = Square::new(rank, file).ok_or(FenError::RankSize)?;
                position.put(piece, square)?;
                file += 1;
            }
        }

        position.turn = if turn == "w" { Color::White } else { Color::Black };

        for (letter, color, side) in [
            ('K', Color::White, CastleSide::Kingside),
            ('Q', Color::White, CastleSide::Queenside),
            ('k', Color::Black, CastleSide::Kingside),
            ('q', Color::Black, CastleSide::Queenside),
        ] {
            if castling.contains(letter) {
                position.castling.insert(color, side);
            }
        }

        position.en_passant = match en_passant {
            "-" => None,
            name => Some(name.parse().map_err(|_| FenError::InvalidEnPassant)?),
        };
        position.halfmove_clock = halfmove
            .parse()
            .map_err(|_| FenError::InvalidHalfmoveClock)?;
        position.fullmove_number = fullmove.parse().map_err(|_| FenError::InvalidMoveNumber)?;

        Ok(position)
    }

    /// Replaces this position with the one described by `fen`.
    /// On error the position is left untouched.
    pub fn load(&mut self, fen: &str) -> Result<(), FenError> {
        match Position::from_fen(fen) {
            Ok(position) => {
                *self = position;
                Ok(())
            }
            Err(err) => {
                debug!("rejected position record {:?}: {}", fen, err);
                Err(err)
            }
        }
    }

    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {}",
            self.position_key(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// The first four record fields: placement, side to move, castling and
    /// en passant. Two positions with equal keys count as the same position
    /// for repetition purposes.
    pub fn position_key(&self) -> String {
        let mut placement = String::new();
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match Square::new(rank, file).and_then(|square| self.board.get(square)) {
                    Some(piece) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 0 {
                placement.push('/');
            }
        }

        let mut castling = String::new();
        for (letter, color, side) in [
            ('K', Color::White, CastleSide::Kingside),
            ('Q', Color::White, CastleSide::Queenside),
            ('k', Color::Black, CastleSide::Kingside),
            ('q', Color::Black, CastleSide::Queenside),
        ] {
            if self.castling.has(color, side) {
                castling.push(letter);
            }
        }
        if !self.castling.any(Color::White) && !self.castling.any(Color::Black) {
            castling.push('-');
        }

        let en_passant = self
            .en_passant
            .map_or_else(|| "-".to_string(), |square| square.to_string());

        format!(
            "{} {} {} {}",
            placement,
            self.turn.to_char(),
            castling,
            en_passant
        )
    }
}

impl FromStr for Position {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_fen(s)
    }
}
