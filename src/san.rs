//! Standard Algebraic Notation: encoding with disambiguation and check
//! suffixes, and decoding in strict or sloppy mode.

use lazy_static::lazy_static;
use regex::Regex;

use crate::board::PieceKind;
use crate::geometry::Square;
use crate::movegen::{GenOptions, Move};
use crate::position::{CastleSide, Position};

lazy_static! {
    static ref DECORATIONS: Regex = Regex::new(r"[+#]?[?!]*$").unwrap();
    static ref SLOPPY_MOVE: Regex =
        Regex::new(r"([pnbrqkPNBRQK])?([a-h][1-8])x?-?([a-h][1-8])([qrbnQRBN])?").unwrap();
    static ref COORDINATE_PAIR: Regex = Regex::new(r"[a-h]\d.*[a-h]\d").unwrap();
}

/// Removes the promotion `=` and any trailing `+`/`#` and `?`/`!` marks.
pub fn strip_decorations(san: &str) -> String {
    let without_equals = san.replacen('=', "", 1);
    DECORATIONS.replace(&without_equals, "").into_owned()
}

/// The origin qualifier needed to tell `mv` apart from other moves in
/// `siblings` of the same piece kind landing on the same square.
pub fn disambiguator(mv: &Move, siblings: &[Move]) -> String {
    let mut ambiguities = 0;
    let mut same_rank = 0;
    let mut same_file = 0;

    for other in siblings {
        if other.piece == mv.piece && other.from != mv.from && other.to == mv.to {
            ambiguities += 1;
            if other.from.rank() == mv.from.rank() {
                same_rank += 1;
            }
            if other.from.file() == mv.from.file() {
                same_file += 1;
            }
        }
    }

    if ambiguities == 0 {
        String::new()
    } else if same_rank > 0 && same_file > 0 {
        mv.from.to_string()
    } else if same_file > 0 {
        mv.from.rank_char().to_string()
    } else {
        mv.from.file_char().to_string()
    }
}

fn encode(mv: &Move, siblings: &[Move], promotion_separator: &str) -> String {
    match mv.castle_side() {
        Some(CastleSide::Kingside) => return "O-O".to_string(),
        Some(CastleSide::Queenside) => return "O-O-O".to_string(),
        None => {}
    }

    let mut san = String::new();
    if mv.piece != PieceKind::Pawn {
        san.push(mv.piece.to_char().to_ascii_uppercase());
        san.push_str(&disambiguator(mv, siblings));
    }
    if mv.is_capture() {
        if mv.piece == PieceKind::Pawn {
            san.push(mv.from.file_char());
        }
        san.push('x');
    }
    san.push_str(&mv.to.to_string());
    if let Some(promotion) = mv.promotion {
        san.push_str(promotion_separator);
        san.push(promotion.to_char().to_ascii_uppercase());
    }
    san
}

/// SAN without check suffix and without the promotion `=`; the form text
/// is compared in after [`strip_decorations`].
pub fn stripped_san(mv: &Move, siblings: &[Move]) -> String {
    encode(mv, siblings, "")
}

/// Which piece kind a SAN string can refer to, judged from its first letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PieceHint {
    Any,
    Kind(PieceKind),
    Nothing,
}

fn infer_piece(san: &str) -> PieceHint {
    match san.chars().next() {
        Some('a'..='h') => {
            if COORDINATE_PAIR.is_match(san) {
                PieceHint::Any
            } else {
                PieceHint::Kind(PieceKind::Pawn)
            }
        }
        Some('o') | Some('O') => PieceHint::Kind(PieceKind::King),
        Some(c) => PieceKind::from_char(c).map_or(PieceHint::Nothing, PieceHint::Kind),
        None => PieceHint::Nothing,
    }
}

/// Fields pulled out of non-conforming text such as `Pe2-e4`, `Rc1c4` or `Qf3xf7`.
#[derive(Debug, Clone, Copy)]
struct SloppyFields {
    piece: Option<PieceKind>,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
}

impl SloppyFields {
    fn parse(text: &str) -> Option<SloppyFields> {
        let caps = SLOPPY_MOVE.captures(text)?;
        let letter = |index: usize| {
            caps.get(index)
                .and_then(|m| m.as_str().chars().next())
                .and_then(PieceKind::from_char)
        };
        Some(SloppyFields {
            piece: letter(1),
            from: caps.get(2)?.as_str().parse().ok()?,
            to: caps.get(3)?.as_str().parse().ok()?,
            promotion: letter(4),
        })
    }

    fn matches(&self, mv: &Move) -> bool {
        self.piece.map_or(true, |kind| kind == mv.piece)
            && self.from == mv.from
            && self.to == mv.to
            && self.promotion.map_or(true, |kind| Some(kind) == mv.promotion)
    }
}

impl Position {
    /// SAN for `mv`, disambiguated against `siblings`, with `+` or `#`
    /// appended when the move gives check or mate.
    pub fn move_to_san(&mut self, mv: &Move, siblings: &[Move]) -> String {
        let mut san = encode(mv, siblings, "=");

        self.make_move(*mv);
        if self.in_check() {
            if self.in_checkmate() {
                san.push('#');
            } else {
                san.push('+');
            }
        }
        self.undo_move();

        san
    }

    /// SAN for `mv` against all legal moves of this position.
    pub fn san(&mut self, mv: &Move) -> String {
        let legal = self.legal_moves(&GenOptions::legal());
        self.move_to_san(mv, &legal)
    }

    /// Finds the move `san` names.
    ///
    /// Strict mode accepts only a legal move whose SAN matches once
    /// decorations are stripped. Sloppy mode also accepts over-disambiguated
    /// SAN and coordinate-style text, matched against pseudo-legal moves.
    pub fn move_from_san(&mut self, san: &str, sloppy: bool) -> Option<Move> {
        let clean = strip_decorations(san);
        let sloppy_fields = if sloppy {
            SloppyFields::parse(&clean)
        } else {
            None
        };

        let hint = match sloppy_fields.and_then(|fields| fields.piece) {
            Some(kind) => PieceHint::Kind(kind),
            None => infer_piece(&clean),
        };
        let options = match hint {
            PieceHint::Any => GenOptions::legal(),
            PieceHint::Kind(kind) => GenOptions::legal().with_piece(kind),
            PieceHint::Nothing => return None,
        };

        let legal = self.legal_moves(&options);
        let pseudo_legal = if sloppy {
            self.pseudo_legal_moves(&GenOptions {
                legal: false,
                ..options
            })
        } else {
            Vec::new()
        };
        let candidates = if sloppy { &pseudo_legal } else { &legal };

        for mv in candidates {
            if clean == stripped_san(mv, &legal)
                || (sloppy && clean == stripped_san(mv, candidates))
            {
                return Some(*mv);
            }
            if let Some(fields) = &sloppy_fields {
                if fields.matches(mv) {
                    return Some(*mv);
                }
            }
        }

        None
    }
}
