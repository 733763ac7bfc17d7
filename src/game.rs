//! The game facade: a position plus PGN headers and comments, with moves
//! reported in a display-friendly form.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::board::{Color, Piece, PieceKind};
use crate::error::{FenError, PlacementError, SquareParseError};
use crate::fen::DEFAULT_FEN;
use crate::geometry::Square;
use crate::movegen::{GenOptions, Move};
use crate::position::Position;
use crate::status::GameState;

/// A move as presented to callers, SAN included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveInfo {
    pub color: Color,
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    /// Flag letters in the order `n c b e p k q`.
    pub flags: String,
    pub san: String,
}

/// A move given by its squares, as a user would enter it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl MoveRequest {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promoting_to(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }

    /// A generated move satisfies the request when the squares agree and,
    /// if the move promotes, the requested piece is the one it promotes to.
    fn matches(&self, mv: &Move) -> bool {
        mv.from == self.from
            && mv.to == self.to
            && (mv.promotion.is_none() || mv.promotion == self.promotion)
    }
}

/// Coordinate notation: `e2e4`, `e7e8q`.
impl FromStr for MoveRequest {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SquareParseError(s.to_string());
        let from = s.get(0..2).ok_or_else(invalid)?.parse()?;
        let to = s.get(2..4).ok_or_else(invalid)?.parse()?;
        let promotion = match s.get(4..) {
            None | Some("") => None,
            Some(rest) => {
                let mut chars = rest.chars();
                match (chars.next().and_then(PieceKind::from_char), chars.next()) {
                    (Some(kind), None) => Some(kind),
                    _ => return Err(invalid()),
                }
            }
        };
        Ok(MoveRequest {
            from,
            to,
            promotion,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareColor {
    Light,
    Dark,
}

#[derive(Debug, Clone)]
pub struct Game {
    pub(crate) position: Position,
    pub(crate) headers: Vec<(String, String)>,
    /// Comments keyed by the position record they annotate.
    pub(crate) comments: HashMap<String, String>,
}

impl Game {
    /// A game from the standard starting position.
    pub fn new() -> Self {
        Self {
            position: Position::new(),
            headers: Vec::new(),
            comments: HashMap::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let mut game = Game::new();
        game.load(fen)?;
        Ok(game)
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Replaces the game with the position in `fen`, dropping history,
    /// headers and comments. On error nothing changes.
    pub fn load(&mut self, fen: &str) -> Result<(), FenError> {
        self.load_with_headers(fen, false)
    }

    pub(crate) fn load_with_headers(
        &mut self,
        fen: &str,
        keep_headers: bool,
    ) -> Result<(), FenError> {
        let position = Position::from_fen(fen).map_err(|err| {
            debug!("rejected position record {:?}: {}", fen, err);
            err
        })?;
        self.clear_with_headers(keep_headers);
        self.position = position;
        self.update_setup();
        Ok(())
    }

    pub fn reset(&mut self) {
        self.clear_with_headers(false);
        self.position = Position::new();
        self.update_setup();
    }

    /// Empties the board and forgets history, headers and comments.
    pub fn clear(&mut self) {
        self.clear_with_headers(false);
    }

    fn clear_with_headers(&mut self, keep_headers: bool) {
        self.position = Position::empty();
        if !keep_headers {
            self.headers.clear();
        }
        self.comments.clear();
        self.update_setup();
    }

    /// While no moves have been played, the `SetUp` and `FEN` headers
    /// describe any starting position other than the standard one.
    fn update_setup(&mut self) {
        if self.position.history_len() > 0 {
            return;
        }
        let fen = self.position.to_fen();
        if fen != DEFAULT_FEN {
            self.set_header("SetUp", "1");
            self.set_header("FEN", &fen);
        } else {
            self.remove_header("SetUp");
            self.remove_header("FEN");
        }
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.position.get(square)
    }

    pub fn put(&mut self, piece: Piece, square: Square) -> Result<(), PlacementError> {
        self.position.put(piece, square)?;
        self.update_setup();
        Ok(())
    }

    pub fn remove(&mut self, square: Square) -> Option<Piece> {
        let removed = self.position.remove(square);
        self.update_setup();
        removed
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn fen(&self) -> String {
        self.position.to_fen()
    }

    /// Rows from rank 8 down to rank 1.
    pub fn board(&self) -> [[Option<Piece>; 8]; 8] {
        self.position.board().rows()
    }

    pub fn square_color(&self, square: Square) -> SquareColor {
        if square.is_light() {
            SquareColor::Light
        } else {
            SquareColor::Dark
        }
    }

    /// SAN of the moves `options` selects, disambiguated against all legal
    /// moves of the position.
    pub fn moves(&mut self, options: &GenOptions) -> Vec<String> {
        let all = self.position.legal_moves(&GenOptions::legal());
        self.position
            .generate_moves(options)
            .iter()
            .map(|mv| self.position.move_to_san(mv, &all))
            .collect()
    }

    pub fn moves_verbose(&mut self, options: &GenOptions) -> Vec<MoveInfo> {
        let all = self.position.legal_moves(&GenOptions::legal());
        self.position
            .generate_moves(options)
            .iter()
            .map(|mv| self.describe_among(mv, &all))
            .collect()
    }

    fn describe_among(&mut self, mv: &Move, siblings: &[Move]) -> MoveInfo {
        MoveInfo {
            color: mv.color,
            from: mv.from,
            to: mv.to,
            piece: mv.piece,
            captured: mv.captured,
            promotion: mv.promotion,
            flags: mv.flags.letters(),
            san: self.position.move_to_san(mv, siblings),
        }
    }

    /// Describes `mv` in the current position, before it is played.
    fn describe(&mut self, mv: &Move) -> MoveInfo {
        let legal = self.position.legal_moves(&GenOptions::legal());
        self.describe_among(mv, &legal)
    }

    /// Plays the move `san` names. Returns `None`, leaving the game as it
    /// was, when no move matches.
    pub fn play_san(&mut self, san: &str, sloppy: bool) -> Option<MoveInfo> {
        let mv = match self.position.move_from_san(san, sloppy) {
            Some(mv) => mv,
            None => {
                debug!("no move matches {:?} in {}", san, self.fen());
                return None;
            }
        };
        let info = self.describe(&mv);
        self.position.make_move(mv);
        Some(info)
    }

    /// Plays the legal move matching `request`.
    pub fn play(&mut self, request: MoveRequest) -> Option<MoveInfo> {
        let mv = self
            .position
            .legal_moves(&GenOptions::legal().on_square(request.from))
            .into_iter()
            .find(|mv| request.matches(mv))?;
        let info = self.describe(&mv);
        self.position.make_move(mv);
        Some(info)
    }

    pub fn undo(&mut self) -> Option<MoveInfo> {
        let mv = self.position.undo_move()?;
        Some(self.describe(&mv))
    }

    pub fn in_check(&self) -> bool {
        self.position.in_check()
    }

    pub fn in_checkmate(&mut self) -> bool {
        self.position.in_checkmate()
    }

    pub fn in_stalemate(&mut self) -> bool {
        self.position.in_stalemate()
    }

    pub fn in_draw(&mut self) -> bool {
        self.position.in_draw()
    }

    pub fn insufficient_material(&self) -> bool {
        self.position.insufficient_material()
    }

    pub fn in_threefold_repetition(&mut self) -> bool {
        self.position.in_threefold_repetition()
    }

    pub fn is_game_over(&mut self) -> bool {
        self.position.is_game_over()
    }

    pub fn game_state(&mut self) -> GameState {
        self.position.game_state()
    }

    /// Takes back every move, returning them most recent first.
    pub(crate) fn rewind(&mut self) -> Vec<Move> {
        let mut undone = Vec::with_capacity(self.position.history_len());
        while let Some(mv) = self.position.undo_move() {
            undone.push(mv);
        }
        undone
    }

    /// SAN of every move played, oldest first.
    pub fn history(&mut self) -> Vec<String> {
        self.history_verbose()
            .into_iter()
            .map(|info| info.san)
            .collect()
    }

    pub fn history_verbose(&mut self) -> Vec<MoveInfo> {
        let mut undone = self.rewind();
        let mut played = Vec::with_capacity(undone.len());
        while let Some(mv) = undone.pop() {
            played.push(self.describe(&mv));
            self.position.make_move(mv);
        }
        played
    }

    /// Sets a header, keeping its original place when it already exists.
    pub fn set_header(&mut self, key: &str, value: &str) {
        match self.headers.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.headers.push((key.to_string(), value.to_string())),
        }
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    fn remove_header(&mut self, key: &str) {
        self.headers.retain(|(k, _)| k != key);
    }

    pub fn comment(&self) -> Option<&str> {
        self.comments
            .get(&self.position.to_fen())
            .map(String::as_str)
    }

    /// Annotates the current position. Braces would end a PGN comment, so
    /// they become brackets.
    pub fn set_comment(&mut self, comment: &str) {
        let comment = comment.replace('{', "[").replace('}', "]");
        self.comments.insert(self.position.to_fen(), comment);
    }

    pub fn delete_comment(&mut self) -> Option<String> {
        self.comments.remove(&self.position.to_fen())
    }

    /// Comments on positions along the game, in game order, as
    /// `(record, comment)` pairs. Comments left on positions no longer
    /// reached (after an undo) are dropped.
    pub fn comments(&mut self) -> Vec<(String, String)> {
        self.prune_comments()
    }

    pub fn delete_comments(&mut self) -> Vec<(String, String)> {
        let kept = self.prune_comments();
        self.comments.clear();
        kept
    }

    fn prune_comments(&mut self) -> Vec<(String, String)> {
        let mut undone = self.rewind();
        let mut kept: Vec<(String, String)> = Vec::new();
        loop {
            let fen = self.position.to_fen();
            if let Some(comment) = self.comments.get(&fen) {
                if !kept.iter().any(|(seen, _)| *seen == fen) {
                    kept.push((fen, comment.clone()));
                }
            }
            match undone.pop() {
                Some(mv) => self.position.make_move(mv),
                None => break,
            }
        }
        self.comments = kept.iter().cloned().collect();
        kept
    }

    pub fn perft(&mut self, depth: u32) -> u64 {
        self.position.perft(depth)
    }

    /// Per-move leaf counts keyed by SAN.
    pub fn divide(&mut self, depth: u32) -> Vec<(String, u64)> {
        let legal = self.position.legal_moves(&GenOptions::legal());
        self.position
            .divide(depth)
            .into_iter()
            .map(|(mv, nodes)| (self.position.move_to_san(&mv, &legal), nodes))
            .collect()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_move_request_parsing() {
        let request: MoveRequest = "e7e8q".parse().unwrap();
        assert_eq!(request, MoveRequest::new(sq("e7"), sq("e8")).promoting_to(PieceKind::Queen));
        assert_eq!("g1f3".parse::<MoveRequest>().unwrap().promotion, None);
        assert!("e2".parse::<MoveRequest>().is_err());
        assert!("e2e9".parse::<MoveRequest>().is_err());
        assert!("e7e8x".parse::<MoveRequest>().is_err());
        assert!("e7e8qq".parse::<MoveRequest>().is_err());
    }

    #[test]
    fn test_play_and_undo() {
        let mut game = Game::new();
        let info = game.play_san("e4", false).unwrap();
        assert_eq!(info.san, "e4");
        assert_eq!(info.flags, "b");
        assert_eq!(info.color, Color::White);

        let info = game.play(MoveRequest::new(sq("e7"), sq("e5"))).unwrap();
        assert_eq!(info.san, "e5");
        assert!(game.play(MoveRequest::new(sq("e4"), sq("e5"))).is_none());
        assert!(game.play_san("Ke3", false).is_none());

        let undone = game.undo().unwrap();
        assert_eq!(undone.san, "e5");
        assert_eq!(undone.from, sq("e7"));
        assert_eq!(game.turn(), Color::Black);
        game.undo();
        assert!(game.undo().is_none());
        assert_eq!(game.fen(), DEFAULT_FEN);
    }

    #[test]
    fn test_undo_after_moving_the_king_by_hand() {
        let mut game = Game::new();
        game.play_san("e4", false).unwrap();
        let king = game.remove(sq("e1")).unwrap();
        game.put(king, sq("d1")).unwrap();

        game.undo().unwrap();
        assert_eq!(game.get(sq("e1")), None);
        assert_eq!(game.position().king_square(Color::White), Some(sq("d1")));
        assert_eq!(
            game.put(Piece::new(PieceKind::King, Color::White), sq("h4")),
            Err(PlacementError::DuplicateKing(Color::White))
        );

        // The cache follows the real king, so a check against d1 is seen.
        game.put(Piece::new(PieceKind::Knight, Color::Black), sq("e3"))
            .unwrap();
        assert!(game.in_check());
        let moves = game.moves(&GenOptions::legal());
        assert!(moves.contains(&"Ke1".to_string()));
        assert!(moves.contains(&"dxe3".to_string()));
        assert!(!moves.contains(&"Nc3".to_string()));
    }

    #[test]
    fn test_promotion_request() {
        let mut game = Game::from_fen("4k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        // No promotion piece given: the move cannot be matched.
        assert!(game.play(MoveRequest::new(sq("b7"), sq("b8"))).is_none());
        let info = game
            .play(MoveRequest::new(sq("b7"), sq("b8")).promoting_to(PieceKind::Knight))
            .unwrap();
        assert_eq!(info.san, "b8=N");
        assert_eq!(info.flags, "np");
        assert_eq!(info.promotion, Some(PieceKind::Knight));
    }

    #[test]
    fn test_moves_listing() {
        let mut game = Game::new();
        assert_eq!(game.moves(&GenOptions::legal()).len(), 20);
        let mut knight = game.moves(&GenOptions::legal().on_square(sq("g1")));
        knight.sort();
        assert_eq!(knight, vec!["Nf3".to_string(), "Nh3".to_string()]);

        let verbose = game.moves_verbose(&GenOptions::legal().on_square(sq("e2")));
        assert_eq!(verbose.len(), 2);
        assert!(verbose.iter().any(|info| info.san == "e4" && info.flags == "b"));
        assert!(verbose.iter().any(|info| info.san == "e3" && info.flags == "n"));

        let mut empty = Game::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        assert!(empty.moves(&GenOptions::legal()).is_empty());
    }

    #[test]
    fn test_history() {
        let mut game = Game::new();
        for san in ["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Bxc6", "dxc6", "O-O"] {
            assert!(game.play_san(san, false).is_some(), "{}", san);
        }
        let before = game.fen();
        assert_eq!(
            game.history(),
            vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Bxc6", "dxc6", "O-O"]
        );
        let verbose = game.history_verbose();
        assert_eq!(verbose[6].captured, Some(PieceKind::Knight));
        assert_eq!(verbose[8].flags, "k");
        assert_eq!(game.fen(), before);
    }

    #[test]
    fn test_setup_headers_follow_position() {
        let mut game = Game::new();
        assert!(game.headers().is_empty());

        game.remove(sq("a1"));
        assert_eq!(game.header("SetUp"), Some("1"));
        assert_eq!(
            game.header("FEN"),
            Some("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/1NBQKBNR w KQkq - 0 1")
        );

        game.put(Piece::new(PieceKind::Rook, Color::White), sq("a1"))
            .unwrap();
        assert_eq!(game.header("SetUp"), None);
        assert_eq!(game.header("FEN"), None);

        game.play_san("e4", false);
        game.remove(sq("h8"));
        assert_eq!(game.header("FEN"), None);

        game.clear();
        assert_eq!(game.header("FEN"), Some("8/8/8/8/8/8/8/8 w - - 0 1"));
        game.reset();
        assert!(game.headers().is_empty());
    }

    #[test]
    fn test_failed_load_keeps_game() {
        let mut game = Game::new();
        game.play_san("d4", false);
        game.set_header("White", "Someone");
        assert!(game.load("rnbqkbnr/pppppppp/8/8 w KQkq - 0 1").is_err());
        assert_eq!(game.history(), vec!["d4"]);
        assert_eq!(game.header("White"), Some("Someone"));

        game.load("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(game.header("White"), None);
        assert_eq!(game.header("SetUp"), Some("1"));
    }

    #[test]
    fn test_header_order_is_kept() {
        let mut game = Game::new();
        game.set_header("Event", "Casual");
        game.set_header("White", "A");
        game.set_header("Event", "Rated");
        assert_eq!(
            game.headers(),
            &[
                ("Event".to_string(), "Rated".to_string()),
                ("White".to_string(), "A".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments() {
        let mut game = Game::new();
        game.set_comment("start {here}");
        assert_eq!(game.comment(), Some("start [here]"));

        game.play_san("e4", false);
        game.set_comment("king pawn");
        game.play_san("e5", false);
        game.set_comment("symmetric");
        game.undo();

        let comments = game.comments();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].0, DEFAULT_FEN);
        assert_eq!(comments[1].1, "king pawn");

        assert_eq!(game.delete_comment(), Some("king pawn".to_string()));
        assert_eq!(game.comment(), None);
        assert_eq!(game.delete_comments().len(), 1);
        assert!(game.comments().is_empty());
    }

    #[test]
    fn test_square_color_and_board() {
        let game = Game::new();
        assert_eq!(game.square_color(sq("a1")), SquareColor::Dark);
        assert_eq!(game.square_color(sq("h1")), SquareColor::Light);
        let rows = game.board();
        assert_eq!(rows[7][4], Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(rows[4][4], None);
    }

    #[test]
    fn test_divide_uses_san() {
        let mut game = Game::new();
        let split = game.divide(2);
        assert_eq!(split.len(), 20);
        assert!(split.iter().all(|(_, nodes)| *nodes == 20));
        assert!(split.iter().any(|(san, _)| san == "Na3"));
        assert_eq!(game.perft(2), 400);
    }
}
