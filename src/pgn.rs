//! PGN export and import.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::board::Color;
use crate::error::PgnError;
use crate::game::Game;
use crate::movegen::GenOptions;

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

lazy_static! {
    static ref HEADER_LINE: Regex = Regex::new(r#"^\[([A-Za-z][A-Za-z0-9_]*)\s+"(.*)"\s*\]$"#).unwrap();
    static ref MOVE_NUMBER: Regex = Regex::new(r"\d+\.(\.\.)?").unwrap();
    static ref ELLIPSIS: Regex = Regex::new(r"\.\.\.").unwrap();
    static ref NAG: Regex = Regex::new(r"\$\d+").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgnOptions {
    /// Wrap lines at this many characters; `0` disables wrapping.
    pub max_width: usize,
    pub newline: String,
}

impl Default for PgnOptions {
    fn default() -> Self {
        Self {
            max_width: 0,
            newline: "\n".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgnLoadOptions {
    /// Accept over-disambiguated and coordinate-style moves.
    pub sloppy: bool,
    /// Line separator of the input; `None` accepts `\n` and `\r\n`.
    pub newline: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Comment(String),
    Move(String),
}

/// Splits movetext into moves and comments. Variations, move numbers and
/// annotation glyphs are dropped; comments inside variations go with them.
fn tokenize(movetext: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut depth = 0usize;
    let mut chars = movetext.chars();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                flush_word(&mut word, &mut tokens);
                let text: String = chars.by_ref().take_while(|&c| c != '}').collect();
                if depth == 0 {
                    let text = text.replace("\r\n", " ").replace('\n', " ");
                    tokens.push(Token::Comment(text));
                }
            }
            ';' => {
                flush_word(&mut word, &mut tokens);
                let text: String = chars.by_ref().take_while(|&c| c != '\n').collect();
                if depth == 0 {
                    tokens.push(Token::Comment(text.trim().to_string()));
                }
            }
            '(' => {
                flush_word(&mut word, &mut tokens);
                depth += 1;
            }
            ')' => {
                flush_word(&mut word, &mut tokens);
                depth = depth.saturating_sub(1);
            }
            c if c.is_whitespace() => flush_word(&mut word, &mut tokens),
            c => {
                if depth == 0 {
                    word.push(c);
                }
            }
        }
    }
    flush_word(&mut word, &mut tokens);

    tokens
}

fn flush_word(word: &mut String, tokens: &mut Vec<Token>) {
    if word.is_empty() {
        return;
    }
    let text = MOVE_NUMBER.replace_all(word, "");
    let text = ELLIPSIS.replace_all(&text, "");
    let text = NAG.replace_all(&text, "");
    if !text.is_empty() {
        tokens.push(Token::Move(text.into_owned()));
    }
    word.clear();
}

/// Separates the tag section from the movetext. Tags are recognized only
/// when followed by a blank line.
fn split_tags<'a>(pgn: &'a str, newline: &str) -> (&'a str, &'a str) {
    let pattern = format!(r"^(\[(?:{nl}|.)*\])(?:{nl}){{2}}", nl = newline);
    let tags_end = Regex::new(&pattern)
        .ok()
        .and_then(|re| re.captures(pgn))
        .and_then(|caps| caps.get(1))
        .map_or(0, |m| m.end());
    pgn.split_at(tags_end)
}

fn strip_trailing_space(result: &mut Vec<String>) -> bool {
    if result.last().map_or(false, |last| last == " ") {
        result.pop();
        true
    } else {
        false
    }
}

/// Lays a commented move out token by token so the comment can break
/// across lines. Returns the width of the last line.
fn wrap_comment(
    result: &mut Vec<String>,
    mut width: usize,
    text: &str,
    max_width: usize,
    newline: &str,
) -> usize {
    for token in text.split(' ').filter(|token| !token.is_empty()) {
        if width + token.len() > max_width {
            while strip_trailing_space(result) {
                width = width.saturating_sub(1);
            }
            result.push(newline.to_string());
            width = 0;
        }
        result.push(token.to_string());
        result.push(" ".to_string());
        width += token.len() + 1;
    }
    if strip_trailing_space(result) {
        width = width.saturating_sub(1);
    }
    width
}

fn wrap(mut result: Vec<String>, moves: &[String], max_width: usize, newline: &str) -> String {
    let mut width = 0;
    for (i, text) in moves.iter().enumerate() {
        if width + text.len() > max_width && text.contains('{') {
            width = wrap_comment(&mut result, width, text, max_width, newline);
            continue;
        }
        if width + text.len() > max_width && i != 0 {
            strip_trailing_space(&mut result);
            result.push(newline.to_string());
            width = 0;
        } else if i != 0 {
            result.push(" ".to_string());
            width += 1;
        }
        result.push(text.clone());
        width += text.len();
    }
    result.concat()
}

impl Game {
    fn append_comment(&self, mut text: String) -> String {
        if let Some(comment) = self.comment() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push('{');
            text.push_str(comment);
            text.push('}');
        }
        text
    }

    /// Renders the game as PGN: tag pairs, then numbered movetext with
    /// comments, then the `Result` tag's value if there is one.
    pub fn pgn(&mut self, options: &PgnOptions) -> String {
        let newline = options.newline.as_str();
        let mut result: Vec<String> = self
            .headers
            .iter()
            .map(|(key, value)| format!("[{} \"{}\"]{}", key, value, newline))
            .collect();
        if !self.headers.is_empty() && self.position.history_len() > 0 {
            result.push(newline.to_string());
        }

        let mut undone = self.rewind();
        let mut moves = Vec::new();
        let mut move_string = String::new();

        if undone.is_empty() {
            moves.push(self.append_comment(String::new()));
        }

        while let Some(mv) = undone.pop() {
            move_string = self.append_comment(move_string);

            let number = self.position.fullmove_number();
            if self.position.history_len() == 0 && mv.color == Color::Black {
                if !move_string.is_empty() {
                    moves.push(move_string);
                }
                move_string = format!("{}. ...", number);
            } else if mv.color == Color::White {
                if !move_string.is_empty() {
                    moves.push(move_string);
                }
                move_string = format!("{}.", number);
            }

            let legal = self.position.legal_moves(&GenOptions::legal());
            move_string.push(' ');
            move_string.push_str(&self.position.move_to_san(&mv, &legal));
            self.position.make_move(mv);
        }

        if !move_string.is_empty() {
            moves.push(self.append_comment(move_string));
        }
        if let Some(outcome) = self.header("Result") {
            moves.push(outcome.to_string());
        }

        if options.max_width == 0 {
            return result.concat() + &moves.join(" ");
        }
        wrap(result, &moves, options.max_width, newline)
    }

    /// Replaces the game with the one in `pgn`.
    ///
    /// On an illegal move the game is left at the last position reached,
    /// with everything before the offending move applied.
    pub fn load_pgn(&mut self, pgn: &str, options: &PgnLoadOptions) -> Result<(), PgnError> {
        let newline = options
            .newline
            .as_deref()
            .map_or_else(|| r"\r?\n".to_string(), regex::escape);
        let (tags, movetext) = split_tags(pgn, &newline);

        self.reset();

        let line_break = Regex::new(&newline).ok();
        let lines: Vec<&str> = match &line_break {
            Some(re) => re.split(tags).collect(),
            None => tags.lines().collect(),
        };
        for line in lines {
            if let Some(caps) = HEADER_LINE.captures(line.trim()) {
                self.set_header(&caps[1], &caps[2]);
            }
        }

        if self.header("SetUp") == Some("1") {
            let fen = self.header("FEN").ok_or(PgnError::MissingFen)?.to_string();
            self.load_with_headers(&fen, true)?;
        }

        let movetext = match &options.newline {
            Some(separator) => movetext.replace(separator.as_str(), "\n"),
            None => movetext.to_string(),
        };

        for token in tokenize(&movetext) {
            match token {
                Token::Comment(text) => {
                    self.comments.insert(self.position.to_fen(), text);
                }
                Token::Move(text) if RESULTS.contains(&text.as_str()) => {
                    if !self.headers.is_empty() && self.header("Result").is_none() {
                        self.set_header("Result", &text);
                    }
                }
                Token::Move(text) => match self.position.move_from_san(&text, options.sloppy) {
                    Some(mv) => self.position.make_move(mv),
                    None => {
                        let ply = self.position.history_len() + 1;
                        debug!("pgn import stopped at ply {}: {:?}", ply, text);
                        return Err(PgnError::IllegalMove { san: text, ply });
                    }
                },
            }
        }

        Ok(())
    }
}
