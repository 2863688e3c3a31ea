//! Value types shared by every part of the codec.
//!
//! `Board` is the validated six-field position string, `Position` is the
//! immutable value the parser and move engine hand out, and `Square` /
//! `MoveToken` are the pieces a move-history string is made of.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::moves::MoveError;

/// Board of the standard initial array, white to move.
pub const STARTING_BOARD: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// The side whose turn it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    #[serde(rename = "w")]
    White,
    #[serde(rename = "b")]
    Black,
}

impl Side {
    /// The letter used in the board's second field.
    pub fn as_char(self) -> char {
        match self {
            Side::White => 'w',
            Side::Black => 'b',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// A complete position in six-field textual form.
///
/// Construction validates the structure (six fields, eight ranks of eight
/// files, a known side letter, numeric clocks), so a `Board` in hand is
/// never malformed. Legality is not checked here; that is the rules
/// engine's job.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Board(String);

impl Board {
    /// The standard starting position.
    pub fn starting() -> Board {
        Board(STARTING_BOARD.to_string())
    }

    /// Parse and validate a board string.
    pub fn parse(text: &str) -> Result<Board, CodecError> {
        let malformed = |why: &str| CodecError::MalformedBoard(format!("{why}: {text:?}"));

        let fields: Vec<&str> = text.split(' ').collect();
        if fields.len() != 6 {
            return Err(malformed("expected six fields"));
        }

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(malformed("expected eight ranks"));
        }
        for rank in ranks {
            let mut files = 0u32;
            for c in rank.chars() {
                files += match c {
                    '1'..='8' => c as u32 - '0' as u32,
                    'p' | 'n' | 'b' | 'r' | 'q' | 'k' | 'P' | 'N' | 'B' | 'R' | 'Q' | 'K' => 1,
                    _ => return Err(malformed("unexpected placement character")),
                };
            }
            if files != 8 {
                return Err(malformed("rank does not cover eight files"));
            }
        }

        if fields[1] != "w" && fields[1] != "b" {
            return Err(malformed("side to move must be w or b"));
        }

        let castling = fields[2];
        if castling.is_empty()
            || (castling != "-" && !castling.chars().all(|c| "KQkq".contains(c)))
        {
            return Err(malformed("bad castling field"));
        }

        let ep = fields[3];
        if ep != "-" {
            let square: Square = ep.parse().map_err(|_| malformed("bad en-passant field"))?;
            if square.rank() != 2 && square.rank() != 5 {
                return Err(malformed("en-passant square must be on rank 3 or 6"));
            }
        }

        fields[4]
            .parse::<u32>()
            .map_err(|_| malformed("bad halfmove clock"))?;
        let fullmove = fields[5]
            .parse::<u32>()
            .map_err(|_| malformed("bad fullmove number"))?;
        if fullmove == 0 {
            return Err(malformed("fullmove number starts at 1"));
        }

        Ok(Board(text.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_starting(&self) -> bool {
        self.0 == STARTING_BOARD
    }

    /// Side to move, read from the second field.
    pub fn side_to_move(&self) -> Side {
        // Validated at construction.
        match self.field(1) {
            "b" => Side::Black,
            _ => Side::White,
        }
    }

    /// Piece placement field.
    pub fn placement(&self) -> &str {
        self.field(0)
    }

    /// The first four fields. Two boards with the same key are the same
    /// position for repetition purposes.
    pub fn repetition_key(&self) -> String {
        self.0.split(' ').take(4).collect::<Vec<_>>().join(" ")
    }

    /// 64-character grid from a8 to h1, `.` for empty squares.
    pub fn grid(&self) -> String {
        let mut grid = String::with_capacity(64);
        for c in self.placement().chars() {
            match c {
                '/' => {}
                '1'..='8' => grid.extend(std::iter::repeat_n('.', c as usize - '0' as usize)),
                piece => grid.push(piece),
            }
        }
        grid
    }

    fn field(&self, index: usize) -> &str {
        self.0.split(' ').nth(index).unwrap_or_default()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Board {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// An immutable snapshot of a shared game.
///
/// `short_key`, when present, is a key the dictionary or the discovery cache
/// maps back to exactly this board. `move_history`, when present, replays
/// from the starting position to this board. Both are hints; consumers that
/// find them absent recompute rather than assume.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    board: Board,
    side_to_move: Side,
    #[serde(skip_serializing_if = "Option::is_none")]
    move_history: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    short_key: Option<String>,
}

impl Position {
    /// The starting position, with neither history nor key.
    pub fn starting() -> Position {
        Position::from_board(Board::starting())
    }

    pub fn from_board(board: Board) -> Position {
        let side_to_move = board.side_to_move();
        Position {
            board,
            side_to_move,
            move_history: None,
            short_key: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    pub fn move_history(&self) -> Option<&str> {
        self.move_history.as_deref()
    }

    pub fn short_key(&self) -> Option<&str> {
        self.short_key.as_deref()
    }

    pub fn is_starting(&self) -> bool {
        self.board.is_starting()
    }

    /// Copy of this position without its key annotation.
    pub fn without_short_key(&self) -> Position {
        Position {
            short_key: None,
            ..self.clone()
        }
    }

    /// Copy of this position without its history.
    pub fn without_move_history(&self) -> Position {
        Position {
            move_history: None,
            ..self.clone()
        }
    }

    pub(crate) fn with_move_history(mut self, history: impl Into<String>) -> Position {
        self.move_history = Some(history.into());
        self
    }

    pub(crate) fn with_short_key(mut self, key: Option<String>) -> Position {
        self.short_key = key;
        self
    }

    /// Destination square of the last move in the history, if known.
    pub fn last_destination(&self) -> Option<Square> {
        let history = self.move_history.as_deref()?;
        let tail = |n: usize| history.len().checked_sub(n).and_then(|i| history.get(i..));
        if let Some(t) = tail(5).and_then(|t| t.parse::<MoveToken>().ok()) {
            if t.promotion.is_some() {
                return Some(t.to);
            }
        }
        tail(4)
            .and_then(|t| t.parse::<MoveToken>().ok())
            .map(|t| t.to)
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// A board square, `a1` through `h8`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Option<Square> {
        (file < 8 && rank < 8).then_some(Square { file, rank })
    }

    /// 0 = a-file.
    pub fn file(self) -> u8 {
        self.file
    }

    /// 0 = first rank.
    pub fn rank(self) -> u8 {
        self.rank
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, (b'1' + self.rank) as char)
    }
}

impl FromStr for Square {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [f @ b'a'..=b'h', r @ b'1'..=b'8'] => Ok(Square {
                file: f - b'a',
                rank: r - b'1',
            }),
            _ => Err(CodecError::InvalidSquare(s.to_string())),
        }
    }
}

impl Serialize for Square {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// MoveToken
// ---------------------------------------------------------------------------

/// One move of a history string: source, destination, optional promotion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MoveToken {
    pub from: Square,
    pub to: Square,
    /// Lowercase `n`, `b`, `r` or `q`.
    pub promotion: Option<char>,
}

impl MoveToken {
    pub fn new(from: Square, to: Square, promotion: Option<char>) -> MoveToken {
        MoveToken {
            from,
            to,
            promotion: promotion.map(|c| c.to_ascii_lowercase()),
        }
    }

    /// Width of this token in a history string.
    pub fn width(&self) -> usize {
        if self.promotion.is_some() { 5 } else { 4 }
    }
}

/// Normalize a promotion letter, accepting either case.
pub fn parse_promotion(c: char) -> Option<char> {
    let lower = c.to_ascii_lowercase();
    matches!(lower, 'n' | 'b' | 'r' | 'q').then_some(lower)
}

impl fmt::Display for MoveToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(p) = self.promotion {
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

impl FromStr for MoveToken {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CodecError::InvalidMoveToken(s.to_string());
        if !s.is_ascii() || (s.len() != 4 && s.len() != 5) {
            return Err(invalid());
        }
        let from = s[0..2].parse().map_err(|_| invalid())?;
        let to = s[2..4].parse().map_err(|_| invalid())?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) => Some(parse_promotion(c).ok_or_else(invalid)?),
        };
        Ok(MoveToken::new(from, to, promotion))
    }
}

// ---------------------------------------------------------------------------
// CodecError
// ---------------------------------------------------------------------------

/// Reasons a token fails to decode. Never surfaced by `parse`, which falls
/// back to the starting position instead.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("malformed board: {0}")]
    MalformedBoard(String),

    #[error("invalid square notation: {0}")]
    InvalidSquare(String),

    #[error("invalid move token: {0}")]
    InvalidMoveToken(String),

    #[error("undecodable payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Move(#[from] MoveError),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_board_is_valid() {
        let board = Board::parse(STARTING_BOARD).unwrap();
        assert!(board.is_starting());
        assert_eq!(board.side_to_move(), Side::White);
        assert_eq!(board.placement(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR");
    }

    #[test]
    fn board_rejects_missing_fields() {
        assert!(Board::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").is_err());
        assert!(Board::parse("").is_err());
    }

    #[test]
    fn board_rejects_bad_ranks() {
        // Seven ranks.
        assert!(Board::parse("rnbqkbnr/pppppppp/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1").is_err());
        // Nine files on the first rank.
        assert!(Board::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR1 w KQkq - 0 1").is_err());
        // Unknown piece letter.
        assert!(Board::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBXKBNR w KQkq - 0 1").is_err());
    }

    #[test]
    fn board_rejects_bad_side_and_clocks() {
        assert!(Board::parse("8/8/8/8/8/8/8/8 x - - 0 1").is_err());
        assert!(Board::parse("8/8/8/8/8/8/8/8 w - - x 1").is_err());
        assert!(Board::parse("8/8/8/8/8/8/8/8 w - - 0 0").is_err());
        assert!(Board::parse("8/8/8/8/8/8/8/8 w - e4 0 1").is_err());
    }

    #[test]
    fn board_side_and_grid() {
        let board =
            Board::parse("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap();
        assert_eq!(board.side_to_move(), Side::Black);
        let grid = board.grid();
        assert_eq!(grid.len(), 64);
        assert_eq!(&grid[0..8], "rnbqkbnr");
        assert_eq!(&grid[32..40], "....P...");
        assert_eq!(&grid[56..64], "RNBQKBNR");
    }

    #[test]
    fn repetition_key_drops_clocks() {
        let a = Board::parse("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let b = Board::parse("4k3/8/8/8/8/8/8/4K3 w - - 12 9").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.repetition_key(), b.repetition_key());
    }

    #[test]
    fn square_parse_and_display() {
        let sq: Square = "e4".parse().unwrap();
        assert_eq!(sq.file(), 4);
        assert_eq!(sq.rank(), 3);
        assert_eq!(sq.to_string(), "e4");
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("E4".parse::<Square>().is_err());
    }

    #[test]
    fn move_token_parse() {
        let t: MoveToken = "e2e4".parse().unwrap();
        assert_eq!(t.to_string(), "e2e4");
        assert_eq!(t.width(), 4);

        let p: MoveToken = "a7a8Q".parse().unwrap();
        assert_eq!(p.promotion, Some('q'));
        assert_eq!(p.to_string(), "a7a8q");

        assert!("a7a8k".parse::<MoveToken>().is_err());
        assert!("e2e".parse::<MoveToken>().is_err());
    }

    #[test]
    fn starting_position_has_no_annotations() {
        let p = Position::starting();
        assert!(p.is_starting());
        assert_eq!(p.side_to_move(), Side::White);
        assert!(p.move_history().is_none());
        assert!(p.short_key().is_none());
    }

    #[test]
    fn last_destination_from_history() {
        let p = Position::starting().with_move_history("e2e4e7e5g1f3");
        assert_eq!(p.last_destination().unwrap().to_string(), "f3");

        let promo = Position::starting().with_move_history("b7b8q");
        assert_eq!(promo.last_destination().unwrap().to_string(), "b8");

        assert!(Position::starting().last_destination().is_none());
    }

    #[test]
    fn position_serializes_camel_case() {
        let p = Position::starting()
            .with_move_history("e2e4")
            .with_short_key(Some("a".into()));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["sideToMove"], "w");
        assert_eq!(json["moveHistory"], "e2e4");
        assert_eq!(json["shortKey"], "a");
        assert_eq!(json["board"], STARTING_BOARD);
    }
}
