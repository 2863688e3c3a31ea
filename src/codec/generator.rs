//! Position → canonical token.
//!
//! Precedence mirrors the parser: starting board, attached key, dictionary,
//! discovery cache, full board. Every token produced here parses back to
//! the same board and regenerates to itself.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use super::Codec;
use super::parser::{BOARD_PREFIX, KEY_PREFIX};
use super::types::{Board, Position};

impl Codec {
    /// The preferred token for `position`. The starting position is `""`.
    pub fn generate(&self, position: &Position) -> String {
        let board = position.board();
        if board.is_starting() {
            return String::new();
        }

        if let Some(key) = position.short_key() {
            return format!("{KEY_PREFIX}{key}");
        }

        if let Some(key) = self.dictionary.lookup_by_board(board) {
            return format!("{KEY_PREFIX}{key}");
        }

        if let Some(key) = self.cache.get(board).or_else(|| self.discover(position)) {
            return format!("{KEY_PREFIX}{key}");
        }

        format!("{BOARD_PREFIX}{}", encode_board(board))
    }

    /// Register the position's history as its cache key when the history is
    /// shorter than the full-board payload. An existing entry wins.
    pub(crate) fn discover(&self, position: &Position) -> Option<String> {
        let history = position.move_history().filter(|h| !h.is_empty())?;
        if history.len() >= encoded_len(position.board()) {
            return None;
        }
        Some(
            self.cache
                .get_or_insert(position.board().clone(), history.to_string()),
        )
    }
}

/// Unpadded base64url of the board text.
pub fn encode_board(board: &Board) -> String {
    URL_SAFE_NO_PAD.encode(board.as_str())
}

/// Length of `encode_board(board)` without building it.
fn encoded_len(board: &Board) -> usize {
    let n = board.as_str().len();
    (n * 4).div_ceil(3)
}
