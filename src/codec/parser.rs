//! Token → position.
//!
//! Parsing never fails from the caller's point of view. A token that does
//! not decode yields the starting position, so a shared link always shows
//! some board.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::debug;

use super::Codec;
use super::types::{Board, CodecError, Position};

/// Prefix of key and move-history tokens.
pub const KEY_PREFIX: &str = "u-";
/// Prefix of full-board tokens.
pub const BOARD_PREFIX: &str = "f-";

impl Codec {
    /// Decode `token`, falling back to the starting position on any failure.
    pub fn parse(&self, token: &str) -> Position {
        match self.try_parse(token) {
            Ok(position) => position,
            Err(e) => {
                debug!(token, error = %e, "unparsable code, using starting position");
                Position::starting()
            }
        }
    }

    /// Decode `token`, reporting why it failed.
    pub fn try_parse(&self, token: &str) -> Result<Position, CodecError> {
        if token.is_empty() {
            return Ok(Position::starting());
        }

        if let Some(rest) = token.strip_prefix(KEY_PREFIX) {
            if let Some(entry) = self.dictionary.entry(rest) {
                // A transposed row resolves to the key that owns its board.
                let key = self
                    .dictionary
                    .lookup_by_board(&entry.board)
                    .unwrap_or(entry.key.as_str());
                return Ok(Position::from_board(entry.board.clone())
                    .with_move_history(entry.moves.clone())
                    .with_short_key(Some(key.to_string())));
            }
            return self.parse_moves(rest);
        }

        if let Some(rest) = token.strip_prefix(BOARD_PREFIX) {
            return decode_board(rest).map(Position::from_board);
        }

        self.parse_moves(token)
    }

    /// Replay a raw history and annotate the result with any known key,
    /// registering the history itself as a discovered key when it is worth it.
    fn parse_moves(&self, moves: &str) -> Result<Position, CodecError> {
        let position = self.replay(moves)?;
        let key = self
            .known_key(position.board())
            .or_else(|| self.discover(&position));
        Ok(position.with_short_key(key))
    }
}

/// Decode an unpadded (or padded) base64url board payload.
pub fn decode_board(payload: &str) -> Result<Board, CodecError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| CodecError::InvalidPayload(e.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|e| CodecError::InvalidPayload(e.to_string()))?;
    Board::parse(&text)
}
