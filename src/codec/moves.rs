//! Move engine: advance a position by one move, or replay a whole history.
//!
//! Legality comes from the rules engine. This module keeps the derived
//! annotations straight: the history string grows by one token, and the
//! short key is looked up again for the new board.

use std::collections::BTreeSet;

use tracing::debug;

use super::Codec;
use super::rules::{Classification, RulesEngine, RulesError};
use super::types::{Board, CodecError, MoveToken, Position, Square, parse_promotion};

// ---------------------------------------------------------------------------
// MoveError
// ---------------------------------------------------------------------------

/// A rejected move request. The position it was applied to is untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("illegal move: {from} -> {to}: {reason}")]
    Illegal {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid promotion piece: {0}")]
    InvalidPromotion(String),
}

impl MoveError {
    fn rejected(token: &MoveToken, err: RulesError) -> MoveError {
        let reason = match err {
            RulesError::IllegalMove { reason, .. } => reason,
            RulesError::InvalidBoard(why) => why,
        };
        MoveError::Illegal {
            from: token.from.to_string(),
            to: token.to.to_string(),
            reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

/// Replay `moves` from the starting position, calling `visit` with every
/// board reached (the starting board included).
///
/// Returns the final board and the normalized history. Any bad token or
/// illegal move aborts the whole replay; nothing partial escapes.
pub(crate) fn walk(
    rules: &dyn RulesEngine,
    moves: &str,
    mut visit: impl FnMut(&Board),
) -> Result<(Board, String), CodecError> {
    if !moves.is_ascii() {
        return Err(CodecError::InvalidMoveToken(moves.to_string()));
    }

    let mut board = Board::starting();
    let mut history = String::with_capacity(moves.len());
    let mut rest = moves;
    visit(&board);

    while !rest.is_empty() {
        let (next, token) = step(rules, &board, rest)?;
        history.push_str(&token.to_string());
        rest = &rest[token.width()..];
        board = next;
        visit(&board);
    }

    Ok((board, history))
}

/// Decode and play the token at the head of `rest`.
///
/// `b` is both a file and a promotion letter, so a fifth character that
/// could be a promotion is only taken as one when the rules accept it.
fn step(
    rules: &dyn RulesEngine,
    board: &Board,
    rest: &str,
) -> Result<(Board, MoveToken), CodecError> {
    let head = rest
        .get(..4)
        .ok_or_else(|| CodecError::InvalidMoveToken(rest.to_string()))?;
    let plain: MoveToken = head.parse()?;

    if let Some(promotion) = rest[4..].chars().next().and_then(parse_promotion) {
        let promoted = MoveToken {
            promotion: Some(promotion),
            ..plain
        };
        if let Ok(next) = rules.apply_move(board, &promoted) {
            return Ok((next, promoted));
        }
    }

    let next = rules
        .apply_move(board, &plain)
        .map_err(|e| MoveError::rejected(&plain, e))?;
    Ok((next, plain))
}

// ---------------------------------------------------------------------------
// Codec: move operations
// ---------------------------------------------------------------------------

impl Codec {
    /// Play one move on `position`.
    ///
    /// On success the new position carries the extended history (when the
    /// old one had a history, or was the starting position) and whatever
    /// short key the dictionary or discovery cache already holds for the
    /// new board.
    pub fn apply_move(
        &self,
        position: &Position,
        from: Square,
        to: Square,
        promotion: Option<char>,
    ) -> Result<Position, MoveError> {
        let promotion = promotion
            .map(|c| parse_promotion(c).ok_or_else(|| MoveError::InvalidPromotion(c.to_string())))
            .transpose()?;
        let token = MoveToken::new(from, to, promotion);

        let board = self
            .rules
            .apply_move(position.board(), &token)
            .map_err(|e| MoveError::rejected(&token, e))?;

        let mut next = Position::from_board(board);
        if let Some(history) = history_of(position) {
            next = next.with_move_history(format!("{history}{token}"));
        }
        let key = self.known_key(next.board());

        debug!(mv = %token, key = ?key, "move applied");
        Ok(next.with_short_key(key))
    }

    /// Replay a move-history string from the starting position.
    pub fn replay(&self, moves: &str) -> Result<Position, CodecError> {
        let (board, history) = walk(self.rules.as_ref(), moves, |_| {})?;
        Ok(Position::from_board(board).with_move_history(history))
    }

    /// Destinations reachable from `from` (or from anywhere) in `position`.
    pub fn legal_destinations(
        &self,
        position: &Position,
        from: Option<Square>,
    ) -> Result<BTreeSet<Square>, RulesError> {
        self.rules.legal_destinations(position.board(), from)
    }

    /// Terminal-state classification.
    ///
    /// Threefold repetition needs the boards that led here, so it is only
    /// detected when the position carries its history.
    pub fn classify(&self, position: &Position) -> Result<Classification, RulesError> {
        let status = self.rules.classify(position.board())?;
        if status.is_game_over() {
            return Ok(status);
        }

        if let Some(history) = position.move_history() {
            let current = position.board().repetition_key();
            let mut seen = 0usize;
            let replayed = walk(self.rules.as_ref(), history, |b| {
                if b.repetition_key() == current {
                    seen += 1;
                }
            });
            if replayed.is_ok() && seen >= 3 {
                return Ok(Classification::DrawByRepetition);
            }
        }

        Ok(status)
    }

    /// Key the dictionary or discovery cache holds for `board`, dictionary first.
    pub(crate) fn known_key(&self, board: &Board) -> Option<String> {
        self.dictionary
            .lookup_by_board(board)
            .map(str::to_string)
            .or_else(|| self.cache.get(board))
    }
}

/// History to extend. The starting board's history is the empty string.
fn history_of(position: &Position) -> Option<&str> {
    position
        .move_history()
        .or_else(|| position.is_starting().then_some(""))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::rules::StandardRules;
    use crate::codec::types::Side;

    fn codec() -> Codec {
        Codec::standard(16)
    }

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn play(codec: &Codec, p: &Position, mv: &str) -> Position {
        let t: MoveToken = mv.parse().unwrap();
        codec.apply_move(p, t.from, t.to, t.promotion).unwrap()
    }

    #[test]
    fn first_move_starts_history_and_finds_key() {
        let c = codec();
        let p = play(&c, &Position::starting(), "e2e4");
        assert_eq!(p.side_to_move(), Side::Black);
        assert_eq!(p.move_history(), Some("e2e4"));
        assert_eq!(p.short_key(), Some("a"));
    }

    #[test]
    fn history_extends_and_key_clears_off_book() {
        let c = codec();
        let p = play(&c, &Position::starting(), "e2e4");
        let p = play(&c, &p, "e7e5");
        assert_eq!(p.short_key(), Some("e"));
        let p = play(&c, &p, "a2a3");
        assert_eq!(p.move_history(), Some("e2e4e7e5a2a3"));
        assert_eq!(p.short_key(), None);
    }

    #[test]
    fn position_without_history_stays_without() {
        let c = codec();
        let board = Board::parse("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1").unwrap();
        let p = play(&c, &Position::from_board(board), "e2e4");
        assert!(p.move_history().is_none());
        assert_eq!(p.board().as_str(), "4k3/8/8/8/4P3/8/8/4K3 b - - 0 1");
    }

    #[test]
    fn backward_pawn_is_rejected() {
        let c = codec();
        let p = play(&c, &Position::starting(), "e2e4");
        let p = play(&c, &p, "e7e5");
        let before = p.clone();
        let err = c.apply_move(&p, sq("e4"), sq("e3"), None).unwrap_err();
        assert!(matches!(err, MoveError::Illegal { .. }));
        assert_eq!(p, before);
    }

    #[test]
    fn bad_promotion_letter_is_rejected() {
        let c = codec();
        let board = Board::parse("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let err = c
            .apply_move(&Position::from_board(board), sq("a7"), sq("a8"), Some('k'))
            .unwrap_err();
        assert_eq!(err, MoveError::InvalidPromotion("k".into()));
    }

    #[test]
    fn promotion_is_lowercased_in_history() {
        let c = codec();
        let start = c.replay("b2b4a7a5b4a5b7b6a5b6a8a2b6b7a2a1").unwrap();
        let p = c
            .apply_move(&start, sq("b7"), sq("c8"), Some('Q'))
            .unwrap();
        assert!(p.move_history().unwrap().ends_with("b7c8q"));
    }

    #[test]
    fn replay_matches_stepwise_application() {
        let c = codec();
        let moves = ["d2d4", "g8f6", "c2c4", "e7e6", "g2g3", "d7d5"];
        let mut p = Position::starting();
        for mv in moves {
            p = play(&c, &p, mv);
        }
        let replayed = c.replay(&moves.concat()).unwrap();
        assert_eq!(replayed.board(), p.board());
        assert_eq!(replayed.move_history(), p.move_history());
    }

    #[test]
    fn replay_aborts_on_illegal_or_truncated_tokens() {
        let c = codec();
        assert!(c.replay("e2e4e7e5e4e3").is_err());
        assert!(c.replay("e2e4e7").is_err());
        assert!(c.replay("e2e4zz").is_err());
        assert!(c.replay("é2e4").is_err());
    }

    #[test]
    fn b_after_move_is_a_file_not_a_promotion() {
        let c = codec();
        // e2e4 followed by b7b6: the fifth character is the b-file.
        let p = c.replay("e2e4b7b6").unwrap();
        assert_eq!(p.move_history(), Some("e2e4b7b6"));
    }

    #[test]
    fn bishop_underpromotion_followed_by_move() {
        let c = codec();
        // White wins the a-pawn race and underpromotes to a bishop on b8.
        let moves = "a2a4b7b5a4b5a7a6b5a6c8b7a6a7b7c6a7b8bc6d5";
        let p = c.replay(moves).unwrap();
        assert_eq!(p.move_history(), Some(moves));
        assert!(p.board().placement().starts_with("rB"));
    }

    #[test]
    fn walk_visits_every_board() {
        let mut count = 0;
        let (board, history) = walk(&StandardRules, "e2e4e7e5", |_| count += 1).unwrap();
        assert_eq!(count, 3);
        assert_eq!(history, "e2e4e7e5");
        assert_eq!(board.side_to_move(), Side::White);
    }

    #[test]
    fn classify_detects_repetition_from_history() {
        let c = codec();
        let shuffle = "g1f3g8f6f3g1f6g8".repeat(2);
        let p = c.replay(&shuffle).unwrap();
        assert_eq!(c.classify(&p).unwrap(), Classification::DrawByRepetition);

        // The same board without its history looks ongoing.
        assert_eq!(
            c.classify(&p.without_move_history()).unwrap(),
            Classification::Ongoing
        );
    }

    #[test]
    fn legal_destinations_for_knight() {
        let c = codec();
        let dests = c
            .legal_destinations(&Position::starting(), Some(sq("b1")))
            .unwrap();
        let names: Vec<String> = dests.iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["a3", "c3"]);
    }
}
