//! The rules-engine seam.
//!
//! The codec never decides chess legality itself. Everything that needs the
//! rules goes through [`RulesEngine`], and [`StandardRules`] provides the
//! standard-chess implementation on top of `shakmaty`.

use std::collections::BTreeSet;

use serde::Serialize;
use shakmaty::fen::Fen;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position as _};

use super::types::{Board, MoveToken, Square};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Terminal-state classification of a board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Checkmate,
    Stalemate,
    DrawByFifty,
    DrawByRepetition,
    DrawByMaterial,
    Ongoing,
}

impl Classification {
    pub fn is_game_over(self) -> bool {
        !matches!(self, Classification::Ongoing)
    }
}

// ---------------------------------------------------------------------------
// RulesError
// ---------------------------------------------------------------------------

/// Rejections from the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    #[error("board is not a playable position: {0}")]
    InvalidBoard(String),

    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: String, reason: String },
}

// ---------------------------------------------------------------------------
// RulesEngine
// ---------------------------------------------------------------------------

/// Chess rules as a capability the codec is handed.
pub trait RulesEngine: Send + Sync {
    /// Play `mv` on `board`, returning the resulting board.
    fn apply_move(&self, board: &Board, mv: &MoveToken) -> Result<Board, RulesError>;

    /// Destinations of all legal moves, optionally only those from `from`.
    fn legal_destinations(
        &self,
        board: &Board,
        from: Option<Square>,
    ) -> Result<BTreeSet<Square>, RulesError>;

    /// Classify a single board. Repetition cannot be seen from one board,
    /// so implementations never return `DrawByRepetition` here.
    fn classify(&self, board: &Board) -> Result<Classification, RulesError>;
}

// ---------------------------------------------------------------------------
// StandardRules
// ---------------------------------------------------------------------------

/// Standard chess via `shakmaty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardRules;

impl StandardRules {
    fn load(board: &Board) -> Result<Chess, RulesError> {
        let fen: Fen = board
            .as_str()
            .parse()
            .map_err(|e: shakmaty::fen::ParseFenError| RulesError::InvalidBoard(e.to_string()))?;
        fen.into_position(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidBoard(e.to_string()))
    }

    fn store(pos: Chess) -> Result<Board, RulesError> {
        let text = Fen::from_position(pos, EnPassantMode::Legal).to_string();
        Board::parse(&text).map_err(|e| RulesError::InvalidBoard(e.to_string()))
    }
}

impl RulesEngine for StandardRules {
    fn apply_move(&self, board: &Board, mv: &MoveToken) -> Result<Board, RulesError> {
        let illegal = |reason: String| RulesError::IllegalMove {
            mv: mv.to_string(),
            reason,
        };

        let pos = Self::load(board)?;
        let uci: UciMove = mv
            .to_string()
            .parse()
            .map_err(|e: shakmaty::uci::ParseUciMoveError| illegal(e.to_string()))?;
        let m = uci.to_move(&pos).map_err(|e| illegal(e.to_string()))?;
        let next = pos.play(&m).map_err(|e| illegal(e.to_string()))?;
        Self::store(next)
    }

    fn legal_destinations(
        &self,
        board: &Board,
        from: Option<Square>,
    ) -> Result<BTreeSet<Square>, RulesError> {
        let pos = Self::load(board)?;
        let mut out = BTreeSet::new();
        for m in pos.legal_moves() {
            // Castling is reported king-to-destination, never king-takes-rook.
            let UciMove::Normal {
                from: src, to: dst, ..
            } = m.to_uci(CastlingMode::Standard)
            else {
                continue;
            };
            let (Ok(src), Ok(dst)) = (
                src.to_string().parse::<Square>(),
                dst.to_string().parse::<Square>(),
            ) else {
                continue;
            };
            if from.is_none_or(|f| f == src) {
                out.insert(dst);
            }
        }
        Ok(out)
    }

    fn classify(&self, board: &Board) -> Result<Classification, RulesError> {
        let pos = Self::load(board)?;
        let status = if pos.is_checkmate() {
            Classification::Checkmate
        } else if pos.is_stalemate() {
            Classification::Stalemate
        } else if pos.halfmoves() >= 100 {
            Classification::DrawByFifty
        } else if pos.is_insufficient_material() {
            Classification::DrawByMaterial
        } else {
            Classification::Ongoing
        };
        Ok(status)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
