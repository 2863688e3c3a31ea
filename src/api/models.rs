use serde::{Deserialize, Serialize};

use crate::codec::{Classification, Position, ShareCard, Side, Square};

// ---------------------------------------------------------------------------
// Request models
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// Code of the position the move is played on; empty or absent is the start.
    #[serde(default)]
    pub code: String,
    pub from: String,
    pub to: String,
    pub promotion: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerspectiveQuery {
    pub p: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesQuery {
    #[serde(default)]
    pub code: String,
    pub from: Option<String>,
}

// ---------------------------------------------------------------------------
// Response models
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime: u64,
    pub dictionary_entries: usize,
    pub cached_keys: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    /// The canonical code for this position.
    pub code: String,
    pub position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Classification>,
    pub current_player: String,
    pub title: String,
    pub perspective: Side,
    pub redirect: bool,
    pub share_url: String,
    pub preview_url: String,
    pub board: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalMovesResponse {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Square>,
    pub destinations: Vec<Square>,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn position_response(
    position: Position,
    card: ShareCard,
    status: Option<Classification>,
    share_url: String,
    preview_url: String,
) -> PositionResponse {
    let board = board_rows(&position);
    PositionResponse {
        code: card.code,
        current_player: color_name(position.side_to_move()).to_string(),
        position,
        status,
        title: card.title,
        perspective: card.perspective,
        redirect: card.redirect,
        share_url,
        preview_url,
        board,
    }
}

/// 8×8 rows from rank 8 down to rank 1; pieces like "wP", "bK".
pub fn board_rows(position: &Position) -> Vec<Vec<Option<String>>> {
    position
        .board()
        .grid()
        .as_bytes()
        .chunks(8)
        .map(|rank| {
            rank.iter()
                .map(|&c| match c {
                    b'.' => None,
                    c if c.is_ascii_uppercase() => Some(format!("w{}", c as char)),
                    c => Some(format!("b{}", c.to_ascii_uppercase() as char)),
                })
                .collect()
        })
        .collect()
}

pub fn color_name(side: Side) -> &'static str {
    match side {
        Side::White => "white",
        Side::Black => "black",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_rows_starting_position() {
        let rows = board_rows(&Position::starting());
        assert_eq!(rows.len(), 8);
        // Rank 8 = row 0: rook on a8.
        assert_eq!(rows[0][0].as_deref(), Some("bR"));
        // Rank 1 = row 7: king on e1.
        assert_eq!(rows[7][4].as_deref(), Some("wK"));
        // Rank 5 = row 3: empty.
        assert_eq!(rows[3][0], None);
    }
}
