use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{debug, info};

use crate::codec::share::parse_perspective;
use crate::codec::types::parse_promotion;
use crate::codec::{Position, Side, Square};

use super::errors::ApiError;
use super::models::*;
use super::state::{AppState, SharedState};

// =========================================================================
// Health
// =========================================================================

/// GET /health
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime,
        dictionary_entries: state.codec.dictionary().len(),
        cached_keys: state.codec.cache().len(),
    })
}

// =========================================================================
// Share Page
// =========================================================================

/// GET /p
pub async fn share_page_root(
    State(state): State<SharedState>,
    Query(query): Query<PerspectiveQuery>,
) -> Response {
    share_response(&state, "", &query)
}

/// GET /p/{*code}
pub async fn share_page(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<PerspectiveQuery>,
) -> Response {
    share_response(&state, &code, &query)
}

/// Redirect non-canonical codes; describe canonical ones.
fn share_response(state: &AppState, code: &str, query: &PerspectiveQuery) -> Response {
    let perspective = parse_perspective(query.p.as_deref());
    let position = state.codec.parse(code);
    let view = describe(state, code, position, perspective);

    if view.redirect {
        let search = perspective
            .map(|side| format!("?p={}", side.as_char()))
            .unwrap_or_default();
        let target = format!("/p/{}{search}", view.code);
        info!(from = code, to = %target, "redirecting to canonical code");
        return Redirect::temporary(&target).into_response();
    }

    Json(view).into_response()
}

// =========================================================================
// Positions
// =========================================================================

/// GET /api/positions
pub async fn get_position_root(
    State(state): State<SharedState>,
    Query(query): Query<PerspectiveQuery>,
) -> Json<PositionResponse> {
    let position = state.codec.parse("");
    Json(describe(&state, "", position, parse_perspective(query.p.as_deref())))
}

/// GET /api/positions/{*code}
pub async fn get_position(
    State(state): State<SharedState>,
    Path(code): Path<String>,
    Query(query): Query<PerspectiveQuery>,
) -> Json<PositionResponse> {
    let position = state.codec.parse(&code);
    Json(describe(
        &state,
        &code,
        position,
        parse_perspective(query.p.as_deref()),
    ))
}

// =========================================================================
// Make Move
// =========================================================================

/// POST /api/moves
pub async fn make_move(
    State(state): State<SharedState>,
    Json(input): Json<MoveRequest>,
) -> Result<Json<PositionResponse>, ApiError> {
    let position = state.codec.parse(&input.code);
    let from = parse_square(&input.from)?;
    let to = parse_square(&input.to)?;
    let promotion = input
        .promotion
        .as_deref()
        .map(|p| {
            let mut chars = p.chars();
            match (chars.next().and_then(parse_promotion), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(ApiError::InvalidRequest(format!("invalid promotion: {p}"))),
            }
        })
        .transpose()?;

    let next = state.codec.apply_move(&position, from, to, promotion)?;
    let code = state.codec.generate(&next);
    debug!(from = %input.code, to = %code, "move played");

    Ok(Json(describe(&state, &code, next, None)))
}

// =========================================================================
// Legal Moves
// =========================================================================

/// GET /api/legal-moves?code=&from=
pub async fn legal_moves(
    State(state): State<SharedState>,
    Query(query): Query<LegalMovesQuery>,
) -> Result<Json<LegalMovesResponse>, ApiError> {
    let position = state.codec.parse(&query.code);
    let from = query.from.as_deref().map(parse_square).transpose()?;
    let destinations: Vec<Square> = state
        .codec
        .legal_destinations(&position, from)?
        .into_iter()
        .collect();

    Ok(Json(LegalMovesResponse {
        code: state.codec.generate(&position),
        from,
        count: destinations.len(),
        destinations,
    }))
}

// =========================================================================
// Helpers
// =========================================================================

/// Full view of `position` as reached through `code`.
fn describe(
    state: &AppState,
    code: &str,
    position: Position,
    perspective: Option<Side>,
) -> PositionResponse {
    let card = state.codec.share_card(code, &position, perspective);
    // Boards that decode but are not playable get no status.
    let status = state.codec.classify(&position).ok();
    let share_url = state.config.share_url(&card.code);
    let preview_url = state.config.preview_url(&card.preview_code);
    position_response(position, card, status, share_url, preview_url)
}

fn parse_square(text: &str) -> Result<Square, ApiError> {
    text.parse()
        .map_err(|_| ApiError::InvalidRequest(format!("invalid square: {text}")))
}

// =========================================================================
// Tests
// =========================================================================
