//! Link metadata for a shared position: canonical code, page title,
//! board perspective and the preview-image code.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;

use super::Codec;
use super::types::{Position, Side};

/// Prefix of preview-image codes.
pub const PREVIEW_PREFIX: &str = "o-";

/// Everything a page or unfurl needs about a shared code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareCard {
    /// The canonical code for the position.
    pub code: String,
    /// Whether the incoming code should be redirected to `code`.
    pub redirect: bool,
    pub title: String,
    pub perspective: Side,
    pub preview_code: String,
}

impl Codec {
    /// Build the share card for an incoming `code` and its parsed position.
    ///
    /// `perspective` overrides the board orientation when given.
    pub fn share_card(
        &self,
        code: &str,
        position: &Position,
        perspective: Option<Side>,
    ) -> ShareCard {
        let canonical = self.generate(position);
        let perspective = perspective.unwrap_or(if code.is_empty() {
            Side::White
        } else {
            position.side_to_move()
        });
        ShareCard {
            // Codes that fall back to the start are served in place.
            redirect: !code.is_empty() && !canonical.is_empty() && code != canonical,
            code: canonical,
            title: title(position),
            perspective,
            preview_code: preview_code(position, perspective),
        }
    }
}

/// "White to move", or "Black moved to e5, White to move" when the last
/// move is known.
pub fn title(position: &Position) -> String {
    let side = position.side_to_move();
    match position.last_destination() {
        Some(dest) => format!(
            "{} moved to {dest}, {} to move",
            side.opposite().name(),
            side.name()
        ),
        None => format!("{} to move", side.name()),
    }
}

/// `o-` + base64url of the 64-square grid and the perspective letter.
pub fn preview_code(position: &Position, perspective: Side) -> String {
    let payload = format!("{}|{}", position.board().grid(), perspective.as_char());
    format!("{PREVIEW_PREFIX}{}", URL_SAFE_NO_PAD.encode(payload))
}

/// Parse a `w`/`b` perspective parameter; anything else is ignored.
pub fn parse_perspective(param: Option<&str>) -> Option<Side> {
    match param? {
        "w" => Some(Side::White),
        "b" => Some(Side::Black),
        _ => None,
    }
}
