use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::codec::{MoveError, RulesError};

/// Structured API error that serializes to JSON.
#[derive(Debug)]
pub enum ApiError {
    InvalidMove(MoveError),
    InvalidRequest(String),
    InternalError(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::InvalidMove(err) => {
                (StatusCode::BAD_REQUEST, "INVALID_MOVE", err.to_string())
            }
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<MoveError> for ApiError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::Illegal { .. } => ApiError::InvalidMove(err),
            MoveError::InvalidPromotion(_) => ApiError::InvalidRequest(err.to_string()),
        }
    }
}

impl From<RulesError> for ApiError {
    fn from(err: RulesError) -> Self {
        match err {
            // Boards that decode but cannot be played (no kings, say).
            RulesError::InvalidBoard(_) => ApiError::InvalidRequest(err.to_string()),
            RulesError::IllegalMove { .. } => ApiError::InternalError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn error_to_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, json)
    }

    #[tokio::test]
    async fn invalid_request_returns_400() {
        let (status, json) = error_to_json(ApiError::InvalidRequest("bad input".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "INVALID_REQUEST");
        assert_eq!(json["error"]["message"], "bad input");
    }

    #[tokio::test]
    async fn internal_error_returns_500() {
        let (status, json) = error_to_json(ApiError::InternalError("oops".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn illegal_move_converts_to_invalid_move() {
        let err = MoveError::Illegal {
            from: "e4".into(),
            to: "e3".into(),
            reason: "illegal".into(),
        };
        let (status, json) = error_to_json(err.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "INVALID_MOVE");
    }

    #[tokio::test]
    async fn bad_promotion_converts_to_invalid_request() {
        let api_err: ApiError = MoveError::InvalidPromotion("k".into()).into();
        let (status, json) = error_to_json(api_err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "INVALID_REQUEST");
    }
}
