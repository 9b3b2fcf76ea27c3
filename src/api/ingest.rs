//! Dice ingestion endpoint
//!
//! Lets external tools push dice for a chat user. The caller presents a
//! token issued with `token add`; faces arrive as a JSON array of face
//! objects (or a string holding one).

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

use super::AppState;
use crate::dice::FaceOptions;

/// Build the ingestion router mounted at `path`
pub fn router(path: &str) -> Router<AppState> {
    Router::new().route(path, post(ingest))
}

/// Response envelope shared by every outcome
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AddedDice>,
}

/// Payload of a successful add
#[derive(Debug, Serialize)]
pub struct AddedDice {
    pub name: String,
    pub id: i64,
}

fn reply(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(IngestResponse {
            code: status.as_u16(),
            message: message.into(),
            data: None,
        }),
    )
        .into_response()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// POST handler: `{action, token, data: {name, faces, group}}`
async fn ingest(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if !is_json(&headers) {
        return reply(StatusCode::BAD_REQUEST, "Invalid content type");
    }

    let body = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(body)) => body,
        _ => return reply(StatusCode::BAD_REQUEST, "Request body must be JSON object"),
    };

    if body.get("action").and_then(Value::as_str) != Some("add") {
        return reply(StatusCode::NOT_FOUND, "Action not supported");
    }

    let token = body.get("token").and_then(Value::as_str).unwrap_or_default();
    let user_id = match state.services.tokens.user_id_for_token(token).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => return reply(StatusCode::UNAUTHORIZED, "Invalid or expired token"),
        Err(e) => {
            error!("Token lookup failed: {}", e);
            return reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let data = body.get("data").and_then(Value::as_object);
    let name = data.and_then(|d| d.get("name")).and_then(Value::as_str);
    let Some(name) = name else {
        return reply(StatusCode::BAD_REQUEST, "Missing dice name");
    };
    let faces = match data.and_then(|d| d.get("faces")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => return reply(StatusCode::BAD_REQUEST, "Missing dice faces"),
        Some(other) => other.to_string(),
    };

    let mut options = FaceOptions::default().objects().with_jsonpath("$[*]");
    if let Some(group) = data.and_then(|d| d.get("group")).and_then(Value::as_str) {
        options = options.with_group(group);
    }

    match state.services.dices.add_dice(name, user_id, &faces, &options).await {
        Ok(dice) => (
            StatusCode::OK,
            Json(IngestResponse {
                code: 200,
                message: "Dice added successfully".to_string(),
                data: Some(AddedDice {
                    name: dice.name,
                    id: dice.id,
                }),
            }),
        )
            .into_response(),
        Err(e) if e.is_user_error() => {
            warn!("Rejected dice {} from user {}: {}", name, user_id, e);
            reply(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => {
            error!("Failed to add dice {} for user {}: {}", name, user_id, e);
            reply(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
