use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::inbox::{Envelope, SignalKind};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SignalRequest {
    pub from: Option<String>,
    pub to: Option<String>,
    /// "offer" or "answer". Kept as a string so an unknown value yields a
    /// proper validation error rather than a body-rejection.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sdp: Option<String>,
}

/// POST /voice/signal — deposit an offer/answer into the recipient's inbox.
///
/// Identity-agnostic by design: no check that `to` is (still) in any room.
/// A signal to a departed client just expires unread.
pub async fn signal(
    State(state): State<AppState>,
    Json(body): Json<SignalRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let from = require(body.from.as_deref(), "from")?;
    let to = require(body.to.as_deref(), "to")?;
    let sdp = require(body.sdp.as_deref(), "sdp")?;

    let kind = match body.kind.as_deref() {
        Some("offer") => SignalKind::Offer,
        Some("answer") => SignalKind::Answer,
        _ => {
            return Err(ApiError::Validation(
                "type must be \"offer\" or \"answer\"".into(),
            ))
        }
    };

    state
        .inbox
        .deposit(
            &to,
            Envelope {
                sender_id: from,
                kind,
                sdp,
            },
        )
        .await;

    Ok((StatusCode::CREATED, Json(json!({}))))
}

fn require(value: Option<&str>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ApiError::missing(field)),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalsQuery {
    pub client_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeliveredSignal {
    pub from: String,
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub sdp: String,
}

/// GET /voice/signals?clientId= — drain the caller's inbox. Read is delete:
/// every returned envelope is gone from subsequent polls.
pub async fn poll_signals(
    State(state): State<AppState>,
    Query(query): Query<SignalsQuery>,
) -> Result<Json<Vec<DeliveredSignal>>, ApiError> {
    let client_id = match query.client_id.as_deref() {
        Some(id) if !id.is_empty() => id,
        _ => return Err(ApiError::missing("clientId")),
    };

    let delivered = state
        .inbox
        .drain(client_id)
        .await
        .into_iter()
        .map(|e| DeliveredSignal {
            from: e.sender_id,
            kind: e.kind,
            sdp: e.sdp,
        })
        .collect();

    Ok(Json(delivered))
}
