use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::registry::{Participant, DEFAULT_ROOM};
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub client_id: Option<String>,
    pub room_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub participants: Vec<Participant>,
}

/// POST /voice/heartbeat — extend the caller's presence and return the
/// current room roster so the client can connect to newcomers.
pub async fn heartbeat(
    State(state): State<AppState>,
    Json(body): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    let client_id = match body.client_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(ApiError::missing("clientId")),
    };
    let room_id = body.room_id.unwrap_or_else(|| DEFAULT_ROOM.into());

    state.registry.refresh(&room_id, &client_id).await;
    let participants = state.registry.list_live(&room_id).await;

    Ok(Json(HeartbeatResponse { participants }))
}
