use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::registry::{new_client_id, Participant, DEFAULT_ROOM, ROOM_CAPACITY};
use crate::relay::{InstanceStatus, RelayState, TurnCredentials};
use crate::state::AppState;

const MAX_USERNAME: usize = 30;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub username: Option<String>,
    pub room_id: Option<String>,
    pub previous_client_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub client_id: String,
    pub participants: Vec<Participant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<TurnCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_ready: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_host: Option<String>,
}

/// POST /voice/join — the join/reclaim state machine.
///
/// A (room, username) pair is either free, occupied by a live participant, or
/// being reclaimed. Reclaim lets a client that refreshed its page evict its
/// own stale presence record (proven by `previousClientId`) instead of being
/// locked out by its own ghost until the TTL lapses. The reclaimed session
/// always gets a fresh clientId; the previous one may be stale in the
/// caller's own hands too.
pub async fn join(
    State(state): State<AppState>,
    Json(body): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let username = match body.username.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.chars().take(MAX_USERNAME).collect::<String>(),
        _ => return Err(ApiError::missing("username")),
    };
    let room_id = body.room_id.unwrap_or_else(|| DEFAULT_ROOM.into());

    let live = state.registry.list_live(&room_id).await;

    let conflict = live
        .iter()
        .find(|p| p.username.to_lowercase() == username.to_lowercase())
        .cloned();

    let reclaim = matches!(
        (&conflict, body.previous_client_id.as_deref()),
        (Some(c), Some(prev)) if c.client_id == prev
    );

    // A reclaim nets zero occupancy, so it passes the capacity check even
    // when the room is full.
    if !reclaim && live.len() >= ROOM_CAPACITY {
        return Err(ApiError::RoomFull);
    }

    let mut evicted: Option<String> = None;
    if let Some(conflict) = &conflict {
        if !reclaim {
            return Err(ApiError::NameTaken);
        }
        state.registry.evict(&room_id, &conflict.client_id).await;
        evicted = Some(conflict.client_id.clone());
    }

    let client_id = new_client_id();
    state.registry.register(&room_id, &client_id, &username).await;
    let participants = state.registry.list_live(&room_id).await;

    info!(
        room = %room_id,
        client_id = %client_id,
        username = %username,
        reclaimed = reclaim,
        "participant joined"
    );

    let mut response = JoinResponse {
        client_id: client_id.clone(),
        participants,
        turn: None,
        turn_ready: None,
        turn_host: None,
    };

    if let Some(creds) = state.relay.credentials(&client_id) {
        // "Empty" is judged from the joiner's perspective: self is not in
        // `live`, and a record evicted by this reclaim does not count as
        // someone already here.
        let was_empty = live
            .iter()
            .filter(|p| evicted.as_deref() != Some(p.client_id.as_str()))
            .count()
            == 0;

        let status = match state.relay.describe().await {
            Ok(status) => status,
            Err(e) => {
                warn!("relay describe failed during join: {e:#}");
                InstanceStatus::unavailable()
            }
        };

        if was_empty && !matches!(status.state, RelayState::Running | RelayState::Pending) {
            // Fire-and-forget: relay boot takes ~30s and the join must not
            // wait for it. The client polls /voice/turn/status.
            state.relay.spawn_start();
        }

        response.turn_ready = Some(status.ready());
        response.turn_host = status.public_ip;
        response.turn = Some(creds);
    }

    Ok(Json(response))
}
