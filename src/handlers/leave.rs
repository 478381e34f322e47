use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::registry::DEFAULT_ROOM;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub client_id: Option<String>,
    pub room_id: Option<String>,
}

/// POST /voice/leave — evict the caller's presence record. Idempotent:
/// leaving with an unknown or already-expired clientId still succeeds. If
/// the room drains, the relay is stopped best-effort; a failure here is
/// swallowed because the leave itself has already happened and the idle
/// reaper will catch up.
pub async fn leave(
    State(state): State<AppState>,
    Json(body): Json<LeaveRequest>,
) -> Result<Json<Value>, ApiError> {
    let client_id = match body.client_id.as_deref() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(ApiError::missing("clientId")),
    };
    let room_id = body.room_id.unwrap_or_else(|| DEFAULT_ROOM.into());

    state.registry.evict(&room_id, &client_id).await;
    info!(room = %room_id, client_id = %client_id, "participant left");

    if state.relay.configured() && state.registry.list_live(&room_id).await.is_empty() {
        state.relay.stop_best_effort().await;
    }

    Ok(Json(json!({})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::testutil::MockControl;
    use crate::relay::{InstanceControl, RelayController, RelayState};
    use std::sync::Arc;

    fn request(client_id: &str) -> LeaveRequest {
        LeaveRequest {
            client_id: Some(client_id.into()),
            room_id: None,
        }
    }

    fn relay_state(control: Arc<MockControl>) -> AppState {
        AppState::for_tests(RelayController::new(
            Some("secret".into()),
            Some(control as Arc<dyn InstanceControl>),
        ))
    }

    #[tokio::test]
    async fn missing_client_id_is_rejected() {
        let state = AppState::for_tests(RelayController::new(None, None));
        let err = leave(
            State(state),
            Json(LeaveRequest {
                client_id: None,
                room_id: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn leave_removes_participant() {
        let state = AppState::for_tests(RelayController::new(None, None));
        state.registry.register(DEFAULT_ROOM, "c1", "alice").await;

        leave(State(state.clone()), Json(request("c1"))).await.unwrap();
        assert!(state.registry.list_live(DEFAULT_ROOM).await.is_empty());
    }

    #[tokio::test]
    async fn leave_of_unknown_client_succeeds() {
        let state = AppState::for_tests(RelayController::new(None, None));
        leave(State(state), Json(request("nobody"))).await.unwrap();
    }

    #[tokio::test]
    async fn last_leave_stops_the_relay() {
        let control = MockControl::with_state(RelayState::Running, Some("1.2.3.4"));
        let state = relay_state(control.clone());
        state.registry.register(DEFAULT_ROOM, "c1", "alice").await;

        leave(State(state), Json(request("c1"))).await.unwrap();
        assert_eq!(control.stop_count(), 1);
    }

    #[tokio::test]
    async fn leave_with_others_remaining_keeps_relay_running() {
        let control = MockControl::with_state(RelayState::Running, Some("1.2.3.4"));
        let state = relay_state(control.clone());
        state.registry.register(DEFAULT_ROOM, "c1", "alice").await;
        state.registry.register(DEFAULT_ROOM, "c2", "bob").await;

        leave(State(state), Json(request("c1"))).await.unwrap();
        assert_eq!(control.stop_count(), 0);
    }

    #[tokio::test]
    async fn relay_stop_failure_does_not_fail_the_leave() {
        let state = AppState::for_tests(RelayController::new(
            Some("secret".into()),
            Some(MockControl::failing() as Arc<dyn InstanceControl>),
        ));
        state.registry.register(DEFAULT_ROOM, "c1", "alice").await;

        leave(State(state), Json(request("c1"))).await.unwrap();
    }
}
