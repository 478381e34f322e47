use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /voice/turn/status — relay readiness for the client's bounded poll
/// loop after a join that triggered a start.
pub async fn turn_status(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let status = state.relay.describe().await?;
    Ok(Json(json!({
        "ready": status.ready(),
        "host": status.public_ip,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::testutil::MockControl;
    use crate::relay::{InstanceControl, RelayController, RelayState};
    use std::sync::Arc;

    fn state_with(control: Arc<MockControl>) -> AppState {
        AppState::for_tests(RelayController::new(
            Some("secret".into()),
            Some(control as Arc<dyn InstanceControl>),
        ))
    }

    #[tokio::test]
    async fn running_instance_is_ready_with_host() {
        let state = state_with(MockControl::with_state(RelayState::Running, Some("1.2.3.4")));
        let Json(res) = turn_status(State(state)).await.unwrap();
        assert_eq!(res["ready"], true);
        assert_eq!(res["host"], "1.2.3.4");
    }

    #[tokio::test]
    async fn pending_instance_is_not_ready() {
        let state = state_with(MockControl::with_state(RelayState::Pending, None));
        let Json(res) = turn_status(State(state)).await.unwrap();
        assert_eq!(res["ready"], false);
        assert!(res["host"].is_null());
    }

    #[tokio::test]
    async fn unconfigured_relay_reports_not_ready() {
        let state = AppState::for_tests(RelayController::new(None, None));
        let Json(res) = turn_status(State(state)).await.unwrap();
        assert_eq!(res["ready"], false);
        assert!(res["host"].is_null());
    }

    #[tokio::test]
    async fn control_plane_failure_is_upstream() {
        let state = state_with(MockControl::failing());
        let err = turn_status(State(state)).await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream(_)));
    }
}
