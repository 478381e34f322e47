use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::messages::Message;
use crate::state::AppState;

const MAX_CONTENT: usize = 500;
const MAX_USERNAME: usize = 30;

#[derive(Deserialize)]
pub struct MessagesQuery {
    pub since: Option<u64>,
}

/// GET /messages?since= — chat history, ascending, capped at 100 entries.
pub async fn get_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Json<Vec<Message>> {
    Json(state.messages.since(query.since).await)
}

#[derive(Deserialize)]
pub struct PostMessageRequest {
    pub username: Option<String>,
    pub content: Option<String>,
}

/// POST /messages — append one chat message, rate limited per source IP.
pub async fn post_message(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let username = clipped(body.username.as_deref(), MAX_USERNAME);
    let content = clipped(body.content.as_deref(), MAX_CONTENT);
    let (Some(username), Some(content)) = (username, content) else {
        return Err(ApiError::Validation("username and content are required".into()));
    };

    if !state.limiter.check(&addr.ip().to_string()).await {
        return Err(ApiError::RateLimited);
    }

    let message = state.messages.append(&username, &content).await;
    Ok((StatusCode::CREATED, Json(message)))
}

/// Trim, reject emptiness, truncate to `max` chars.
fn clipped(value: Option<&str>, max: usize) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::RelayController;

    fn plain_state() -> AppState {
        AppState::for_tests(RelayController::new(None, None))
    }

    fn from(ip: [u8; 4]) -> ConnectInfo<SocketAddr> {
        ConnectInfo(SocketAddr::from((ip, 12345)))
    }

    fn request(username: &str, content: &str) -> PostMessageRequest {
        PostMessageRequest {
            username: Some(username.into()),
            content: Some(content.into()),
        }
    }

    #[tokio::test]
    async fn missing_username_is_rejected() {
        let err = post_message(
            State(plain_state()),
            from([1, 2, 3, 4]),
            Json(PostMessageRequest {
                username: None,
                content: Some("hi".into()),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn whitespace_content_is_rejected() {
        let err = post_message(
            State(plain_state()),
            from([1, 2, 3, 4]),
            Json(request("alice", "   ")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn post_then_get_round_trips() {
        let state = plain_state();
        let (status, Json(posted)) = post_message(
            State(state.clone()),
            from([1, 2, 3, 4]),
            Json(request("alice", "hello")),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(posted.username, "alice");
        assert_eq!(posted.content, "hello");

        let Json(messages) =
            get_messages(State(state), Query(MessagesQuery { since: None })).await;
        assert_eq!(messages, vec![posted]);
    }

    #[tokio::test]
    async fn long_fields_are_truncated() {
        let (_, Json(posted)) = post_message(
            State(plain_state()),
            from([1, 2, 3, 4]),
            Json(request(&"u".repeat(40), &"c".repeat(600))),
        )
        .await
        .unwrap();
        assert_eq!(posted.username.len(), 30);
        assert_eq!(posted.content.len(), 500);
    }

    #[tokio::test]
    async fn rate_limit_applies_per_ip() {
        let state = plain_state();
        for i in 0..15 {
            post_message(
                State(state.clone()),
                from([1, 2, 3, 4]),
                Json(request("alice", &format!("msg {i}"))),
            )
            .await
            .unwrap();
        }

        let err = post_message(
            State(state.clone()),
            from([1, 2, 3, 4]),
            Json(request("alice", "one too many")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::RateLimited));

        // A different source is unaffected.
        post_message(State(state), from([5, 6, 7, 8]), Json(request("bob", "hi")))
            .await
            .unwrap();
    }
}
