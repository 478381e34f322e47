use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::registry::now_secs;

/// At most this many messages per query.
const QUERY_LIMIT: usize = 100;
/// Without an explicit `since`, show the last day so old rooms aren't blank.
const DEFAULT_WINDOW_MILLIS: u64 = 86_400_000;

/// One chat message, as exposed over the wire.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub username: String,
    pub content: String,
    pub ts: u64,
}

struct Stored {
    message: Message,
    expires_at: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn message_id() -> String {
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Append-only chat log for the main room with passive expiry.
#[derive(Clone)]
pub struct MessageLog {
    inner: Arc<RwLock<Vec<Stored>>>,
    ttl_secs: u64,
}

impl MessageLog {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
            ttl_secs,
        }
    }

    pub async fn append(&self, username: &str, content: &str) -> Message {
        let message = Message {
            id: message_id(),
            username: username.to_string(),
            content: content.to_string(),
            ts: now_millis(),
        };
        let mut log = self.inner.write().await;
        let now = now_secs();
        log.retain(|s| s.expires_at > now);
        log.push(Stored {
            message: message.clone(),
            expires_at: now + self.ttl_secs,
        });
        message
    }

    /// Messages newer than `since` (milliseconds), ascending by timestamp,
    /// capped at 100. `None` defaults to the last 24 hours.
    pub async fn since(&self, since: Option<u64>) -> Vec<Message> {
        let cutoff = since.unwrap_or_else(|| now_millis().saturating_sub(DEFAULT_WINDOW_MILLIS));
        let now = now_secs();
        let log = self.inner.read().await;
        let mut messages: Vec<Message> = log
            .iter()
            .filter(|s| s.expires_at > now && s.message.ts > cutoff)
            .map(|s| s.message.clone())
            .collect();
        messages.sort_by_key(|m| m.ts);
        messages.truncate(QUERY_LIMIT);
        messages
    }
}
