use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::Serialize;
use tokio::sync::RwLock;

/// The single well-known room, used when a request omits `roomId`.
pub const DEFAULT_ROOM: &str = "main";
/// Live participants a room may hold.
pub const ROOM_CAPACITY: usize = 10;

/// One live occupant of a room, as exposed over the wire. Internal fields
/// (expiry) never leave this module.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub client_id: String,
    pub username: String,
}

struct Record {
    username: String,
    expires_at: u64,
}

pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Server-issued opaque session identifier. Never client-supplied.
pub fn new_client_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Membership bookkeeping for rooms. Records expire passively: liveness is
/// decided against the clock at read time, and stale entries are pruned
/// opportunistically on writes. There is no cleanup task.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<RwLock<HashMap<(String, String), Record>>>,
    ttl_secs: u64,
}

impl RoomRegistry {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl_secs,
        }
    }

    /// All participants of `room_id` whose expiry has not passed.
    pub async fn list_live(&self, room_id: &str) -> Vec<Participant> {
        let now = now_secs();
        let records = self.inner.read().await;
        records
            .iter()
            .filter(|((room, _), rec)| room == room_id && rec.expires_at > now)
            .map(|((_, client_id), rec)| Participant {
                client_id: client_id.clone(),
                username: rec.username.clone(),
            })
            .collect()
    }

    /// Insert or overwrite a participant record with expiry `now + ttl`.
    pub async fn register(&self, room_id: &str, client_id: &str, username: &str) {
        let now = now_secs();
        let mut records = self.inner.write().await;
        records.retain(|_, rec| rec.expires_at > now);
        records.insert(
            (room_id.to_string(), client_id.to_string()),
            Record {
                username: username.to_string(),
                expires_at: now + self.ttl_secs,
            },
        );
    }

    /// Extend a record's expiry without touching other fields. Update-or-create:
    /// a heartbeat for an expired or unknown client writes a fresh record rather
    /// than failing, which is unobservable to the caller.
    pub async fn refresh(&self, room_id: &str, client_id: &str) {
        let now = now_secs();
        let mut records = self.inner.write().await;
        let rec = records
            .entry((room_id.to_string(), client_id.to_string()))
            .or_insert_with(|| Record {
                username: String::new(),
                expires_at: 0,
            });
        rec.expires_at = now + self.ttl_secs;
    }

    /// Delete a record immediately, independent of expiry. Idempotent.
    pub async fn evict(&self, room_id: &str, client_id: &str) {
        let mut records = self.inner.write().await;
        records.remove(&(room_id.to_string(), client_id.to_string()));
    }
}
