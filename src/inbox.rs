use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Offer,
    Answer,
}

/// One queued offer or answer awaiting delivery.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub sender_id: String,
    pub kind: SignalKind,
    pub sdp: String,
}

struct Queued {
    envelope: Envelope,
    /// Zero-padded millisecond timestamp plus a collision-free suffix;
    /// orders the inbox lexicographically even for same-millisecond deposits.
    seq: String,
    expires_at: u64,
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

static SEQ_SUFFIX: AtomicU64 = AtomicU64::new(0);

fn sequence_key() -> String {
    let suffix = SEQ_SUFFIX.fetch_add(1, Ordering::Relaxed) & 0xffff;
    format!("{:013}#{:04x}", now_millis(), suffix)
}

/// Transient per-client mailbox for signaling messages. Delivery is
/// read-equals-delete: a drain hands every live envelope to the caller and
/// forgets them. Envelopes never polled expire on their own.
#[derive(Clone)]
pub struct SignalInbox {
    inner: Arc<RwLock<HashMap<String, Vec<Queued>>>>,
    ttl_secs: u64,
}

impl SignalInbox {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl_secs,
        }
    }

    /// Append an envelope to `recipient_id`'s inbox.
    pub async fn deposit(&self, recipient_id: &str, envelope: Envelope) {
        let now = now_secs();
        let mut inboxes = self.inner.write().await;
        inboxes
            .entry(recipient_id.to_string())
            .or_default()
            .push(Queued {
                envelope,
                seq: sequence_key(),
                expires_at: now + self.ttl_secs,
            });
    }

    /// Return all live envelopes for `recipient_id` in sequence order and
    /// delete them. A second drain sees nothing.
    pub async fn drain(&self, recipient_id: &str) -> Vec<Envelope> {
        let now = now_secs();
        let mut inboxes = self.inner.write().await;
        let Some(mut queued) = inboxes.remove(recipient_id) else {
            return Vec::new();
        };
        queued.retain(|q| q.expires_at > now);
        queued.sort_by(|a, b| a.seq.cmp(&b.seq));
        queued.into_iter().map(|q| q.envelope).collect()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
