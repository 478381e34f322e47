use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub allowed_origin: String,
    /// Chat posts allowed per source IP per hour bucket.
    pub rate_limit: u32,
    /// Participant record TTL in seconds. Refreshed by heartbeat; a client
    /// that stops heartbeating vanishes from the room after this long.
    pub presence_ttl_secs: u64,
    /// Queued signal envelope TTL in seconds. Undelivered offers/answers
    /// must not accumulate forever.
    pub signal_ttl_secs: u64,
    /// Chat message retention in seconds.
    pub message_ttl_secs: u64,
    /// Idle reaper period in seconds.
    pub reap_interval_secs: u64,
    /// Shared TURN secret. Credential issuance is disabled when unset.
    pub turn_secret: Option<String>,
    /// Relay instance id on the control plane.
    pub turn_instance_id: Option<String>,
    /// Base URL of the compute control plane managing the relay instance.
    pub turn_control_url: Option<String>,
    /// Bearer token for the control plane.
    pub turn_control_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("VOICE_RELAY_HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port = env::var("VOICE_RELAY_PORT")
            .unwrap_or_else(|_| "3200".into())
            .parse::<u16>()
            .map_err(|e| format!("invalid VOICE_RELAY_PORT: {e}"))?;

        let allowed_origin = env::var("VOICE_RELAY_ALLOWED_ORIGIN").unwrap_or_else(|_| "*".into());

        let rate_limit = env::var("VOICE_RELAY_RATE_LIMIT")
            .unwrap_or_else(|_| "15".into())
            .parse::<u32>()
            .map_err(|e| format!("invalid VOICE_RELAY_RATE_LIMIT: {e}"))?;

        let presence_ttl_secs = env::var("VOICE_RELAY_PRESENCE_TTL")
            .unwrap_or_else(|_| "30".into())
            .parse::<u64>()
            .map_err(|e| format!("invalid VOICE_RELAY_PRESENCE_TTL: {e}"))?;

        let signal_ttl_secs = env::var("VOICE_RELAY_SIGNAL_TTL")
            .unwrap_or_else(|_| "60".into())
            .parse::<u64>()
            .map_err(|e| format!("invalid VOICE_RELAY_SIGNAL_TTL: {e}"))?;

        let message_ttl_secs = env::var("VOICE_RELAY_MESSAGE_TTL")
            .unwrap_or_else(|_| "604800".into())
            .parse::<u64>()
            .map_err(|e| format!("invalid VOICE_RELAY_MESSAGE_TTL: {e}"))?;

        let reap_interval_secs = env::var("VOICE_RELAY_REAP_INTERVAL")
            .unwrap_or_else(|_| "120".into())
            .parse::<u64>()
            .map_err(|e| format!("invalid VOICE_RELAY_REAP_INTERVAL: {e}"))?;

        Ok(Self {
            host,
            port,
            allowed_origin,
            rate_limit,
            presence_ttl_secs,
            signal_ttl_secs,
            message_ttl_secs,
            reap_interval_secs,
            turn_secret: env::var("VOICE_RELAY_TURN_SECRET").ok(),
            turn_instance_id: env::var("VOICE_RELAY_TURN_INSTANCE_ID").ok(),
            turn_control_url: env::var("VOICE_RELAY_TURN_CONTROL_URL").ok(),
            turn_control_token: env::var("VOICE_RELAY_TURN_CONTROL_TOKEN").ok(),
        })
    }
}
