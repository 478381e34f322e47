use crate::config::Config;
use crate::inbox::SignalInbox;
use crate::limiter::RateLimiter;
use crate::messages::MessageLog;
use crate::registry::RoomRegistry;
use crate::relay::RelayController;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: RoomRegistry,
    pub inbox: SignalInbox,
    pub messages: MessageLog,
    pub limiter: RateLimiter,
    pub relay: RelayController,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let relay = RelayController::from_config(&config);
        let registry = RoomRegistry::new(config.presence_ttl_secs);
        let inbox = SignalInbox::new(config.signal_ttl_secs);
        let messages = MessageLog::new(config.message_ttl_secs);
        let limiter = RateLimiter::new(config.rate_limit);
        Self {
            config,
            registry,
            inbox,
            messages,
            limiter,
            relay,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// State with short-but-live TTLs and a caller-supplied relay controller.
    pub fn for_tests(relay: RelayController) -> Self {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            allowed_origin: "*".into(),
            rate_limit: 15,
            presence_ttl_secs: 30,
            signal_ttl_secs: 60,
            message_ttl_secs: 604_800,
            reap_interval_secs: 120,
            turn_secret: None,
            turn_instance_id: None,
            turn_control_url: None,
            turn_control_token: None,
        };
        Self {
            registry: RoomRegistry::new(config.presence_ttl_secs),
            inbox: SignalInbox::new(config.signal_ttl_secs),
            messages: MessageLog::new(config.message_ttl_secs),
            limiter: RateLimiter::new(config.rate_limit),
            relay,
            config,
        }
    }
}
