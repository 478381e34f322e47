pub mod health;
pub mod heartbeat;
pub mod join;
pub mod leave;
pub mod messages;
pub mod signal;
pub mod turn_status;
