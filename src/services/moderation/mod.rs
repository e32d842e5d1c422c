pub mod automod;
pub mod escalation;
pub mod gateway;
pub mod scheduler;
