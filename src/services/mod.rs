pub mod applications;
pub mod levels;
pub mod moderation;
pub mod music;
pub mod tickets;
