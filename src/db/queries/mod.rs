pub mod actions;
pub mod levels;
pub mod self_roles;
pub mod suggestions;
pub mod tickets;
