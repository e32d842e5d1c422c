pub mod duration;
pub mod formatting;
pub mod permissions;
