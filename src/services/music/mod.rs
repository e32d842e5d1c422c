pub mod player;
pub mod registry;
pub mod resolver;
pub mod track;
pub mod voice;
