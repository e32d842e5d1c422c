mod action;
mod level_user;
mod self_role;
mod suggestion;
mod ticket;

pub use action::{ActionKind, ModerationAction};
pub use level_user::LevelUser;
pub use self_role::SelfRole;
pub use suggestion::Suggestion;
pub use ticket::{Ticket, TicketState};
