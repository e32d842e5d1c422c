/// Kind of moderation action, stored as its integer discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[repr(i64)]
pub enum ActionKind {
    Warn = 0,
    Mute = 1,
    Kick = 2,
    Ban = 3,
    Limbo = 4,
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::Warn => "Warn",
            ActionKind::Mute => "Mute",
            ActionKind::Kick => "Kick",
            ActionKind::Ban => "Ban",
            ActionKind::Limbo => "Limbo",
        }
    }

    /// Warns and kicks are instantaneous; only these kinds carry an expiry
    /// the scheduler has to undo.
    pub fn reversible(&self) -> bool {
        matches!(self, ActionKind::Mute | ActionKind::Ban | ActionKind::Limbo)
    }

    pub fn from_i64(v: i64) -> Option<Self> {
        match v {
            0 => Some(ActionKind::Warn),
            1 => Some(ActionKind::Mute),
            2 => Some(ActionKind::Kick),
            3 => Some(ActionKind::Ban),
            4 => Some(ActionKind::Limbo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ModerationAction {
    pub id: i64,
    pub user_id: i64,
    pub moderator_id: i64,
    pub reason: String,
    /// Unix seconds
    pub created_at: i64,
    /// Unix seconds; None = never expires
    pub expires_at: Option<i64>,
    pub kind: ActionKind,
    pub resolved: bool,
}

impl ModerationAction {
    /// Past its expiry but not yet resolved
    pub fn is_due(&self, now: i64) -> bool {
        !self.resolved && self.expires_at.map(|e| e <= now).unwrap_or(false)
    }
}
