/// Fixed linear ticket lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[repr(i64)]
pub enum TicketState {
    /// Created, the opener has not written anything yet
    Created = 0,
    /// Opener responded, waiting for staff
    AwaitingStaff = 1,
    /// Staff responded, ticket is being handled
    Open = 2,
    Closed = 3,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub user_id: i64,
    pub channel_id: i64,
    pub state: TicketState,
    /// Unix seconds
    pub created_at: i64,
}

impl Ticket {
    /// Created tickets the opener never responded to get deleted after a
    /// grace period.
    pub fn is_stale(&self, now: i64, timeout_seconds: i64) -> bool {
        self.state == TicketState::Created && self.created_at + timeout_seconds < now
    }
}
