use std::time::Duration;

/// How often the moderation scheduler sweeps for expired actions
pub const ACTION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// How long the player waits for a queued track before disconnecting
pub const QUEUE_WAIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Consecutive tracks played to an empty channel before the player tears down
pub const EMPTY_CHANNEL_THRESHOLD: u32 = 5;

/// How often stale unanswered tickets are checked
pub const TICKET_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Unanswered tickets older than this are deleted
pub const TICKET_RESPONSE_TIMEOUT_SECONDS: i64 = 60 * 10;

/// How long an applicant has to answer each interview question
pub const APPLICATION_QUESTION_TIMEOUT: Duration = Duration::from_secs(600);

/// How long a banned-word strike stays on the books
pub const AUTOMOD_STRIKE_WINDOW: Duration = Duration::from_secs(600);

/// Strikes inside the window before an automatic warning is issued
pub const AUTOMOD_STRIKE_THRESHOLD: usize = 5;

/// Minimum gap between XP grants for the same user
pub const XP_COOLDOWN: Duration = Duration::from_secs(60);

/// XP granted per counted message (inclusive range)
pub const XP_PER_MESSAGE: (i64, i64) = (15, 25);
