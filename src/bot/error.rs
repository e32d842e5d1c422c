use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Discord API error: {0}")]
    Serenity(#[from] serenity::Error),

    #[error("Action #{0} does not exist.")]
    ActionNotFound(i64),

    #[error("Suggestion #{0} does not exist.")]
    SuggestionNotFound(i64),

    #[error("Suggestion #{0} has already been resolved.")]
    SuggestionResolved(i64),

    #[error("That ticket doesn't exist.")]
    TicketNotFound,

    #[error("That self-assignable role doesn't exist.")]
    SelfRoleNotFound,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid duration `{0}`. Use a number followed by s, m, h, d or w (e.g. `45m`, `2h`, `7d`).")]
    InvalidDuration(String),

    #[error("Please provide a number between 1 and {0}.")]
    InvalidRange(usize),

    #[error("There was an error processing your song: {0}")]
    Resolution(String),

    #[error("Voice error: {0}")]
    Voice(String),

    #[error("{0}")]
    Custom(String),
}

impl Error {
    pub fn custom<S: Into<String>>(msg: S) -> Self {
        Error::Custom(msg.into())
    }

    /// Whether this error is a domain error that should be surfaced to the
    /// invoking user as-is. Everything else gets an opaque error code and is
    /// forwarded to the exceptions channel.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::ActionNotFound(_)
                | Error::SuggestionNotFound(_)
                | Error::SuggestionResolved(_)
                | Error::TicketNotFound
                | Error::SelfRoleNotFound
                | Error::PermissionDenied(_)
                | Error::InvalidDuration(_)
                | Error::InvalidRange(_)
                | Error::Resolution(_)
                | Error::Voice(_)
                | Error::Custom(_)
        )
    }

    /// Short uppercase code used in the generic "unhandled exception" reply.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Database(_) => "DATABASE",
            Error::Serenity(_) => "DISCORD",
            _ => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_split() {
        assert!(Error::ActionNotFound(3).is_user_facing());
        assert!(Error::InvalidDuration("soon".into()).is_user_facing());
        assert!(Error::PermissionDenied("nope".into()).is_user_facing());
        assert!(!Error::Database(sqlx::Error::PoolClosed).is_user_facing());
    }

    #[test]
    fn test_opaque_codes() {
        assert_eq!(Error::Database(sqlx::Error::PoolClosed).code(), "DATABASE");
    }
}
