//! Message scanning for blacklisted words.
//!
//! Two tiers: illegal words send the author straight to limbo, banned
//! words delete the message and count a strike. Enough strikes inside
//! the window turn into an automatic warning, which feeds the usual
//! escalation policy.

use std::collections::HashSet;
use std::sync::Mutex as StdMutex;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

use crate::constants::timeouts::{AUTOMOD_STRIKE_THRESHOLD, AUTOMOD_STRIKE_WINDOW};

/// How long an illegal-word limbo lasts.
pub const ILLEGAL_WORD_LIMBO_SECONDS: i64 = 30 * 24 * 3600;

/// Posting one of these is an immediate limbo, no strikes.
static ILLEGAL_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "nigger", "nigga", "niggers", "niggas",
        "faggot", "faggots", "fag", "fags",
        "kike", "kikes",
        "chink", "chinks",
        "spic", "spics",
        "tranny", "trannies",
        "coon", "coons",
        "wetback", "wetbacks",
        "raghead", "ragheads",
        "dyke", "dykes",
    ]
    .into_iter()
    .collect()
});

/// Deleted on sight; repeated use escalates to a warning.
static BANNED_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "fuck", "fucking", "fucker", "fucked", "motherfucker",
        "shit", "shitty", "bullshit",
        "bitch", "bitches",
        "cunt", "cunts",
        "dick", "dickhead",
        "cock", "cocksucker",
        "pussy", "pussies",
        "asshole", "assholes",
        "whore", "whores",
        "slut", "sluts",
        "bastard", "bastards",
        "wanker", "wankers",
        "twat", "twats",
        "prick", "pricks",
        "porn", "porno",
    ]
    .into_iter()
    .collect()
});

/// Common substitutions used to slip words past the filter.
const LEET_SUBSTITUTIONS: [(char, char); 7] = [
    ('0', 'o'),
    ('1', 'i'),
    ('3', 'e'),
    ('!', 'i'),
    ('$', 's'),
    ('@', 'a'),
    ('|', 'l'),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infraction {
    /// Immediate limbo.
    Illegal,
    /// Delete and strike.
    Banned,
}

fn normalize(content: &str) -> String {
    content
        .to_lowercase()
        .chars()
        .map(|c| {
            LEET_SUBSTITUTIONS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

fn hits(view: &str, words: &HashSet<&'static str>) -> bool {
    view.split_whitespace().any(|word| words.contains(word))
}

/// Scan a message for blacklisted words. Matching runs over two views of
/// the text, one with punctuation turned into spaces and one with it
/// stripped, so punctuation-separated spellings like `b.a.d` still match.
pub fn scan(content: &str) -> Option<Infraction> {
    let normalized = normalize(content);

    let spaced: String = normalized
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    let stripped: String = normalized
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();

    if hits(&spaced, &ILLEGAL_WORDS) || hits(&stripped, &ILLEGAL_WORDS) {
        return Some(Infraction::Illegal);
    }
    if hits(&spaced, &BANNED_WORDS) || hits(&stripped, &BANNED_WORDS) {
        return Some(Infraction::Banned);
    }
    None
}

/// Sliding-window strike counter for banned-word deletions. `record`
/// returns true exactly when a user crosses the threshold, and clears
/// their strikes so the next run starts fresh.
pub struct StrikeTracker {
    window: Duration,
    threshold: usize,
    strikes: StdMutex<Vec<(u64, Instant)>>,
}

impl Default for StrikeTracker {
    fn default() -> Self {
        Self::new(AUTOMOD_STRIKE_WINDOW, AUTOMOD_STRIKE_THRESHOLD)
    }
}

impl StrikeTracker {
    pub fn new(window: Duration, threshold: usize) -> Self {
        Self {
            window,
            threshold,
            strikes: StdMutex::new(Vec::new()),
        }
    }

    pub fn record(&self, user_id: u64) -> bool {
        self.record_at(user_id, Instant::now())
    }

    fn record_at(&self, user_id: u64, now: Instant) -> bool {
        let mut strikes = match self.strikes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        strikes.retain(|(_, at)| now.duration_since(*at) < self.window);
        strikes.push((user_id, now));

        let count = strikes.iter().filter(|(u, _)| *u == user_id).count();
        if count >= self.threshold {
            strikes.retain(|(u, _)| *u != user_id);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_messages_pass() {
        assert_eq!(scan("hello there, how are you?"), None);
        assert_eq!(scan("can someone help with the bot setup"), None);
        assert_eq!(scan(""), None);
    }

    #[test]
    fn test_banned_word_detected() {
        assert_eq!(scan("well fuck"), Some(Infraction::Banned));
        assert_eq!(scan("WELL FUCK"), Some(Infraction::Banned));
    }

    #[test]
    fn test_illegal_word_outranks_banned() {
        assert_eq!(scan("fuck you nigger"), Some(Infraction::Illegal));
    }

    #[test]
    fn test_substitutions_and_punctuation_caught() {
        assert_eq!(scan("$hit happens"), Some(Infraction::Banned));
        assert_eq!(scan("b!tch"), Some(Infraction::Banned));
        assert_eq!(scan("f.u.c.k"), Some(Infraction::Banned));
    }

    #[test]
    fn test_substrings_do_not_match() {
        // Word-boundary matching keeps e.g. "class" or "Scunthorpe" clean
        assert_eq!(scan("assassin class shuttle"), None);
        assert_eq!(scan("Scunthorpe United"), None);
    }

    #[test]
    fn test_strikes_fire_on_threshold_then_reset() {
        let tracker = StrikeTracker::new(Duration::from_secs(600), 3);
        assert!(!tracker.record(7));
        assert!(!tracker.record(7));
        assert!(tracker.record(7));
        // Counter cleared after firing
        assert!(!tracker.record(7));
    }

    #[test]
    fn test_strikes_are_per_user() {
        let tracker = StrikeTracker::new(Duration::from_secs(600), 2);
        assert!(!tracker.record(1));
        assert!(!tracker.record(2));
        assert!(tracker.record(1));
    }

    #[tokio::test]
    async fn test_strike_threshold_records_a_warning() {
        use crate::db::queries::actions;
        use crate::db::test_pool;
        use crate::services::moderation::escalation::{
            self, EscalationPolicy, ESCALATION_MODERATOR_ID,
        };

        let pool = test_pool().await;
        let tracker = StrikeTracker::default();

        let mut warned = false;
        for _ in 0..AUTOMOD_STRIKE_THRESHOLD {
            if tracker.record(7) {
                let result = escalation::apply_warning(
                    &pool,
                    &EscalationPolicy::default(),
                    7,
                    ESCALATION_MODERATOR_ID,
                    "Repeated use of blacklisted words.",
                )
                .await
                .unwrap();
                assert_eq!(result.warning_count, 1);
                warned = true;
            }
        }
        assert!(warned);

        let history = actions::for_user(&pool, 7).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].moderator_id, ESCALATION_MODERATOR_ID);
    }

    #[test]
    fn test_old_strikes_expire() {
        let tracker = StrikeTracker::new(Duration::from_secs(600), 2);
        let start = Instant::now();
        assert!(!tracker.record_at(7, start));
        // A strike outside the window no longer counts
        assert!(!tracker.record_at(7, start + Duration::from_secs(601)));
        assert!(tracker.record_at(7, start + Duration::from_secs(602)));
    }
}
