use std::time::Instant;

use dashmap::DashMap;
use rand::Rng;
use sqlx::SqlitePool;
use tracing::debug;

use crate::constants::timeouts::{XP_COOLDOWN, XP_PER_MESSAGE};
use crate::db::queries::levels;

/// Position within the level curve for a total XP amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: i64,
    /// XP earned past the current level's floor
    pub xp_into_level: i64,
    /// XP between the current level's floor and the next
    pub xp_for_next: i64,
}

/// Total XP required to reach a level.
pub fn xp_floor(level: i64) -> i64 {
    // 5/6 * l * (2l^2 + 27l + 91); exact in integers since the numerator
    // is always divisible by 6
    5 * level * (2 * level * level + 27 * level + 91) / 6
}

pub fn progress_for_xp(xp: i64) -> LevelProgress {
    let mut level = 0;
    while xp_floor(level + 1) <= xp {
        level += 1;
    }
    LevelProgress {
        level,
        xp_into_level: xp - xp_floor(level),
        xp_for_next: xp_floor(level + 1) - xp_floor(level),
    }
}

/// Count a message toward a user's XP, at most once per cooldown window.
/// Returns the new level when the message crossed a level boundary.
pub async fn grant_message_xp(
    pool: &SqlitePool,
    cooldowns: &DashMap<u64, Instant>,
    user_id: u64,
) -> Result<Option<i64>, sqlx::Error> {
    let now = Instant::now();
    if let Some(last) = cooldowns.get(&user_id) {
        if now.duration_since(*last) < XP_COOLDOWN {
            // The message still counts, it just earns nothing
            levels::add_message(pool, user_id as i64, 0).await?;
            return Ok(None);
        }
    }
    cooldowns.insert(user_id, now);

    let before = levels::get(pool, user_id as i64).await?.map(|u| u.xp).unwrap_or(0);

    let (min, max) = XP_PER_MESSAGE;
    let gained = rand::thread_rng().gen_range(min..=max);
    levels::add_message(pool, user_id as i64, gained).await?;

    let old_level = progress_for_xp(before).level;
    let new_level = progress_for_xp(before + gained).level;

    if new_level > old_level {
        debug!("User {} reached level {}", user_id, new_level);
        Ok(Some(new_level))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[test]
    fn test_curve_floors() {
        assert_eq!(xp_floor(0), 0);
        assert_eq!(xp_floor(1), 100);
        assert_eq!(xp_floor(2), 255);
        assert_eq!(xp_floor(3), 475);
        assert_eq!(xp_floor(10), 4675);
    }

    #[test]
    fn test_progress_boundaries() {
        assert_eq!(
            progress_for_xp(0),
            LevelProgress { level: 0, xp_into_level: 0, xp_for_next: 100 }
        );
        assert_eq!(
            progress_for_xp(99),
            LevelProgress { level: 0, xp_into_level: 99, xp_for_next: 100 }
        );
        // Exactly on the floor counts as having reached the level
        assert_eq!(
            progress_for_xp(100),
            LevelProgress { level: 1, xp_into_level: 0, xp_for_next: 155 }
        );
        assert_eq!(progress_for_xp(475).level, 3);
        assert_eq!(progress_for_xp(474).level, 2);
    }

    #[tokio::test]
    async fn test_cooldown_blocks_rapid_messages() {
        let pool = test_pool().await;
        let cooldowns = DashMap::new();

        grant_message_xp(&pool, &cooldowns, 42).await.unwrap();
        grant_message_xp(&pool, &cooldowns, 42).await.unwrap();
        grant_message_xp(&pool, &cooldowns, 42).await.unwrap();

        // Every message counts, but only the first one earned XP
        let user = levels::get(&pool, 42).await.unwrap().unwrap();
        assert_eq!(user.messages, 3);
        assert!((15..=25).contains(&user.xp));
    }

    #[tokio::test]
    async fn test_cooldown_is_per_user() {
        let pool = test_pool().await;
        let cooldowns = DashMap::new();

        grant_message_xp(&pool, &cooldowns, 1).await.unwrap();
        grant_message_xp(&pool, &cooldowns, 2).await.unwrap();

        assert_eq!(levels::get(&pool, 1).await.unwrap().unwrap().messages, 1);
        assert_eq!(levels::get(&pool, 2).await.unwrap().unwrap().messages, 1);
    }
}
