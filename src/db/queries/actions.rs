use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::{ActionKind, ModerationAction};

/// Create a moderation action. `duration` is in seconds; `None` means the
/// action never expires on its own.
pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    moderator_id: i64,
    reason: &str,
    kind: ActionKind,
    duration: Option<i64>,
) -> Result<ModerationAction, sqlx::Error> {
    create_at(pool, user_id, moderator_id, reason, kind, duration, Utc::now().timestamp()).await
}

/// Like [`create`] but with an explicit clock, so expiry math is testable.
#[allow(clippy::too_many_arguments)]
pub async fn create_at(
    pool: &SqlitePool,
    user_id: i64,
    moderator_id: i64,
    reason: &str,
    kind: ActionKind,
    duration: Option<i64>,
    now: i64,
) -> Result<ModerationAction, sqlx::Error> {
    // Warns and kicks have no reversal, so they never carry an expiry
    let duration = if kind.reversible() { duration } else { None };
    let expires_at = duration.map(|d| now + d);

    // Ids come from a separately persisted counter so deleting the
    // highest-numbered action can never recycle its id.
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE action_counter SET last_id = last_id + 1 WHERE id = 0")
        .execute(&mut *tx)
        .await?;

    let (id,): (i64,) = sqlx::query_as("SELECT last_id FROM action_counter WHERE id = 0")
        .fetch_one(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO actions (id, user_id, moderator_id, reason, created_at, expires_at, kind, resolved)
        VALUES (?, ?, ?, ?, ?, ?, ?, 0)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(moderator_id)
    .bind(reason)
    .bind(now)
    .bind(expires_at)
    .bind(kind)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ModerationAction {
        id,
        user_id,
        moderator_id,
        reason: reason.to_string(),
        created_at: now,
        expires_at,
        kind,
        resolved: false,
    })
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<ModerationAction>, sqlx::Error> {
    sqlx::query_as::<_, ModerationAction>("SELECT * FROM actions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<ModerationAction>, sqlx::Error> {
    sqlx::query_as::<_, ModerationAction>(
        "SELECT * FROM actions WHERE user_id = ? ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn of_kind(
    pool: &SqlitePool,
    user_id: i64,
    kind: ActionKind,
) -> Result<Vec<ModerationAction>, sqlx::Error> {
    sqlx::query_as::<_, ModerationAction>(
        "SELECT * FROM actions WHERE user_id = ? AND kind = ? ORDER BY id",
    )
    .bind(user_id)
    .bind(kind)
    .fetch_all(pool)
    .await
}

pub async fn count_of_kind(
    pool: &SqlitePool,
    user_id: i64,
    kind: ActionKind,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM actions WHERE user_id = ? AND kind = ?")
            .bind(user_id)
            .bind(kind)
            .fetch_one(pool)
            .await?;

    Ok(row.0)
}

/// Unresolved actions whose expiry has passed
pub async fn due(pool: &SqlitePool, now: i64) -> Result<Vec<ModerationAction>, sqlx::Error> {
    sqlx::query_as::<_, ModerationAction>(
        r#"
        SELECT * FROM actions
        WHERE resolved = 0 AND expires_at IS NOT NULL AND expires_at <= ?
        ORDER BY id
        "#,
    )
    .bind(now)
    .fetch_all(pool)
    .await
}

/// The newest unresolved action of a kind for a user, if any. Used by the
/// explicit reversal commands (unmute/unban/unlimbo).
pub async fn latest_active_of_kind(
    pool: &SqlitePool,
    user_id: i64,
    kind: ActionKind,
) -> Result<Option<ModerationAction>, sqlx::Error> {
    sqlx::query_as::<_, ModerationAction>(
        r#"
        SELECT * FROM actions
        WHERE user_id = ? AND kind = ? AND resolved = 0
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(kind)
    .fetch_optional(pool)
    .await
}

/// Mark an action resolved. Returns false when no action has this id;
/// marking an already-resolved action again is a no-op that returns true.
pub async fn mark_resolved(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE actions SET resolved = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_reason(pool: &SqlitePool, id: i64, reason: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE actions SET reason = ? WHERE id = ?")
        .bind(reason)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM actions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
