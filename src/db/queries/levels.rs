use sqlx::SqlitePool;

use crate::db::models::LevelUser;

pub async fn get(pool: &SqlitePool, user_id: i64) -> Result<Option<LevelUser>, sqlx::Error> {
    sqlx::query_as::<_, LevelUser>("SELECT * FROM levels WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Record one counted message and its XP in a single upsert.
pub async fn add_message(pool: &SqlitePool, user_id: i64, xp: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO levels (user_id, messages, xp) VALUES (?, 1, ?)
        ON CONFLICT (user_id) DO UPDATE SET messages = messages + 1, xp = xp + excluded.xp
        "#,
    )
    .bind(user_id)
    .bind(xp)
    .execute(pool)
    .await?;

    Ok(())
}

/// All users ordered by XP, highest first.
pub async fn leaderboard(pool: &SqlitePool) -> Result<Vec<LevelUser>, sqlx::Error> {
    sqlx::query_as::<_, LevelUser>("SELECT * FROM levels ORDER BY xp DESC, user_id")
        .fetch_all(pool)
        .await
}

/// 1-based leaderboard position of a user.
pub async fn rank_of(pool: &SqlitePool, user_id: i64) -> Result<Option<i64>, sqlx::Error> {
    if get(pool, user_id).await?.is_none() {
        return Ok(None);
    }

    let (rank,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) + 1 FROM levels
        WHERE xp > (SELECT xp FROM levels WHERE user_id = ?)
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(Some(rank))
}
