use sqlx::SqlitePool;

use crate::db::models::Suggestion;

pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    message_id: i64,
    suggestion: &str,
) -> Result<Suggestion, sqlx::Error> {
    let (next,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) + 1 FROM suggestions")
        .fetch_one(pool)
        .await?;

    sqlx::query(
        "INSERT INTO suggestions (id, user_id, message_id, suggestion, resolved) VALUES (?, ?, ?, ?, 0)",
    )
    .bind(next)
    .bind(user_id)
    .bind(message_id)
    .bind(suggestion)
    .execute(pool)
    .await?;

    Ok(Suggestion {
        id: next,
        user_id,
        message_id,
        suggestion: suggestion.to_string(),
        resolved: false,
    })
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Suggestion>, sqlx::Error> {
    sqlx::query_as::<_, Suggestion>("SELECT * FROM suggestions WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn mark_resolved(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE suggestions SET resolved = 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_sequential_ids() {
        let pool = test_pool().await;

        let a = create(&pool, 1, 100, "more emotes").await.unwrap();
        let b = create(&pool, 2, 101, "less emotes").await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));

        assert!(mark_resolved(&pool, a.id).await.unwrap());
        assert!(get(&pool, a.id).await.unwrap().unwrap().resolved);
        assert!(!mark_resolved(&pool, 99).await.unwrap());
    }
}
