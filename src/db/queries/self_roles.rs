use sqlx::SqlitePool;

use crate::db::models::SelfRole;

pub async fn add(
    pool: &SqlitePool,
    role_id: i64,
    name: &str,
    description: &str,
) -> Result<bool, sqlx::Error> {
    if get(pool, role_id).await?.is_some() {
        return Ok(false);
    }

    sqlx::query("INSERT INTO self_roles (role_id, name, description) VALUES (?, ?, ?)")
        .bind(role_id)
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;

    Ok(true)
}

pub async fn get(pool: &SqlitePool, role_id: i64) -> Result<Option<SelfRole>, sqlx::Error> {
    sqlx::query_as::<_, SelfRole>("SELECT * FROM self_roles WHERE role_id = ?")
        .bind(role_id)
        .fetch_optional(pool)
        .await
}

pub async fn by_name(pool: &SqlitePool, name: &str) -> Result<Option<SelfRole>, sqlx::Error> {
    sqlx::query_as::<_, SelfRole>("SELECT * FROM self_roles WHERE name = ? COLLATE NOCASE")
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub async fn all(pool: &SqlitePool) -> Result<Vec<SelfRole>, sqlx::Error> {
    sqlx::query_as::<_, SelfRole>("SELECT * FROM self_roles ORDER BY name")
        .fetch_all(pool)
        .await
}

pub async fn remove(pool: &SqlitePool, role_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM self_roles WHERE role_id = ?")
        .bind(role_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
