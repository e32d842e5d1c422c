use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::models::{Ticket, TicketState};

pub async fn create(
    pool: &SqlitePool,
    user_id: i64,
    channel_id: i64,
) -> Result<Ticket, sqlx::Error> {
    create_at(pool, user_id, channel_id, Utc::now().timestamp()).await
}

pub async fn create_at(
    pool: &SqlitePool,
    user_id: i64,
    channel_id: i64,
    now: i64,
) -> Result<Ticket, sqlx::Error> {
    let (next,): (i64,) = sqlx::query_as("SELECT COALESCE(MAX(id), 0) + 1 FROM tickets")
        .fetch_one(pool)
        .await?;

    sqlx::query(
        "INSERT INTO tickets (id, user_id, channel_id, state, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(next)
    .bind(user_id)
    .bind(channel_id)
    .bind(TicketState::Created)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(Ticket {
        id: next,
        user_id,
        channel_id,
        state: TicketState::Created,
        created_at: now,
    })
}

pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn by_channel(
    pool: &SqlitePool,
    channel_id: i64,
) -> Result<Option<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE channel_id = ?")
        .bind(channel_id)
        .fetch_optional(pool)
        .await
}

pub async fn all(pool: &SqlitePool) -> Result<Vec<Ticket>, sqlx::Error> {
    sqlx::query_as::<_, Ticket>("SELECT * FROM tickets ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn set_state(
    pool: &SqlitePool,
    id: i64,
    state: TicketState,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE tickets SET state = ? WHERE id = ?")
        .bind(state)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tickets WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
