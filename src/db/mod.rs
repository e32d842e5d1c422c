pub mod models;
pub mod pool;
pub mod queries;

/// In-memory database with the full schema applied, for tests.
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    use sqlx::sqlite::SqlitePoolOptions;

    // A single connection so every test query sees the same :memory: db
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    pool::run_migrations(&pool).await.expect("migrations");
    pool
}
