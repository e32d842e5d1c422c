#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LevelUser {
    pub user_id: i64,
    pub messages: i64,
    pub xp: i64,
}
