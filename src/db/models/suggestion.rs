#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Suggestion {
    pub id: i64,
    pub user_id: i64,
    pub message_id: i64,
    pub suggestion: String,
    pub resolved: bool,
}
