#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SelfRole {
    pub role_id: i64,
    pub name: String,
    pub description: String,
}
