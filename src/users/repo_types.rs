use sqlx::FromRow;
use time::{Date, OffsetDateTime};

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String, // Argon2 PHC string, never the plaintext
    pub created_at: OffsetDateTime,
}

/// Row to insert on registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: OffsetDateTime,
}

/// Registrations on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct DailyCount {
    pub day: Date,
    pub count: i64,
}
