use std::fmt;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use crate::users::repo_types::{DailyCount, NewUser, User};

/// Column guarded by a unique constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    Username,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Email => f.write_str("email"),
            UniqueField::Username => f.write_str("username"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already in use")]
    Duplicate(UniqueField),
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("username") => UniqueField::Username,
                    _ => UniqueField::Email,
                };
                return StoreError::Duplicate(field);
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Highest id first.
    NewestFirst,
    /// Lowest id first.
    OldestFirst,
}

/// Everything the handlers need from the `users` table.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    /// Overwrites username and email; returns the number of rows touched.
    async fn update_profile(&self, id: i64, username: &str, email: &str) -> StoreResult<u64>;
    /// Returns the number of rows removed (0 when the id was already gone).
    async fn delete(&self, id: i64) -> StoreResult<u64>;
    async fn list(&self, order: SortOrder) -> StoreResult<Vec<User>>;
    async fn count_all(&self) -> StoreResult<i64>;
    /// Counts rows with `start <= created_at < end`.
    async fn count_created_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> StoreResult<i64>;
    async fn count_created_since(&self, since: OffsetDateTime) -> StoreResult<i64>;
    /// Registrations per UTC day for rows created at or after `since`, oldest day first.
    /// Days without registrations are absent.
    async fn daily_registrations(&self, since: OffsetDateTime) -> StoreResult<Vec<DailyCount>>;
}

/// Postgres-backed store; every call checks a connection out of the pool.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;
        debug!(user_id = created.id, "user row inserted");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn update_profile(&self, id: i64, username: &str, email: &str) -> StoreResult<u64> {
        let res = sqlx::query(
            r#"
            UPDATE users
            SET username = $1, email = $2
            WHERE id = $3
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> StoreResult<u64> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    #[instrument(skip(self))]
    async fn list(&self, order: SortOrder) -> StoreResult<Vec<User>> {
        let sql = match order {
            SortOrder::NewestFirst => {
                "SELECT id, username, email, password, created_at FROM users ORDER BY id DESC"
            }
            SortOrder::OldestFirst => {
                "SELECT id, username, email, password, created_at FROM users ORDER BY id ASC"
            }
        };
        let rows = sqlx::query_as::<_, User>(sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn count_all(&self) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    #[instrument(skip(self))]
    async fn count_created_between(
        &self,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE created_at >= $1 AND created_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        Ok(n)
    }

    #[instrument(skip(self))]
    async fn count_created_since(&self, since: OffsetDateTime) -> StoreResult<i64> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE created_at >= $1")
            .bind(since)
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    #[instrument(skip(self))]
    async fn daily_registrations(&self, since: OffsetDateTime) -> StoreResult<Vec<DailyCount>> {
        let rows = sqlx::query_as::<_, DailyCount>(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count
            FROM users
            WHERE created_at >= $1
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
