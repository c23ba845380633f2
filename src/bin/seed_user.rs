//! Creates a fixed test account: `test@example.com` / `test123`.

use anyhow::Context;
use time::OffsetDateTime;
use user_service::{
    auth::password::hash_password,
    config::AppConfig,
    db,
    users::{
        repo::{PgUserStore, StoreError, UserStore},
        repo_types::NewUser,
    },
};

const EMAIL: &str = "test@example.com";
const USERNAME: &str = "testuser";
const PASSWORD: &str = "test123";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "seed_user=info,user_service=info".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let pool = db::connect(&config).await?;
    db::run_migrations(&pool).await?;
    let store = PgUserStore::new(pool);

    let new_user = NewUser {
        username: USERNAME.into(),
        email: EMAIL.into(),
        password_hash: hash_password(PASSWORD)?,
        created_at: OffsetDateTime::now_utc(),
    };

    match store.create(new_user).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, email = EMAIL, "test user created");
            Ok(())
        }
        Err(StoreError::Duplicate(field)) => {
            tracing::warn!(%field, "user already exists");
            Ok(())
        }
        Err(e) => Err(e).context("create test user"),
    }
}
