//! Seed or repair the admin account.
//!
//! Usage: cargo run --bin create_admin
//! Credentials come from ADMIN_USERNAME / ADMIN_PASSWORD / ADMIN_EMAIL,
//! falling back to admin / admin123 / admin@library.com.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sqlx::postgres::PgPoolOptions;

use catalogue_server::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().expect("Failed to load configuration");

    tracing_subscriber::fmt()
        .with_env_filter("create_admin=info")
        .init();

    let username = std::env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());
    let email =
        std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@library.com".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    let existing: Option<i32> =
        sqlx::query_scalar("SELECT id FROM users WHERE username = $1 OR email = $2")
            .bind(&username)
            .bind(&email)
            .fetch_optional(&pool)
            .await?;

    match existing {
        Some(id) => {
            sqlx::query(
                "UPDATE users SET password = $1, is_admin = true, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
            )
            .bind(&hash)
            .bind(id)
            .execute(&pool)
            .await?;
            tracing::info!("Admin user '{}' updated (id {})", username, id);
        }
        None => {
            let id: i32 = sqlx::query_scalar(
                r#"
                INSERT INTO users (username, email, password, first_name, last_name, is_admin)
                VALUES ($1, $2, $3, 'Admin', 'User', true)
                RETURNING id
                "#,
            )
            .bind(&username)
            .bind(&email)
            .bind(&hash)
            .fetch_one(&pool)
            .await?;
            tracing::info!("Admin user '{}' created (id {})", username, id);
        }
    }

    Ok(())
}
