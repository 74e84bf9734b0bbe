pub mod follows;
pub mod likes;
pub mod messages;
pub mod models;
pub mod schema;
pub mod users;

use std::str::FromStr;
use std::time::Duration;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

/// Opens the pool and makes sure every table exists.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.foreign_keys(true);

    let mut pool_options = SqlitePoolOptions::new().max_connections(5);
    if database_url.contains(":memory:") {
        // Each in-memory connection is its own database, so keep exactly one alive.
        pool_options = pool_options
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    }

    let pool = pool_options.connect_with(options).await?;

    schema::create_tables(&pool).await?;

    Ok(pool)
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Inserts a user without hashing a real password.
#[cfg(test)]
pub async fn test_user(pool: &SqlitePool, username: &str) -> models::User {
    let done = sqlx::query(
        "INSERT INTO users (username, email, password_hash, created_at) VALUES (?, ?, 'x', ?)",
    )
    .bind(username)
    .bind(format!("{username}@test.com"))
    .bind(now())
    .execute(pool)
    .await
    .unwrap();

    users::find_by_id(pool, done.last_insert_rowid())
        .await
        .unwrap()
        .unwrap()
}
