use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand::RngExt;
use sqlx::SqlitePool;

use crate::db::models::{NewUser, User, UserStats};
use crate::error::AppError;

pub enum SignupOutcome {
    Created(User),
    /// Username or email already belongs to someone.
    Taken,
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes)?;
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hashes the password and inserts the user.
pub async fn signup(pool: &SqlitePool, new_user: &NewUser<'_>) -> Result<SignupOutcome, AppError> {
    let password_hash = hash_password(new_user.password)?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, image_url, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(new_user.username)
    .bind(new_user.email)
    .bind(&password_hash)
    .bind(new_user.image_url.filter(|url| !url.is_empty()))
    .bind(super::now())
    .execute(pool)
    .await;

    let id = match result {
        Ok(done) => done.last_insert_rowid(),
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            return Ok(SignupOutcome::Taken);
        }
        Err(err) => return Err(err.into()),
    };

    let user = find_by_id(pool, id).await?.ok_or(AppError::NotFound)?;
    Ok(SignupOutcome::Created(user))
}

/// Returns the user only when the password matches.
pub async fn authenticate(
    pool: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<Option<User>, sqlx::Error> {
    let user = find_by_username(pool, username).await?;
    Ok(user.filter(|user| verify_password(password, &user.password_hash)))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// All users, or those whose username contains `search`.
pub async fn list(pool: &SqlitePool, search: Option<&str>) -> Result<Vec<User>, sqlx::Error> {
    match search.filter(|q| !q.is_empty()) {
        Some(q) => {
            sqlx::query_as::<_, User>(
                "SELECT * FROM users WHERE username LIKE '%' || ? || '%' ORDER BY username",
            )
            .bind(q)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
                .fetch_all(pool)
                .await
        }
    }
}

pub async fn stats(pool: &SqlitePool, user_id: i64) -> Result<UserStats, sqlx::Error> {
    sqlx::query_as::<_, UserStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM messages WHERE user_id = ?) AS messages,
            (SELECT COUNT(*) FROM follows WHERE user_following_id = ?) AS following,
            (SELECT COUNT(*) FROM follows WHERE user_being_followed_id = ?) AS followers,
            (SELECT COUNT(*) FROM likes WHERE user_id = ?) AS likes
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
pub async fn delete_all(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let done = sqlx::query("DELETE FROM users").execute(pool).await?;
    Ok(done.rows_affected())
}
