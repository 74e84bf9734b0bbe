use std::collections::HashSet;

use sqlx::SqlitePool;

use crate::db::models::User;

/// `follower_id` starts following `followed_id`. Repeating it is a no-op.
pub async fn follow(
    pool: &SqlitePool,
    follower_id: i64,
    followed_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO follows (user_being_followed_id, user_following_id) VALUES (?, ?)",
    )
    .bind(followed_id)
    .bind(follower_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn unfollow(
    pool: &SqlitePool,
    follower_id: i64,
    followed_id: i64,
) -> Result<bool, sqlx::Error> {
    let done = sqlx::query(
        "DELETE FROM follows WHERE user_being_followed_id = ? AND user_following_id = ?",
    )
    .bind(followed_id)
    .bind(follower_id)
    .execute(pool)
    .await?;

    Ok(done.rows_affected() > 0)
}

#[cfg(test)]
pub async fn is_following(
    pool: &SqlitePool,
    follower_id: i64,
    followed_id: i64,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE user_being_followed_id = ? AND user_following_id = ?)",
    )
    .bind(followed_id)
    .bind(follower_id)
    .fetch_one(pool)
    .await
}

/// Users that `user_id` follows.
pub async fn following(pool: &SqlitePool, user_id: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM users u
        JOIN follows f ON f.user_being_followed_id = u.id
        WHERE f.user_following_id = ?
        ORDER BY u.username
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn following_ids(pool: &SqlitePool, user_id: i64) -> Result<HashSet<i64>, sqlx::Error> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT user_being_followed_id FROM follows WHERE user_following_id = ?")
            .bind(user_id)
            .fetch_all(pool)
            .await?;
    Ok(ids.into_iter().collect())
}

/// Users following `user_id`.
pub async fn followers(pool: &SqlitePool, user_id: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM users u
        JOIN follows f ON f.user_following_id = u.id
        WHERE f.user_being_followed_id = ?
        ORDER BY u.username
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
pub async fn delete_all(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let done = sqlx::query("DELETE FROM follows").execute(pool).await?;
    Ok(done.rows_affected())
}
