use sqlx::SqlitePool;

use crate::db::models::{Message, MessageWithAuthor};

pub const MAX_MESSAGE_LEN: usize = 140;
pub const PAGE_SIZE: i64 = 100;

const WITH_AUTHOR: &str = r#"
    SELECT m.id, m.user_id, m.text, m.created_at, u.username, u.image_url
    FROM messages m
    JOIN users u ON u.id = m.user_id
"#;

pub async fn create(pool: &SqlitePool, user_id: i64, text: &str) -> Result<Message, sqlx::Error> {
    let created_at = super::now();
    let done = sqlx::query("INSERT INTO messages (user_id, text, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(text)
        .bind(created_at)
        .execute(pool)
        .await?;

    Ok(Message {
        id: done.last_insert_rowid(),
        user_id,
        text: text.to_string(),
        created_at,
    })
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_with_author(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<MessageWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, MessageWithAuthor>(&format!("{WITH_AUTHOR} WHERE m.id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Newest first.
pub async fn for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<MessageWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, MessageWithAuthor>(&format!(
        "{WITH_AUTHOR} WHERE m.user_id = ? ORDER BY m.created_at DESC, m.id DESC LIMIT ?"
    ))
    .bind(user_id)
    .bind(PAGE_SIZE)
    .fetch_all(pool)
    .await
}

/// Messages by the user and everyone they follow, newest first.
pub async fn timeline(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<MessageWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, MessageWithAuthor>(&format!(
        r#"{WITH_AUTHOR}
        WHERE m.user_id = ?
           OR m.user_id IN (SELECT user_being_followed_id FROM follows WHERE user_following_id = ?)
        ORDER BY m.created_at DESC, m.id DESC
        LIMIT ?"#
    ))
    .bind(user_id)
    .bind(user_id)
    .bind(PAGE_SIZE)
    .fetch_all(pool)
    .await
}

pub async fn liked_by(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<MessageWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, MessageWithAuthor>(&format!(
        r#"{WITH_AUTHOR}
        JOIN likes l ON l.message_id = m.id
        WHERE l.user_id = ?
        ORDER BY m.created_at DESC, m.id DESC"#
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Returns whether a row was removed.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let done = sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(done.rows_affected() > 0)
}

#[cfg(test)]
pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM messages")
        .fetch_one(pool)
        .await
}

#[cfg(test)]
pub async fn delete_all(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let done = sqlx::query("DELETE FROM messages").execute(pool).await?;
    Ok(done.rows_affected())
}
