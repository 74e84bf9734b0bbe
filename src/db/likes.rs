use std::collections::HashSet;

use sqlx::SqlitePool;

use crate::db::models::Like;

/// Likes the message, or removes the like if it already exists.
/// Returns whether the message is liked afterwards.
///
/// The insert goes first so two concurrent toggles cannot both see "not
/// liked" and collide on the primary key.
pub async fn toggle(pool: &SqlitePool, user_id: i64, message_id: i64) -> Result<bool, sqlx::Error> {
    let inserted = sqlx::query("INSERT OR IGNORE INTO likes (user_id, message_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(message_id)
        .execute(pool)
        .await?
        .rows_affected();

    if inserted > 0 {
        return Ok(true);
    }

    sqlx::query("DELETE FROM likes WHERE user_id = ? AND message_id = ?")
        .bind(user_id)
        .bind(message_id)
        .execute(pool)
        .await?;

    Ok(false)
}

pub async fn for_user(pool: &SqlitePool, user_id: i64) -> Result<Vec<Like>, sqlx::Error> {
    sqlx::query_as::<_, Like>("SELECT * FROM likes WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Ids of the messages `user_id` likes, for marking them in listings.
pub async fn liked_ids(pool: &SqlitePool, user_id: i64) -> Result<HashSet<i64>, sqlx::Error> {
    Ok(for_user(pool, user_id)
        .await?
        .into_iter()
        .map(|like| like.message_id)
        .collect())
}

#[cfg(test)]
pub async fn delete_all(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let done = sqlx::query("DELETE FROM likes").execute(pool).await?;
    Ok(done.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, messages, test_user};

    #[tokio::test]
    async fn test_toggle_like() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let alice = test_user(&pool, "alice").await;
        let bob = test_user(&pool, "bob").await;
        let message = messages::create(&pool, bob.id, "like me").await.unwrap();

        assert!(toggle(&pool, alice.id, message.id).await.unwrap());
        assert_eq!(
            for_user(&pool, alice.id).await.unwrap(),
            vec![Like {
                user_id: alice.id,
                message_id: message.id,
            }]
        );
        assert!(liked_ids(&pool, alice.id).await.unwrap().contains(&message.id));

        assert!(!toggle(&pool, alice.id, message.id).await.unwrap());
        assert!(liked_ids(&pool, alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_toggles_do_not_collide() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let alice = test_user(&pool, "alice").await;
        let bob = test_user(&pool, "bob").await;
        let message = messages::create(&pool, bob.id, "double click").await.unwrap();

        let (first, second) = tokio::join!(
            toggle(&pool, alice.id, message.id),
            toggle(&pool, alice.id, message.id),
        );
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_ne!(first, second);
        assert!(liked_ids(&pool, alice.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_likes_removed_with_message() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let alice = test_user(&pool, "alice").await;
        let message = messages::create(&pool, alice.id, "short lived").await.unwrap();
        toggle(&pool, alice.id, message.id).await.unwrap();

        messages::delete(&pool, message.id).await.unwrap();
        assert!(for_user(&pool, alice.id).await.unwrap().is_empty());
    }
}
