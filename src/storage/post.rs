//! Post Redis operations.
//!
//! Redis key patterns:
//! - `post:{nanoid}` - post data (JSON)
//! - `posts` - ZSET of post IDs scored by creation time (ms)

use super::StorageError;
use crate::models::StoredPost;
use redis::AsyncCommands;

const POSTS_INDEX_KEY: &str = "posts";

fn post_key(id: &str) -> String {
    format!("post:{}", id)
}

/// Store a post and add it to the creation-time index.
///
/// Both writes happen in one Lua script so a post is never readable
/// without being listed.
pub async fn insert_post<C>(con: &mut C, post: &StoredPost) -> Result<(), StorageError>
where
    C: AsyncCommands,
{
    let json = serde_json::to_string(post)?;

    let script = redis::Script::new(
        r#"
        redis.call('SET', KEYS[1], ARGV[1])
        redis.call('ZADD', KEYS[2], ARGV[2], ARGV[3])
        return 1
        "#,
    );

    let _: i32 = script
        .key(post_key(&post.id))
        .key(POSTS_INDEX_KEY)
        .arg(json)
        .arg(post.created_at)
        .arg(&post.id)
        .invoke_async(con)
        .await?;

    Ok(())
}

/// Get a post by ID.
pub async fn get_post<C>(con: &mut C, id: &str) -> Result<Option<StoredPost>, StorageError>
where
    C: AsyncCommands,
{
    let json: Option<String> = con.get(post_key(id)).await?;

    match json {
        Some(data) => Ok(Some(serde_json::from_str(&data)?)),
        None => Ok(None),
    }
}

/// List all posts, newest first.
///
/// Posts sharing a timestamp come back in descending id order (the ZSET's
/// reverse lexicographic order). Index entries whose post key is gone are
/// skipped.
pub async fn list_posts<C>(con: &mut C) -> Result<Vec<StoredPost>, StorageError>
where
    C: AsyncCommands,
{
    let ids: Vec<String> = con.zrevrange(POSTS_INDEX_KEY, 0, -1).await?;
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let keys: Vec<String> = ids.iter().map(|id| post_key(id)).collect();
    // Explicit MGET: the typed helper degrades to GET for a single key
    let values: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(con).await?;

    let mut posts = Vec::with_capacity(ids.len());
    for (id, json) in ids.iter().zip(values) {
        if let Some(data) = json {
            match serde_json::from_str::<StoredPost>(&data) {
                Ok(post) => posts.push(post),
                Err(e) => tracing::warn!(post_id = %id, error = %e, "Skipping unreadable post"),
            }
        }
    }

    Ok(posts)
}

/// Overwrite an existing post.
///
/// Uses `SET ... XX` so a post deleted concurrently is not resurrected.
pub async fn update_post<C>(con: &mut C, post: &StoredPost) -> Result<bool, StorageError>
where
    C: AsyncCommands,
{
    let json = serde_json::to_string(post)?;

    let reply: Option<String> = redis::cmd("SET")
        .arg(post_key(&post.id))
        .arg(json)
        .arg("XX")
        .query_async(con)
        .await?;

    Ok(reply.is_some())
}

/// Delete a post and its index entry.
///
/// Uses a Lua script so the key and the index entry go together.
pub async fn delete_post<C>(con: &mut C, id: &str) -> Result<bool, StorageError>
where
    C: AsyncCommands,
{
    let script = redis::Script::new(
        r#"
        local deleted = redis.call('DEL', KEYS[1])
        redis.call('ZREM', KEYS[2], ARGV[1])
        return deleted
        "#,
    );

    let deleted: i32 = script
        .key(post_key(id))
        .key(POSTS_INDEX_KEY)
        .arg(id)
        .invoke_async(con)
        .await?;

    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_connection() -> Option<redis::aio::MultiplexedConnection> {
        // Note: these tests require a running Redis instance
        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let client = redis::Client::open(redis_url).ok()?;
        client.get_multiplexed_async_connection().await.ok()
    }

    fn test_post(created_at: u64) -> StoredPost {
        StoredPost {
            id: nanoid::nanoid!(12),
            title: "T".to_string(),
            content: "C".to_string(),
            author_id: "author".to_string(),
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn test_post_lifecycle() {
        let Some(mut con) = test_connection().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        // Far-future scores (still exact as f64) keep these ahead of
        // anything else in the index
        let older = test_post(9_000_000_000_000);
        let newer = test_post(9_000_000_000_001);
        insert_post(&mut con, &older).await.unwrap();
        insert_post(&mut con, &newer).await.unwrap();

        let listed = list_posts(&mut con).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|p| p.id.as_str()).collect();
        let newer_pos = ids.iter().position(|id| *id == newer.id).unwrap();
        let older_pos = ids.iter().position(|id| *id == older.id).unwrap();
        assert!(newer_pos < older_pos);

        let mut edited = older.clone();
        edited.title = "Edited".to_string();
        assert!(update_post(&mut con, &edited).await.unwrap());
        assert_eq!(
            get_post(&mut con, &older.id).await.unwrap().unwrap().title,
            "Edited"
        );

        assert!(delete_post(&mut con, &older.id).await.unwrap());
        assert!(!delete_post(&mut con, &older.id).await.unwrap());
        assert!(get_post(&mut con, &older.id).await.unwrap().is_none());

        // Updating a deleted post must not recreate it
        assert!(!update_post(&mut con, &edited).await.unwrap());
        assert!(get_post(&mut con, &older.id).await.unwrap().is_none());

        delete_post(&mut con, &newer.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_delete_keep_index_in_step() {
        let Some(mut con) = test_connection().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        // Same timestamp: ties come back in descending id order
        let mut first = test_post(9_000_000_000_100);
        first.id = format!("a{}", nanoid::nanoid!(11));
        let mut second = test_post(9_000_000_000_100);
        second.id = format!("b{}", &first.id[1..]);

        insert_post(&mut con, &first).await.unwrap();
        insert_post(&mut con, &second).await.unwrap();

        let score: Option<f64> = con.zscore(POSTS_INDEX_KEY, &first.id).await.unwrap();
        assert_eq!(score, Some(9_000_000_000_100.0));

        let listed = list_posts(&mut con).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|p| p.id.as_str()).collect();
        let first_pos = ids.iter().position(|id| *id == first.id).unwrap();
        let second_pos = ids.iter().position(|id| *id == second.id).unwrap();
        assert!(second_pos < first_pos);

        assert!(delete_post(&mut con, &first.id).await.unwrap());
        let score: Option<f64> = con.zscore(POSTS_INDEX_KEY, &first.id).await.unwrap();
        assert!(score.is_none());

        delete_post(&mut con, &second.id).await.unwrap();
    }
}
