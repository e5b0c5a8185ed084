//! Persistence for users and posts.
//!
//! Handlers only see the [`UserStore`] and [`PostStore`] traits. Two
//! backends implement both: [`RedisStore`] (JSON documents in Redis) and
//! [`MemoryStore`] (process-local, used by tests).

pub mod memory;
pub mod post;
pub mod user;

use crate::models::{StoredPost, StoredUser};
use async_trait::async_trait;

pub use memory::MemoryStore;

/// Storage failures surfaced to handlers.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A unique index rejected the write.
    #[error("{0}")]
    Duplicate(String),

    #[error("{0}")]
    Backend(String),
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        StorageError::Backend(format!("Redis error: {}", err))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Backend(format!("JSON error: {}", err))
    }
}

/// Credential store. Emails are unique; records are never deleted.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with [`StorageError::Duplicate`] when the
    /// email is already taken.
    async fn insert_user(&self, user: &StoredUser) -> Result<(), StorageError>;

    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StorageError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StorageError>;

    /// Replace the password hash. Returns false if the user does not exist.
    async fn update_password(
        &self,
        id: &str,
        password_hash: &str,
        updated_at: u64,
    ) -> Result<bool, StorageError>;
}

/// Post store.
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: &StoredPost) -> Result<(), StorageError>;

    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>, StorageError>;

    /// All posts, newest first.
    async fn list_posts(&self) -> Result<Vec<StoredPost>, StorageError>;

    /// Overwrite an existing post (last write wins). Returns false if the
    /// post no longer exists.
    async fn update_post(&self, post: &StoredPost) -> Result<bool, StorageError>;

    /// Returns false if the post did not exist.
    async fn delete_post(&self, id: &str) -> Result<bool, StorageError>;
}

/// Redis-backed implementation of both stores.
///
/// Key layout:
/// - `user:{id}` - user JSON
/// - `email:{email}` - user id (unique index, written with `SET NX`)
/// - `post:{id}` - post JSON
/// - `posts` - ZSET of post ids scored by `created_at`
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn new(client: redis::Client) -> Self {
        RedisStore { client }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, StorageError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StorageError::Backend(format!("Redis connection error: {}", e)))
    }
}

#[async_trait]
impl UserStore for RedisStore {
    async fn insert_user(&self, user: &StoredUser) -> Result<(), StorageError> {
        let mut con = self.connection().await?;
        user::insert_user(&mut con, user).await
    }

    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StorageError> {
        let mut con = self.connection().await?;
        user::get_user(&mut con, id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StorageError> {
        let mut con = self.connection().await?;
        user::get_user_by_email(&mut con, email).await
    }

    async fn update_password(
        &self,
        id: &str,
        password_hash: &str,
        updated_at: u64,
    ) -> Result<bool, StorageError> {
        let mut con = self.connection().await?;
        user::update_password(&mut con, id, password_hash, updated_at).await
    }
}

#[async_trait]
impl PostStore for RedisStore {
    async fn insert_post(&self, post: &StoredPost) -> Result<(), StorageError> {
        let mut con = self.connection().await?;
        post::insert_post(&mut con, post).await
    }

    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>, StorageError> {
        let mut con = self.connection().await?;
        post::get_post(&mut con, id).await
    }

    async fn list_posts(&self) -> Result<Vec<StoredPost>, StorageError> {
        let mut con = self.connection().await?;
        post::list_posts(&mut con).await
    }

    async fn update_post(&self, post: &StoredPost) -> Result<bool, StorageError> {
        let mut con = self.connection().await?;
        post::update_post(&mut con, post).await
    }

    async fn delete_post(&self, id: &str) -> Result<bool, StorageError> {
        let mut con = self.connection().await?;
        post::delete_post(&mut con, id).await
    }
}
