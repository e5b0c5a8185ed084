//! In-process store backing the test suites.

use super::{PostStore, StorageError, UserStore};
use crate::models::{StoredPost, StoredUser};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    users: HashMap<String, StoredUser>,
    // email -> user id
    emails: HashMap<String, String>,
    posts: HashMap<String, StoredPost>,
}

/// Cheaply cloneable handle; clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &StoredUser) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        if inner.emails.contains_key(&user.email) {
            return Err(StorageError::Duplicate(
                "Email already registered".to_string(),
            ));
        }
        inner.emails.insert(user.email.clone(), user.id.clone());
        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<StoredUser>, StorageError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<StoredUser>, StorageError> {
        let inner = self.inner.read().await;
        Ok(inner
            .emails
            .get(email)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn update_password(
        &self,
        id: &str,
        password_hash: &str,
        updated_at: u64,
    ) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        match inner.users.get_mut(id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: &StoredPost) -> Result<(), StorageError> {
        self.inner
            .write()
            .await
            .posts
            .insert(post.id.clone(), post.clone());
        Ok(())
    }

    async fn get_post(&self, id: &str) -> Result<Option<StoredPost>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .posts
            .get(id)
            .cloned())
    }

    async fn list_posts(&self) -> Result<Vec<StoredPost>, StorageError> {
        let inner = self.inner.read().await;
        let mut posts: Vec<StoredPost> = inner.posts.values().cloned().collect();
        // Newest first, ties in descending id order like the Redis ZSET
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(posts)
    }

    async fn update_post(&self, post: &StoredPost) -> Result<bool, StorageError> {
        let mut inner = self.inner.write().await;
        match inner.posts.get_mut(&post.id) {
            Some(existing) => {
                *existing = post.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_post(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.inner.write().await.posts.remove(id).is_some())
    }
}
