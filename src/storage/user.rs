//! User Redis operations.
//!
//! Redis key patterns:
//! - `user:{nanoid}` - individual user data (JSON)
//! - `email:{email}` - email lookup to user_id (STRING), the unique index
//!
//! User JSON carries the password hash, so it is wrapped in `Zeroizing`
//! while it sits in application memory.

use super::StorageError;
use crate::models::StoredUser;
use redis::AsyncCommands;
use zeroize::Zeroizing;

fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

fn email_key(email: &str) -> String {
    format!("email:{}", email)
}

/// Store a new user.
///
/// The email index is claimed first with `SET NX`, so two concurrent
/// registrations for one email cannot both succeed.
pub async fn insert_user<C>(con: &mut C, user: &StoredUser) -> Result<(), StorageError>
where
    C: AsyncCommands,
{
    let email_key = email_key(&user.email);

    let claimed: bool = con.set_nx(&email_key, &user.id).await?;
    if !claimed {
        return Err(StorageError::Duplicate(
            "Email already registered".to_string(),
        ));
    }

    let json = Zeroizing::new(serde_json::to_string(user)?);

    if let Err(e) = con.set::<_, _, ()>(user_key(&user.id), json.as_str()).await {
        // Release the index so the email is not locked out forever
        let _: Result<(), _> = con.del(&email_key).await;
        return Err(e.into());
    }

    Ok(())
}

/// Get a user by ID.
pub async fn get_user<C>(con: &mut C, id: &str) -> Result<Option<StoredUser>, StorageError>
where
    C: AsyncCommands,
{
    let json: Option<String> = con.get(user_key(id)).await?;

    match json {
        Some(data) => {
            let zeroizing_data = Zeroizing::new(data);
            let user = serde_json::from_str(&zeroizing_data)?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

/// Get a user by (normalised) email.
///
/// Performs a two-step lookup: email -> user_id -> user data.
pub async fn get_user_by_email<C>(
    con: &mut C,
    email: &str,
) -> Result<Option<StoredUser>, StorageError>
where
    C: AsyncCommands,
{
    let user_id: Option<String> = con.get(email_key(email)).await?;

    match user_id {
        Some(id) => get_user(con, &id).await,
        None => Ok(None),
    }
}

/// Replace a user's password hash.
pub async fn update_password<C>(
    con: &mut C,
    id: &str,
    password_hash: &str,
    updated_at: u64,
) -> Result<bool, StorageError>
where
    C: AsyncCommands,
{
    let Some(mut user) = get_user(con, id).await? else {
        return Ok(false);
    };

    user.password_hash = password_hash.to_string();
    user.updated_at = updated_at;

    let json = Zeroizing::new(serde_json::to_string(&user)?);
    con.set::<_, _, ()>(user_key(id), json.as_str()).await?;

    Ok(true)
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

    fn test_user(email: &str) -> StoredUser {
        StoredUser {
            id: nanoid::nanoid!(12),
            email: email.to_string(),
            name: None,
            password_hash: "$argon2id$placeholder".to_string(),
            created_at: 1,
            updated_at: 1,
        }
    }

    #[tokio::test]
    async fn test_email_index_is_unique() {
        let Some(mut con) = test_connection().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let email = format!("{}@test.invalid", nanoid::nanoid!(8).to_lowercase());
        let first = test_user(&email);
        let second = test_user(&email);

        insert_user(&mut con, &first).await.unwrap();
        let result = insert_user(&mut con, &second).await;
        assert!(matches!(result, Err(StorageError::Duplicate(_))));

        let found = get_user_by_email(&mut con, &email).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);

        assert!(update_password(&mut con, &first.id, "$argon2id$new", 2)
            .await
            .unwrap());
        let updated = get_user(&mut con, &first.id).await.unwrap().unwrap();
        assert_eq!(updated.password_hash, "$argon2id$new");
        assert_eq!(updated.updated_at, 2);

        // Clean up
        let _: Result<(), _> = con.del(user_key(&first.id)).await;
        let _: Result<(), _> = con.del(email_key(&email)).await;
    }
}
