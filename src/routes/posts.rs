//! Post endpoints. Reads are public; writes need a token, and updates and
//! deletes also need ownership.

use crate::auth::middleware::{AppState, AuthSession};
use crate::auth::ownership::ensure_owner;
use crate::error::AppError;
use crate::models::{
    non_blank, unix_millis, CreatePostRequest, MessageResponse, PostResponse, PublicUser,
    StoredPost, UpdatePostRequest,
};
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, JsonRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;

async fn resolve_author(state: &AppState, author_id: &str) -> Result<Option<PublicUser>, AppError> {
    Ok(state
        .users
        .get_user(author_id)
        .await?
        .as_ref()
        .map(PublicUser::from))
}

async fn find_post(state: &AppState, id: &str) -> Result<StoredPost, AppError> {
    state
        .posts
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

/// POST /api/posts - Create a post owned by the caller
pub async fn create_post(
    session: AuthSession,
    State(state): State<AppState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;

    let title = non_blank(req.title)
        .ok_or_else(|| AppError::InvalidInput("Title is required".to_string()))?;
    let content = non_blank(req.content)
        .ok_or_else(|| AppError::InvalidInput("Content is required".to_string()))?;

    // The token may outlive its user record (e.g. a wiped store)
    let author = state
        .users
        .get_user(&session.user_id)
        .await?
        .ok_or(AppError::InvalidToken)?;

    let now = unix_millis();
    let post = StoredPost {
        id: nanoid::nanoid!(12),
        title,
        content,
        author_id: author.id.clone(),
        created_at: now,
        updated_at: now,
    };

    state.posts.insert_post(&post).await?;

    tracing::info!(action = "post_created", post_id = %post.id, user_id = %author.id, "Post created");

    Ok((
        StatusCode::CREATED,
        Json(PostResponse::new(post, Some(PublicUser::from(&author)))),
    ))
}

/// GET /api/posts - All posts, newest first, authors populated
pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let posts = state.posts.list_posts().await?;

    let mut authors: HashMap<String, Option<PublicUser>> = HashMap::new();
    let mut response = Vec::with_capacity(posts.len());

    for post in posts {
        let author = match authors.get(&post.author_id) {
            Some(cached) => cached.clone(),
            None => {
                let resolved = resolve_author(&state, &post.author_id).await?;
                authors.insert(post.author_id.clone(), resolved.clone());
                resolved
            }
        };
        response.push(PostResponse::new(post, author));
    }

    Ok(Json(response))
}

/// GET /api/posts/{id} - A single post
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let post = find_post(&state, &id).await?;
    let author = resolve_author(&state, &post.author_id).await?;

    Ok(Json(PostResponse::new(post, author)))
}

/// Decode an edit request. An empty body is an edit that changes nothing.
fn parse_update(body: &[u8]) -> Result<UpdatePostRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(UpdatePostRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid JSON body: {}", e)))
}

/// PUT /api/posts/{id} - Edit a post (author only)
///
/// Existence and ownership are checked before the body is looked at.
/// Absent or blank fields keep their current value. Concurrent edits are
/// last-write-wins.
pub async fn update_post(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut post = find_post(&state, &id).await?;
    ensure_owner(&post.author_id, &session)?;

    let body = body.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let req = parse_update(&body)?;

    if let Some(title) = non_blank(req.title) {
        post.title = title;
    }
    if let Some(content) = non_blank(req.content) {
        post.content = content;
    }
    post.updated_at = unix_millis();

    if !state.posts.update_post(&post).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    tracing::info!(action = "post_updated", post_id = %post.id, user_id = %session.user_id, "Post updated");

    let author = resolve_author(&state, &post.author_id).await?;
    Ok(Json(PostResponse::new(post, author)))
}

/// DELETE /api/posts/{id} - Delete a post (author only)
pub async fn delete_post(
    session: AuthSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let post = find_post(&state, &id).await?;
    ensure_owner(&post.author_id, &session)?;

    if !state.posts.delete_post(&post.id).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    tracing::info!(action = "post_deleted", post_id = %post.id, user_id = %session.user_id, "Post deleted");

    Ok(Json(MessageResponse::new("Post deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_empty_body_changes_nothing() {
        for body in [&b""[..], b"  \n"] {
            let req = parse_update(body).unwrap();
            assert!(req.title.is_none());
            assert!(req.content.is_none());
        }
    }

    #[test]
    fn test_parse_update_fields() {
        let req = parse_update(br#"{"title":"New"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("New"));
        assert!(req.content.is_none());
    }

    #[test]
    fn test_parse_update_malformed_is_invalid_input() {
        assert!(matches!(
            parse_update(b"{not json"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_update(br#"{"title": 5}"#),
            Err(AppError::InvalidInput(_))
        ));
    }
}
