use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::{
    CreateCommentData, CreatePostData, Platform, Post, PostComment, UpdatePostData,
    DEFAULT_FEATURED_LIMIT,
};
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, MaybeUser};
use crate::routes::Page;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub featured: Option<String>,
    pub platform: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct CommentRequest {
    pub content: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/posts/{id}/likes", post(like).delete(unlike))
        .route(
            "/api/posts/{id}/comments",
            get(list_comments).post(create_comment),
        )
        .route("/api/comments/{id}", put(update_comment).delete(delete_comment))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Value>> {
    let page = Page::new(query.limit, query.offset);
    let search = query.search.filter(|s| !s.trim().is_empty());

    let posts = if let Some(search) = search {
        state.posts.search_posts(&search, page.limit, page.offset)?
    } else if query.featured.as_deref() == Some("true") {
        state
            .posts
            .get_featured_posts(query.limit.map_or(DEFAULT_FEATURED_LIMIT, |_| page.limit))?
    } else if let Some(platform) = query.platform {
        let platform = platform
            .parse::<Platform>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        state
            .posts
            .get_posts_by_platform(platform, page.limit, page.offset)?
    } else {
        state.posts.get_all_posts(page.limit, page.offset)?
    };
    let total_count = state.posts.get_post_count()?;

    Ok(Json(json!({
        "posts": posts,
        "totalCount": total_count,
        "limit": page.limit,
        "offset": page.offset,
    })))
}

async fn create_post(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Json(mut data): Json<CreatePostData>,
) -> AppResult<(StatusCode, Json<Post>)> {
    // Authorship comes from the session, never from the body.
    data.user_id = user.as_ref().map(CurrentUser::id);
    let post = state.posts.create_post(data)?;
    tracing::info!(post_id = post.id, user_id = ?post.user_id, "Created post");
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Post>> {
    let post = visible_post(&state, user.as_ref().map(CurrentUser::id), id)?;
    Ok(Json(post))
}

/// Load a post `viewer` may see. Private posts look missing to everyone but their author.
fn visible_post(state: &AppState, viewer: Option<i64>, id: i64) -> AppResult<Post> {
    let post = state.posts.get_post_by_id(id)?.ok_or(AppError::NotFound)?;
    if !post.is_public && (post.user_id.is_none() || post.user_id != viewer) {
        return Err(AppError::NotFound);
    }
    Ok(post)
}

/// Load a post and make sure `user` wrote it.
fn owned_post(state: &AppState, user: &CurrentUser, id: i64) -> AppResult<Post> {
    let post = state.posts.get_post_by_id(id)?.ok_or(AppError::NotFound)?;
    if post.user_id != Some(user.id()) {
        return Err(AppError::Forbidden);
    }
    Ok(post)
}

async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(data): Json<UpdatePostData>,
) -> AppResult<Json<Post>> {
    owned_post(&state, &user, id)?;
    let post = state.posts.update_post(id, data)?.ok_or(AppError::NotFound)?;
    Ok(Json(post))
}

async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    owned_post(&state, &user, id)?;
    if !state.posts.delete_post(id)? {
        return Err(AppError::NotFound);
    }
    tracing::info!(post_id = id, user_id = user.id(), "Deleted post");
    Ok(Json(json!({ "success": true })))
}

async fn like(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    visible_post(&state, Some(user.id()), id)?;
    state.posts.like_post(id, user.id())?;
    likes_response(&state, id, true)
}

async fn unlike(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    visible_post(&state, Some(user.id()), id)?;
    state.posts.unlike_post(id, user.id())?;
    likes_response(&state, id, false)
}

fn likes_response(state: &AppState, id: i64, liked: bool) -> AppResult<Json<Value>> {
    let post = state.posts.get_post_by_id(id)?.ok_or(AppError::NotFound)?;
    Ok(Json(json!({ "liked": liked, "likes_count": post.likes_count })))
}

async fn list_comments(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Value>> {
    visible_post(&state, user.as_ref().map(CurrentUser::id), id)?;
    let page = Page::new(query.limit, query.offset);
    let comments = state.posts.get_post_comments(id, page.limit, page.offset)?;
    Ok(Json(json!({
        "comments": comments,
        "limit": page.limit,
        "offset": page.offset,
    })))
}

async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> AppResult<(StatusCode, Json<PostComment>)> {
    visible_post(&state, Some(user.id()), id)?;
    let comment = state.posts.add_comment(CreateCommentData {
        post_id: id,
        user_id: user.id(),
        content: req.content,
    })?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Load a comment and make sure `user` wrote it.
fn owned_comment(state: &AppState, user: &CurrentUser, id: i64) -> AppResult<PostComment> {
    let comment = state.posts.get_comment_by_id(id)?.ok_or(AppError::NotFound)?;
    if comment.user_id != user.id() {
        return Err(AppError::Forbidden);
    }
    Ok(comment)
}

async fn update_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<CommentRequest>,
) -> AppResult<Json<PostComment>> {
    owned_comment(&state, &user, id)?;
    let comment = state
        .posts
        .update_comment(id, &req.content)?
        .ok_or(AppError::NotFound)?;
    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    owned_comment(&state, &user, id)?;
    if !state.posts.delete_comment(id)? {
        return Err(AppError::NotFound);
    }
    Ok(Json(json!({ "success": true })))
}
