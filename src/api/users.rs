use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use crate::api::auth::AuthContext;
use crate::api::redirect;
use crate::api::server::AppState;
use crate::db::models::User;
use crate::db::{follows, likes, messages, users};
use crate::error::AppError;
use crate::views;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

async fn find_user(state: &AppState, user_id: i64) -> Result<User, AppError> {
    users::find_by_id(&state.db, user_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Ids the viewer follows, empty for visitors.
async fn viewer_follows(state: &AppState, auth: &AuthContext) -> Result<HashSet<i64>, AppError> {
    match auth.user() {
        Some(viewer) => Ok(follows::following_ids(&state.db, viewer.id).await?),
        None => Ok(HashSet::new()),
    }
}

async fn viewer_likes(state: &AppState, auth: &AuthContext) -> Result<HashSet<i64>, AppError> {
    match auth.user() {
        Some(viewer) => Ok(likes::liked_ids(&state.db, viewer.id).await?),
        None => Ok(HashSet::new()),
    }
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Query(params): Query<SearchParams>,
) -> Result<Response, AppError> {
    let found = users::list(&state.db, params.q.as_deref()).await?;
    let follows = viewer_follows(&state, &auth).await?;

    let body = views::users::index(&found, auth.user(), &follows);
    Ok(auth.page("Users", &body).await.into_response())
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = find_user(&state, user_id).await?;
    let stats = users::stats(&state.db, user.id).await?;
    let user_messages = messages::for_user(&state.db, user.id).await?;
    let follows = viewer_follows(&state, &auth).await?;
    let liked = viewer_likes(&state, &auth).await?;

    let body = views::users::profile(&user, stats, &user_messages, auth.user(), &follows, &liked);
    Ok(auth.page(&user.username, &body).await.into_response())
}

/// Any logged-in user may see anyone's following list.
pub async fn following(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    auth.require()?;

    let user = find_user(&state, user_id).await?;
    let stats = users::stats(&state.db, user.id).await?;
    let listed = follows::following(&state.db, user.id).await?;
    let follows = viewer_follows(&state, &auth).await?;

    let body = views::users::relations(&user, stats, &listed, auth.user(), &follows);
    Ok(auth.page("Following", &body).await.into_response())
}

pub async fn followers(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    auth.require()?;

    let user = find_user(&state, user_id).await?;
    let stats = users::stats(&state.db, user.id).await?;
    let listed = follows::followers(&state.db, user.id).await?;
    let follows = viewer_follows(&state, &auth).await?;

    let body = views::users::relations(&user, stats, &listed, auth.user(), &follows);
    Ok(auth.page("Followers", &body).await.into_response())
}

pub async fn liked_messages(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(user_id): Path<i64>,
) -> Result<Response, AppError> {
    auth.require()?;

    let user = find_user(&state, user_id).await?;
    let stats = users::stats(&state.db, user.id).await?;
    let liked_by_user = messages::liked_by(&state.db, user.id).await?;
    let follows = viewer_follows(&state, &auth).await?;
    let liked = viewer_likes(&state, &auth).await?;

    let body = views::users::profile(&user, stats, &liked_by_user, auth.user(), &follows, &liked);
    Ok(auth.page("Likes", &body).await.into_response())
}

pub async fn follow(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(followed_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = auth.require()?;
    let followed = find_user(&state, followed_id).await?;

    if followed.id == user.id {
        return Err(AppError::Unauthorized);
    }

    follows::follow(&state.db, user.id, followed.id).await?;
    tracing::info!(follower_id = user.id, followed_id, "user followed");

    Ok(redirect(&format!("/users/{}/following", user.id)))
}

pub async fn stop_following(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(followed_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = auth.require()?;
    let followed = find_user(&state, followed_id).await?;

    if follows::unfollow(&state.db, user.id, followed.id).await? {
        tracing::info!(follower_id = user.id, followed_id, "user unfollowed");
    }

    Ok(redirect(&format!("/users/{}/following", user.id)))
}

/// Likes or unlikes a message. Users cannot like their own messages.
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = auth.require()?;
    let message = messages::find_by_id(&state.db, message_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if message.user_id == user.id {
        return Err(AppError::Unauthorized);
    }

    let liked = likes::toggle(&state.db, user.id, message.id).await?;
    tracing::info!(user_id = user.id, message_id, liked, "like toggled");

    Ok(redirect("/"))
}
