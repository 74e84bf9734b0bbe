use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::auth::AuthContext;
use crate::api::server::AppState;
use crate::db::{likes, messages, users};
use crate::error::AppError;
use crate::views;

/// Landing page for visitors, timeline for logged-in users.
pub async fn homepage(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
) -> Result<Response, AppError> {
    let Some(user) = auth.user() else {
        return Ok(auth
            .page("Home", &views::users::anon_home())
            .await
            .into_response());
    };

    let timeline = messages::timeline(&state.db, user.id).await?;
    let liked = likes::liked_ids(&state.db, user.id).await?;
    let stats = users::stats(&state.db, user.id).await?;

    let body = views::users::home(user, stats, &timeline, &liked);
    Ok(auth.page("Home", &body).await.into_response())
}
