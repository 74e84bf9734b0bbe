use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::auth::AuthContext;
use crate::api::redirect;
use crate::api::server::AppState;
use crate::db::messages::{self, MAX_MESSAGE_LEN};
use crate::error::AppError;
use crate::views::{self, FieldErrors};

#[derive(Debug, Default, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub text: String,
}

impl MessageForm {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.text.trim().is_empty() {
            errors.push(("text", "This field is required."));
        } else if self.text.chars().count() > MAX_MESSAGE_LEN {
            errors.push(("text", "Field cannot be longer than 140 characters."));
        }
        errors
    }
}

pub async fn new_form(auth: AuthContext) -> Result<Response, AppError> {
    auth.require()?;
    Ok(auth
        .page("New message", &views::messages::new_form("", &FieldErrors::new()))
        .await
        .into_response())
}

/// Invalid input re-renders the form without touching the database.
pub async fn create(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Form(form): Form<MessageForm>,
) -> Result<Response, AppError> {
    let user = auth.require()?;

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(auth
            .page("New message", &views::messages::new_form(&form.text, &errors))
            .await
            .into_response());
    }

    let message = messages::create(&state.db, user.id, &form.text).await?;
    tracing::info!(message_id = message.id, user_id = user.id, "message created");

    Ok(redirect(&format!("/users/{}", user.id)))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    let message = messages::find_with_author(&state.db, message_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let body = views::messages::show(&message, auth.user());
    Ok(auth.page("Message", &body).await.into_response())
}

/// Only the author may delete a message.
pub async fn destroy(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(message_id): Path<i64>,
) -> Result<Response, AppError> {
    let user = auth.require()?;

    let message = messages::find_by_id(&state.db, message_id)
        .await?
        .ok_or(AppError::NotFound)?;

    if message.user_id != user.id {
        tracing::debug!(message_id, user_id = user.id, "refusing to delete another user's message");
        return Err(AppError::Unauthorized);
    }

    messages::delete(&state.db, message.id).await?;
    tracing::info!(message_id, user_id = user.id, "message deleted");

    Ok(redirect(&format!("/users/{}", user.id)))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::api::test_support::TestApp;
    use crate::db::{messages, models::User};

    struct Fixture {
        app: TestApp,
        user: User,
        message_id: i64,
    }

    /// One user, `testuser`, with one message, `test_message`.
    async fn setup() -> Fixture {
        let app = TestApp::spawn().await;
        app.reset().await;

        let user = app.signup("testuser", "test@test.com", "testuser").await;
        let message = messages::create(&app.state.db, user.id, "test_message")
            .await
            .unwrap();

        Fixture {
            app,
            user,
            message_id: message.id,
        }
    }

    async fn message_count(app: &TestApp) -> i64 {
        messages::count(&app.state.db).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_message() {
        let Fixture { mut app, user, .. } = setup().await;
        app.login_as(user.id).await;

        let resp = app.post_form("/messages/new", "text=Hello").await;
        assert_eq!(resp.status, StatusCode::FOUND);
        assert_eq!(resp.location, Some(format!("/users/{}", user.id)));
        assert_eq!(message_count(&app).await, 2);

        let resp = app.get(&format!("/users/{}", user.id)).await;
        assert!(resp.body.contains("Hello"));
    }

    #[tokio::test]
    async fn test_add_message_requires_login() {
        let Fixture { mut app, .. } = setup().await;

        let resp = app.post_form("/messages/new", "text=Hello").await;
        assert_eq!(resp.status, StatusCode::FOUND);

        let resp = app.follow_redirects(resp).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.body.contains("Access unauthorized."));
        assert_eq!(message_count(&app).await, 1);
    }

    #[tokio::test]
    async fn test_unauthorized_flash_shows_once() {
        let Fixture { mut app, .. } = setup().await;

        let resp = app.post_form_following("/messages/new", "text=Hello").await;
        assert!(resp.body.contains("Access unauthorized."));

        let resp = app.get("/").await;
        assert!(!resp.body.contains("Access unauthorized."));
    }

    #[tokio::test]
    async fn test_anonymous_posts_do_not_grow_the_session_store() {
        let Fixture { mut app, .. } = setup().await;

        for _ in 0..50 {
            app.clear_cookies();
            let resp = app.post_form("/messages/new", "text=Hello").await;
            assert_eq!(resp.status, StatusCode::FOUND);
        }
        assert_eq!(app.state.sessions.len().await, 0);

        // The flash still reaches the client through its cookie.
        let resp = app.post_form_following("/messages/new", "text=Hello").await;
        assert!(resp.body.contains("Access unauthorized."));
        assert_eq!(app.state.sessions.len().await, 0);
        assert_eq!(message_count(&app).await, 1);
    }

    #[tokio::test]
    async fn test_add_empty_message_rerenders_form() {
        let Fixture { mut app, user, .. } = setup().await;
        app.login_as(user.id).await;

        let resp = app.post_form_following("/messages/new", "text=").await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.body.contains("Add my message!"));
        assert!(resp.body.contains("This field is required."));
        assert_eq!(message_count(&app).await, 1);
    }

    #[tokio::test]
    async fn test_add_message_without_text_field() {
        let Fixture { mut app, user, .. } = setup().await;
        app.login_as(user.id).await;

        let resp = app.post_form("/messages/new", "").await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.body.contains("Add my message!"));
        assert_eq!(message_count(&app).await, 1);
    }

    #[tokio::test]
    async fn test_add_overlong_message_is_rejected() {
        let Fixture { mut app, user, .. } = setup().await;
        app.login_as(user.id).await;

        let body = format!("text={}", "a".repeat(141));
        let resp = app.post_form("/messages/new", &body).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.body.contains("longer than 140"));
        assert_eq!(message_count(&app).await, 1);
    }

    #[tokio::test]
    async fn test_new_message_form() {
        let Fixture { mut app, user, .. } = setup().await;

        let resp = app.get_following("/messages/new").await;
        assert!(resp.body.contains("Access unauthorized."));

        app.login_as(user.id).await;
        let resp = app.get("/messages/new").await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.body.contains("Add my message!"));
    }

    #[tokio::test]
    async fn test_messages_show() {
        let Fixture {
            mut app,
            message_id,
            ..
        } = setup().await;

        let resp = app.get(&format!("/messages/{message_id}")).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.body.contains("test_message"));
        assert!(!resp.body.contains("/delete"));
    }

    #[tokio::test]
    async fn test_messages_show_missing_is_404() {
        let Fixture {
            mut app,
            message_id,
            ..
        } = setup().await;

        let resp = app.get(&format!("/messages/{}", message_id + 1000)).await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_messages_destroy() {
        let Fixture {
            mut app,
            user,
            message_id,
        } = setup().await;
        app.login_as(user.id).await;

        let resp = app
            .post_form_following(&format!("/messages/{message_id}/delete"), "")
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(!resp.body.contains("test_message"));
        assert_eq!(message_count(&app).await, 0);
    }

    #[tokio::test]
    async fn test_messages_destroy_requires_login() {
        let Fixture {
            mut app,
            message_id,
            ..
        } = setup().await;

        let resp = app
            .post_form_following(&format!("/messages/{message_id}/delete"), "")
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.body.contains("Access unauthorized."));
        assert_eq!(message_count(&app).await, 1);
    }

    #[tokio::test]
    async fn test_messages_destroy_by_other_user() {
        let Fixture {
            mut app,
            message_id,
            ..
        } = setup().await;
        let intruder = app.signup("intruder", "bad@test.com", "password").await;
        app.login_as(intruder.id).await;

        let resp = app
            .post_form_following(&format!("/messages/{message_id}/delete"), "")
            .await;
        assert_eq!(resp.status, StatusCode::OK);
        assert!(resp.body.contains("Access unauthorized."));
        assert_eq!(message_count(&app).await, 1);
    }

    #[tokio::test]
    async fn test_messages_destroy_missing_is_404() {
        let Fixture {
            mut app,
            user,
            message_id,
        } = setup().await;
        app.login_as(user.id).await;

        let resp = app
            .post_form(&format!("/messages/{}/delete", message_id + 1000), "")
            .await;
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(message_count(&app).await, 1);
    }
}
