use axum::{
    Form,
    extract::{FromRequestParts, State},
    http::request::Parts,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::redirect;
use crate::api::server::AppState;
use crate::api::session::{CURR_USER_KEY, Flash, Session};
use crate::db::models::{NewUser, User};
use crate::db::users::{self, SignupOutcome};
use crate::error::AppError;
use crate::views::{self, FieldErrors};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Who is making the request. Built fresh for every request from the
/// session's `CURR_USER_KEY`; a key naming a missing user is dropped and
/// the caller treated as anonymous.
pub struct AuthContext {
    pub session: Session,
    user: Option<User>,
}

impl FromRequestParts<Arc<AppState>> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;

        let user = match session.get::<i64>(CURR_USER_KEY).await {
            Some(id) => {
                let user = users::find_by_id(&state.db, id).await?;
                if user.is_none() {
                    tracing::debug!(user_id = id, "session names a missing user");
                    session.remove(CURR_USER_KEY).await;
                }
                user
            }
            None => None,
        };

        Ok(Self { session, user })
    }
}

impl AuthContext {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The logged-in user, or `Unauthorized` for anonymous callers.
    pub fn require(&self) -> Result<&User, AppError> {
        self.user.as_ref().ok_or(AppError::Unauthorized)
    }

    /// Also moves the session to a new id, so a token handed out before
    /// login never names an authenticated session.
    pub async fn login(&mut self, user: User) -> Result<(), AppError> {
        self.session.regenerate().await;
        self.session.insert(CURR_USER_KEY, user.id).await?;
        self.user = Some(user);
        Ok(())
    }

    pub async fn logout(&mut self) {
        self.session.remove(CURR_USER_KEY).await;
        self.user = None;
    }

    /// Renders a full page, consuming queued flash messages.
    pub async fn page(&self, title: &str, body: &str) -> Html<String> {
        let flashes = self.session.take_flashes().await;
        Html(views::layout(title, self.user(), &flashes, body))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub image_url: String,
}

impl SignupForm {
    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.username.trim().is_empty() {
            errors.push(("username", "This field is required."));
        }
        if !self.email.contains('@') {
            errors.push(("email", "Invalid email address."));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(("password", "Field must be at least 6 characters long."));
        }
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

async fn render_signup(auth: &AuthContext, form: &SignupForm, errors: &FieldErrors) -> Response {
    auth.page(
        "Sign up",
        &views::auth::signup_form(&form.username, &form.email, &form.image_url, errors),
    )
    .await
    .into_response()
}

/// Showing the signup form logs out whoever was logged in.
pub async fn signup_form(mut auth: AuthContext) -> Response {
    auth.logout().await;
    render_signup(&auth, &SignupForm::default(), &FieldErrors::new()).await
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    mut auth: AuthContext,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError> {
    auth.logout().await;

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(render_signup(&auth, &form, &errors).await);
    }

    let new_user = NewUser {
        username: form.username.trim(),
        email: form.email.trim(),
        password: &form.password,
        image_url: Some(form.image_url.trim()),
    };

    match users::signup(&state.db, &new_user).await? {
        SignupOutcome::Created(user) => {
            tracing::info!(user_id = user.id, username = %user.username, "user signed up");
            auth.login(user).await?;
            Ok(redirect("/"))
        }
        SignupOutcome::Taken => {
            auth.session.flash(Flash::danger("Username already taken")).await;
            Ok(render_signup(&auth, &form, &FieldErrors::new()).await)
        }
    }
}

pub async fn login_form(auth: AuthContext) -> Response {
    auth.page("Log in", &views::auth::login_form("", &FieldErrors::new()))
        .await
        .into_response()
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    mut auth: AuthContext,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let mut errors = FieldErrors::new();
    if form.username.trim().is_empty() {
        errors.push(("username", "This field is required."));
    }
    if form.password.is_empty() {
        errors.push(("password", "This field is required."));
    }

    if errors.is_empty() {
        if let Some(user) = users::authenticate(&state.db, form.username.trim(), &form.password).await? {
            tracing::info!(user_id = user.id, "user logged in");
            let greeting = format!("Hello, {}!", user.username);
            auth.login(user).await?;
            auth.session.flash(Flash::success(greeting)).await;
            return Ok(redirect("/"));
        }
        auth.session.flash(Flash::danger("Invalid credentials.")).await;
    }

    Ok(auth
        .page("Log in", &views::auth::login_form(&form.username, &errors))
        .await
        .into_response())
}

pub async fn logout(mut auth: AuthContext) -> Response {
    if let Some(user) = auth.user() {
        tracing::info!(user_id = user.id, "user logged out");
    }
    auth.logout().await;
    auth.session
        .flash(Flash::success("You have successfully logged out."))
        .await;
    redirect("/login")
}
