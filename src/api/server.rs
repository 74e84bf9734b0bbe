use anyhow::Context;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::api::session::{self, SessionStore};
use crate::api::{auth, home, messages, users};
use crate::config::Config;
use crate::db;

pub struct AppState {
    pub db: SqlitePool,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(db: SqlitePool, session_secret: &[u8]) -> Self {
        Self {
            db,
            sessions: Arc::new(SessionStore::new(session_secret)),
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let session_layer =
        middleware::from_fn_with_state(state.sessions.clone(), session::session_layer);

    Router::new()
        .route("/", get(home::homepage))
        .route("/health", get(|| async { "OK" }))
        .route("/signup", get(auth::signup_form).post(auth::signup))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/users", get(users::index))
        .route("/users/{id}", get(users::show))
        .route("/users/{id}/following", get(users::following))
        .route("/users/{id}/followers", get(users::followers))
        .route("/users/{id}/likes", get(users::liked_messages))
        .route("/users/follow/{id}", post(users::follow))
        .route("/users/stop-following/{id}", post(users::stop_following))
        .route("/users/add_like/{id}", post(users::toggle_like))
        .route("/messages/new", get(messages::new_form).post(messages::create))
        .route("/messages/{id}", get(messages::show))
        .route("/messages/{id}/delete", post(messages::destroy))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(session_layer),
        )
        .with_state(state)
}

pub async fn start_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    if config.is_in_memory() {
        tracing::warn!("using an in-memory database, data is lost on shutdown");
    }

    let state = Arc::new(AppState::new(pool, &config.session_secret));
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    tracing::info!(addr = %config.bind_addr, "warbler listening");

    axum::serve(listener, app).await.context("server failed")?;

    Ok(())
}
