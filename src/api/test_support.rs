use axum::{
    Router,
    body::Body,
    http::{
        Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
};
use std::sync::Arc;
use tower::ServiceExt;

use crate::api::server::{AppState, build_router};
use crate::api::session::{CURR_USER_KEY, SESSION_COOKIE, Session};
use crate::config::Config;
use crate::db::models::{NewUser, User};
use crate::db::users::SignupOutcome;
use crate::db::{self, follows, likes, messages, users};

const MAX_REDIRECTS: usize = 10;

/// In-process client over a fresh in-memory app, with a one-cookie jar.
pub struct TestApp {
    pub state: Arc<AppState>,
    router: Router,
    cookie: Option<String>,
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = Config::for_tests();
        let pool = db::connect(&config.database_url).await.unwrap();
        let state = Arc::new(AppState::new(pool, &config.session_secret));
        let router = build_router(state.clone());

        Self {
            state,
            router,
            cookie: None,
        }
    }

    /// Empties every table.
    pub async fn reset(&self) {
        let pool = &self.state.db;
        follows::delete_all(pool).await.unwrap();
        likes::delete_all(pool).await.unwrap();
        users::delete_all(pool).await.unwrap();
        messages::delete_all(pool).await.unwrap();
    }

    pub async fn signup(&self, username: &str, email: &str, password: &str) -> User {
        let new_user = NewUser {
            username,
            email,
            password,
            image_url: None,
        };
        match users::signup(&self.state.db, &new_user).await.unwrap() {
            SignupOutcome::Created(user) => user,
            SignupOutcome::Taken => panic!("{username} is already taken"),
        }
    }

    /// Writes the user id straight into a new server-side session and
    /// points the cookie jar at it.
    pub async fn login_as(&mut self, user_id: i64) {
        let sessions = &self.state.sessions;
        let session = sessions.load(None).await;
        session.insert(CURR_USER_KEY, user_id).await.unwrap();

        let cookie = sessions.finish(session).await.unwrap().unwrap();
        let pair = cookie.to_str().unwrap().split(';').next().unwrap();
        self.cookie = Some(pair.to_string());
    }

    /// The `name=value` pair currently in the jar.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// Forget the session, like a client that never stores cookies.
    pub fn clear_cookies(&mut self) {
        self.cookie = None;
    }

    /// The stored session the cookie jar points at, if any.
    pub async fn session(&self) -> Option<Session> {
        let cookie = self.cookie.as_deref()?;
        let token = cookie.strip_prefix(&format!("{SESSION_COOKIE}="))?;
        let session = self.state.sessions.load(Some(token)).await;
        session.is_stored().then_some(session)
    }

    async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::get(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, body: &str) -> TestResponse {
        let request = Request::post(path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn follow_redirects(&mut self, mut response: TestResponse) -> TestResponse {
        for _ in 0..MAX_REDIRECTS {
            if !response.status.is_redirection() {
                return response;
            }
            let location = response.location.clone().expect("redirect without location");
            response = self.get(&location).await;
        }
        panic!("too many redirects");
    }

    pub async fn get_following(&mut self, path: &str) -> TestResponse {
        let response = self.get(path).await;
        self.follow_redirects(response).await
    }

    pub async fn post_form_following(&mut self, path: &str, body: &str) -> TestResponse {
        let response = self.post_form(path, body).await;
        self.follow_redirects(response).await
    }
}
