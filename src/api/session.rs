use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;

/// Session key holding the logged-in user's id.
pub const CURR_USER_KEY: &str = "curr_user";
pub const SESSION_COOKIE: &str = "warbler_session";

const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

impl Flash {
    pub fn new(category: &str, message: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new("success", message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new("danger", message)
    }
}

#[derive(Debug, Default)]
struct SessionData {
    values: HashMap<String, serde_json::Value>,
    flashes: Vec<Flash>,
    regenerate: bool,
}

/// Handle to one client's session, shared by the layer and the handler.
///
/// Sessions holding values live in the [`SessionStore`]. Sessions that only
/// carry flash messages are never stored: their flashes ride in the signed
/// cookie until the next page drains them.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    stored: bool,
    flashes_in_cookie: bool,
    data: Arc<Mutex<SessionData>>,
}

impl Session {
    fn fresh() -> Self {
        Self::from_data(Uuid::new_v4(), SessionData::default())
    }

    fn from_data(id: Uuid, data: SessionData) -> Self {
        Self {
            id,
            stored: false,
            flashes_in_cookie: false,
            data: Arc::new(Mutex::new(data)),
        }
    }

    #[cfg(test)]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// True when the session was found in the store.
    #[cfg(test)]
    pub fn is_stored(&self) -> bool {
        self.stored
    }

    /// Missing keys and values of another type both read as `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.data.lock().await;
        data.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub async fn insert<T: Serialize>(&self, key: &str, value: T) -> Result<(), AppError> {
        let value = serde_json::to_value(value)
            .map_err(|e| AppError::Internal(format!("session value: {e}")))?;
        self.data.lock().await.values.insert(key.to_string(), value);
        Ok(())
    }

    pub async fn remove(&self, key: &str) {
        self.data.lock().await.values.remove(key);
    }

    /// Asks the layer to move this session to a new id once the request ends.
    pub async fn regenerate(&self) {
        self.data.lock().await.regenerate = true;
    }

    pub async fn flash(&self, flash: Flash) {
        self.data.lock().await.flashes.push(flash);
    }

    /// Drains the queue: each flash is shown once.
    pub async fn take_flashes(&self) -> Vec<Flash> {
        std::mem::take(&mut self.data.lock().await.flashes)
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        let data = self.data.lock().await;
        data.values.is_empty() && data.flashes.is_empty()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sid: Uuid,
    exp: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    flashes: Vec<Flash>,
}

struct StoredSession {
    data: Arc<Mutex<SessionData>>,
    expires_at: i64,
}

/// Server-side sessions, addressed by a signed cookie.
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, StoredSession>>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionStore {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Resolves a cookie token to its session, or hands out a fresh one.
    pub async fn load(&self, token: Option<&str>) -> Session {
        self.load_at(token, chrono::Utc::now().timestamp()).await
    }

    async fn load_at(&self, token: Option<&str>, now: i64) -> Session {
        let Some(claims) = token.and_then(|t| self.verify(t)) else {
            return Session::fresh();
        };

        let mut sessions = self.sessions.lock().await;
        match sessions.get(&claims.sid) {
            Some(entry) if entry.expires_at > now => Session {
                id: claims.sid,
                stored: true,
                flashes_in_cookie: false,
                data: entry.data.clone(),
            },
            Some(_) => {
                sessions.remove(&claims.sid);
                Session::fresh()
            }
            None => {
                let flashes_in_cookie = !claims.flashes.is_empty();
                let mut session = Session::from_data(
                    claims.sid,
                    SessionData {
                        flashes: claims.flashes,
                        ..SessionData::default()
                    },
                );
                session.flashes_in_cookie = flashes_in_cookie;
                session
            }
        }
    }

    /// Stores or drops the session according to what the request left in
    /// it, and returns the cookie to send back, if it changed.
    pub async fn finish(&self, session: Session) -> Result<Option<HeaderValue>, AppError> {
        self.finish_at(session, chrono::Utc::now().timestamp()).await
    }

    async fn finish_at(&self, session: Session, now: i64) -> Result<Option<HeaderValue>, AppError> {
        let session = self.apply_regenerate(session).await;
        let (has_values, flashes) = {
            let data = session.data.lock().await;
            (!data.values.is_empty(), data.flashes.clone())
        };

        if has_values {
            self.persist_at(&session, now).await;
            return if session.stored {
                Ok(None)
            } else {
                self.cookie(&session, Vec::new()).map(Some)
            };
        }

        if session.stored {
            self.sessions.lock().await.remove(&session.id);
            return self.cookie(&session, flashes).map(Some);
        }

        if flashes.is_empty() && !session.flashes_in_cookie {
            return Ok(None);
        }
        self.cookie(&session, flashes).map(Some)
    }

    /// Moves the data to a new id and forgets the old entry.
    async fn apply_regenerate(&self, session: Session) -> Session {
        let data = {
            let mut data = session.data.lock().await;
            if !data.regenerate {
                None
            } else {
                Some(SessionData {
                    values: std::mem::take(&mut data.values),
                    flashes: std::mem::take(&mut data.flashes),
                    regenerate: false,
                })
            }
        };

        match data {
            None => session,
            Some(data) => {
                self.sessions.lock().await.remove(&session.id);
                Session::from_data(Uuid::new_v4(), data)
            }
        }
    }

    /// Inserts or refreshes the entry, evicting expired ones.
    async fn persist_at(&self, session: &Session, now: i64) {
        let mut sessions = self.sessions.lock().await;
        if !sessions.contains_key(&session.id) {
            sessions.retain(|_, entry| entry.expires_at > now);
        }
        sessions.insert(
            session.id,
            StoredSession {
                data: session.data.clone(),
                expires_at: now + SESSION_TTL_SECS,
            },
        );
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn token(&self, session: &Session, flashes: Vec<Flash>) -> Result<String, AppError> {
        let claims = Claims {
            sid: session.id,
            exp: chrono::Utc::now().timestamp() + SESSION_TTL_SECS,
            flashes,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    fn verify(&self, token: &str) -> Option<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        match jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(err) => {
                tracing::debug!(error = %err, "ignoring invalid session cookie");
                None
            }
        }
    }

    fn cookie(&self, session: &Session, flashes: Vec<Flash>) -> Result<HeaderValue, AppError> {
        let token = self.token(session, flashes)?;
        HeaderValue::from_str(&format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax"
        ))
        .map_err(|e| AppError::Internal(format!("session cookie: {e}")))
    }
}

pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Attaches the client's session to the request, then stores, drops or
/// re-issues it depending on what the handler left behind.
pub async fn session_layer(
    State(store): State<Arc<SessionStore>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = cookie_value(request.headers(), SESSION_COOKIE);
    let session = store.load(token.as_deref()).await;
    request.extensions_mut().insert(session.clone());

    let mut response = next.run(request).await;

    if let Some(flash) = response.extensions_mut().remove::<Flash>() {
        session.flash(flash).await;
    }

    match store.finish(session).await {
        Ok(Some(cookie)) => {
            response.headers_mut().append(SET_COOKIE, cookie);
        }
        Ok(None) => {}
        Err(err) => tracing::error!(error = %err, "failed to issue session cookie"),
    }

    response
}
