use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::api::redirect;
use crate::api::session::Flash;
use crate::views;

pub const UNAUTHORIZED_MESSAGE: &str = "Access unauthorized.";

#[derive(Debug, Error)]
pub enum AppError {
    /// No logged-in user, or the user may not touch the resource.
    #[error("access unauthorized")]
    Unauthorized,

    #[error("not found")]
    NotFound,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hash error: {0}")]
    PasswordHash(argon2::password_hash::Error),

    #[error("session token error: {0}")]
    SessionToken(#[from] jsonwebtoken::errors::Error),

    #[error("{0}")]
    Internal(String),
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => {
                tracing::debug!("rejecting unauthorized request");
                let mut response = redirect("/");
                // Picked up by the session layer and shown on the next page.
                response
                    .extensions_mut()
                    .insert(Flash::danger(UNAUTHORIZED_MESSAGE));
                response
            }
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Html(views::error_page("404", "The page you requested could not be found.")),
            )
                .into_response(),
            other => {
                tracing::error!(error = %other, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::error_page("500", "Something went wrong.")),
                )
                    .into_response()
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid BIND_ADDR: {0}")]
    InvalidBindAddr(String),

    #[error("SESSION_SECRET must be at least 16 bytes")]
    WeakSessionSecret,
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn test_unauthorized_redirects_home_with_flash() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/");

        let flash = response.extensions().get::<Flash>().cloned();
        assert_eq!(flash, Some(Flash::danger(UNAUTHORIZED_MESSAGE)));
    }

    #[test]
    fn test_not_found_is_404() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_database_errors_are_hidden() {
        let response = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.extensions().get::<Flash>().is_none());
    }
}
