pub mod auth;
pub mod home;
pub mod messages;
pub mod server;
pub mod session;
pub mod users;

#[cfg(test)]
pub mod test_support;

use axum::{
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};

/// `302 Found` to `location`.
pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}
