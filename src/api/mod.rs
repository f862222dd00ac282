use crate::config::Settings;
use crate::core::sessions::SESSION_COOKIE;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Json, Router};
use serde::Serialize;
use std::str::FromStr;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use uuid::Uuid;

pub mod chat;
pub mod pages;
pub mod upload;

/// All routes of the web front end. The caller attaches the service provider.
pub fn router(settings: &Settings) -> Router {
    Router::new()
        .merge(pages::router())
        .merge(chat::router())
        .merge(upload::router(settings.max_upload_bytes))
        .nest_service(
            "/static",
            ServiceBuilder::new().service(ServeDir::new("static")),
        )
}

/// Session token taken from the `session_id` cookie.
///
/// Requests without a well-formed token are redirected to the login page. The token is not
/// checked against the session store here.
#[derive(Debug)]
pub struct ExtractSession(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractSession
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Redirect> {
        parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|header| header.to_str().ok())
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .and_then(|(_, token)| Uuid::from_str(token).ok())
            .map(ExtractSession)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// JSON error response: `{"error": "..."}` with the given status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> ApiError {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> ApiError {
        ApiError::new(StatusCode::BAD_REQUEST, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}
