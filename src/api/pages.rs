//! Login, logout and the chat home page

use crate::api::ExtractSession;
use crate::config::Settings;
use crate::core::sessions::{expired_session_cookie, session_cookie};
use crate::core::traits::SessionStore;
use crate::infrastructure::templates::PageTemplates;
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use di_axum::Inject;
use log::{error, info, warn};
use serde::Deserialize;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

#[derive(Deserialize, Debug)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

async fn index(
    Inject(sessions): Inject<dyn SessionStore>,
    Inject(templates): Inject<PageTemplates>,
    ExtractSession(token): ExtractSession,
) -> Response {
    match sessions.get(token) {
        Some(session) => render(StatusCode::OK, templates.index(&session.username)),
        None => Redirect::to("/login").into_response(),
    }
}

async fn login_form(Inject(templates): Inject<PageTemplates>) -> Response {
    render(StatusCode::OK, templates.login(None))
}

async fn login(
    Inject(settings): Inject<Settings>,
    Inject(sessions): Inject<dyn SessionStore>,
    Inject(templates): Inject<PageTemplates>,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim();
    let password = form.password.trim();

    if username == settings.username && password == settings.password {
        let token = sessions.create(username.to_owned());
        info!("user {username} logged in");

        return ([(SET_COOKIE, session_cookie(token))], Redirect::to("/")).into_response();
    }

    warn!("failed login attempt for user {username:?}");
    render(StatusCode::UNAUTHORIZED, templates.login(Some(INVALID_CREDENTIALS)))
}

async fn logout(
    Inject(sessions): Inject<dyn SessionStore>,
    session: Option<ExtractSession>,
) -> impl IntoResponse {
    if let Some(ExtractSession(token)) = session {
        sessions.remove(token);
    }

    (
        [(SET_COOKIE, expired_session_cookie())],
        Redirect::to("/login"),
    )
}

fn render(status: StatusCode, page: Result<String, minijinja::Error>) -> Response {
    match page {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            error!("failed to render page: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
