//! HTTP surface: routes, session handling and page rendering.

mod account;
mod dashboard;
pub mod notice;
pub mod views;

use std::{error::Error as StdError, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::{request, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use derive_more::Display;
use tower_http::trace::TraceLayer;
use tower_sessions::{
    cookie::{Key, SameSite},
    Expiry, Session, SessionManagerLayer,
};

use crate::{
    auth::{self, Context},
    config, db, Error,
};

pub use self::notice::Notice;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "portal_session";

/// Shortest accepted secret for signing the session cookie.
pub const MIN_SECRET_LEN: usize = 64;

pub type SharedAppState = Arc<AppState>;

pub struct AppState {
    pub db_client: db::Client,
}

#[derive(Clone, Copy, Debug, Display)]
#[display("session secret must be at least {MIN_SECRET_LEN} bytes long")]
pub struct InvalidSecret;

impl StdError for InvalidSecret {}

/// Builds the application with sessions kept in the database.
pub fn router(
    db_client: db::Client,
    config: &config::Session,
) -> Result<Router, InvalidSecret> {
    let key = match &config.secret {
        Some(secret) if secret.len() >= MIN_SECRET_LEN => {
            Key::from(secret.as_bytes())
        }
        Some(_) => return Err(InvalidSecret),
        None => Key::generate(),
    };
    let expiry = time::Duration::try_from(config.expiration_time)
        .unwrap_or(time::Duration::MAX);

    let sessions = SessionManagerLayer::new(db_client.session_store())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(expiry))
        .with_secure(config.secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key);

    Ok(Router::new()
        .route("/", get(account::index))
        .route(
            "/register",
            get(account::register_page).post(account::register),
        )
        .route("/login", get(account::login_page).post(account::login))
        .route(
            "/admin/login",
            get(account::admin_login_page).post(account::admin_login),
        )
        .route("/logout", get(account::logout))
        .route("/dashboard", get(dashboard::dashboard))
        .route("/requests", post(dashboard::create_request))
        .route("/profile", post(dashboard::update_profile))
        .route("/requests/{id}/status", post(dashboard::update_status))
        .route("/requests/{id}/delete", post(dashboard::delete_request))
        .route("/customers/{id}/delete", post(dashboard::delete_customer))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(AppState { db_client })))
}

/// Context of a logged-in session.
///
/// Anonymous requests are redirected to the login page. The notice asking to
/// log in is kept only for visitors who already have a session.
pub struct Auth(pub Context);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Err(Redirect::to("/login"));
        };
        match auth::context(&session).await {
            Some(ctx) => Ok(Self(ctx)),
            None => {
                if session.id().is_some() {
                    notice::push(
                        &session,
                        Notice::error("Please log in to access this page."),
                    )
                    .await;
                }
                Err(Redirect::to("/login"))
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!("request failed: {self}");
        }
        let status = match self {
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Db(_) | Self::PasswordHash(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.message()).into_response()
    }
}

/// Leaves the outcome of a form submission for the next page and redirects
/// to `back`, or to `/` when the session lacks permission.
async fn conclude(
    session: &Session,
    outcome: Result<&'static str, Error>,
    back: &str,
) -> Redirect {
    let (notice, to) = match outcome {
        Ok(message) => (Notice::success(message), back),
        Err(e) => {
            if e.is_internal() {
                tracing::error!("request failed: {e}");
            }
            let to = if matches!(e, Error::Unauthorized) { "/" } else { back };
            (Notice::from(&e), to)
        }
    };
    notice::push(session, notice).await;
    Redirect::to(to)
}
