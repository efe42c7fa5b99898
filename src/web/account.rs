use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{auth, db::user::Role, Error};

use super::{
    notice,
    views::{LoginPage, RegisterPage},
    Auth, Notice, SharedAppState,
};

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn index(session: Session) -> Redirect {
    match auth::context(&session).await {
        Some(_) => Redirect::to("/dashboard"),
        None => Redirect::to("/login"),
    }
}

pub async fn register_page(session: Session) -> RegisterPage {
    RegisterPage {
        notice: notice::take(&session).await,
        name: String::new(),
        email: String::new(),
    }
}

pub async fn register(
    State(state): State<SharedAppState>,
    session: Session,
    Form(RegisterForm {
        name,
        email,
        password,
    }): Form<RegisterForm>,
) -> Response {
    let profile = auth::Profile { name: name.clone() };
    match auth::register(&state.db_client, &email, &password, profile).await
    {
        Ok(_) => {
            notice::push(
                &session,
                Notice::success("Registration successful. Please log in."),
            )
            .await;
            Redirect::to("/login").into_response()
        }
        Err(e) => {
            if e.is_internal() {
                tracing::error!("registration failed: {e}");
            }
            RegisterPage {
                notice: Some(Notice::from(&e)),
                name,
                email,
            }
            .into_response()
        }
    }
}

pub async fn login_page(session: Session) -> LoginPage {
    LoginPage {
        notice: notice::take(&session).await,
        is_admin: false,
        email: String::new(),
    }
}

pub async fn login(
    State(state): State<SharedAppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    sign_in(&state, &session, form, Role::Customer).await
}

pub async fn admin_login_page(session: Session) -> LoginPage {
    LoginPage {
        notice: notice::take(&session).await,
        is_admin: true,
        email: String::new(),
    }
}

pub async fn admin_login(
    State(state): State<SharedAppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    sign_in(&state, &session, form, Role::Admin).await
}

async fn sign_in(
    state: &SharedAppState,
    session: &Session,
    LoginForm { email, password }: LoginForm,
    role: Role,
) -> Response {
    let is_admin = role == Role::Admin;

    let outcome =
        match auth::authenticate(&state.db_client, &email, &password, role)
            .await
        {
            Ok(ctx) => auth::login(session, ctx).await,
            Err(e) => Err(e),
        };

    match outcome {
        Ok(()) => {
            if let Err(e) = state.db_client.delete_expired_sessions().await {
                tracing::warn!("failed to delete expired sessions: {e}");
            }
            let message = if is_admin {
                "Admin login successful."
            } else {
                "Welcome back!"
            };
            notice::push(session, Notice::success(message)).await;
            Redirect::to("/dashboard").into_response()
        }
        Err(e) => {
            let notice = match e {
                Error::InvalidCredentials => {
                    tracing::warn!(%email, ?role, "login failed");
                    if is_admin {
                        Notice::error("Invalid admin credentials.")
                    } else {
                        Notice::from(&e)
                    }
                }
                e => {
                    if e.is_internal() {
                        tracing::error!("login failed: {e}");
                    }
                    Notice::from(&e)
                }
            };
            LoginPage {
                notice: Some(notice),
                is_admin,
                email,
            }
            .into_response()
        }
    }
}

pub async fn logout(session: Session, Auth(_): Auth) -> Redirect {
    if let Err(e) = auth::logout(&session).await {
        tracing::error!("logout failed: {e}");
    }
    notice::push(&session, Notice::success("You have been logged out.")).await;
    Redirect::to("/login")
}
