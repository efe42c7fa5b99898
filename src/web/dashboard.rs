use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::{
    api, auth,
    db::user::Role,
    service::{self, ProfileUpdate},
    Error,
};

use super::{
    conclude, notice,
    views::{AdminDashboard, CustomerDashboard},
    Auth, Notice, SharedAppState,
};

#[derive(Deserialize)]
pub struct NewRequestForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct StatusForm {
    #[serde(default)]
    status: String,
}

pub async fn dashboard(
    State(state): State<SharedAppState>,
    session: Session,
    Auth(ctx): Auth,
) -> Result<Response, Error> {
    let db = &state.db_client;

    let Some(me) = auth::current_user(db, &ctx).await? else {
        auth::logout(&session).await?;
        notice::push(&session, Notice::error("Your account no longer exists."))
            .await;
        return Ok(Redirect::to("/login").into_response());
    };
    let notice = notice::take(&session).await;

    Ok(match ctx.role {
        Role::Customer => {
            let requests = service::list_requests(db, &ctx).await?;
            CustomerDashboard {
                notice,
                customer: me,
                requests,
            }
            .into_response()
        }
        Role::Admin => {
            let (customers, requests) = tokio::try_join!(
                service::list_customers(db, &ctx),
                service::list_requests(db, &ctx),
            )?;
            AdminDashboard {
                notice,
                admin: me,
                customers,
                requests,
            }
            .into_response()
        }
    })
}

pub async fn create_request(
    State(state): State<SharedAppState>,
    session: Session,
    Auth(ctx): Auth,
    Form(NewRequestForm { title, description }): Form<NewRequestForm>,
) -> Redirect {
    let outcome =
        service::create_request(&state.db_client, &ctx, &title, &description)
            .await
            .map(|_| "Service request submitted.");
    conclude(&session, outcome, "/dashboard").await
}

pub async fn update_profile(
    State(state): State<SharedAppState>,
    session: Session,
    Auth(ctx): Auth,
    Form(ProfileForm {
        name,
        email,
        password,
    }): Form<ProfileForm>,
) -> Redirect {
    let update = ProfileUpdate {
        name,
        email,
        password,
    };
    let outcome = service::update_profile(&state.db_client, &ctx, update)
        .await
        .map(|()| "Profile updated successfully.");
    conclude(&session, outcome, "/dashboard").await
}

pub async fn update_status(
    State(state): State<SharedAppState>,
    session: Session,
    Auth(ctx): Auth,
    Path(id): Path<String>,
    Form(StatusForm { status }): Form<StatusForm>,
) -> Redirect {
    let outcome = match id.parse::<api::request::Id>() {
        Ok(id) => service::update_status(&state.db_client, &ctx, id, &status)
            .await
            .map(|()| "Request status updated."),
        Err(_) => Err(Error::NotFound),
    };
    conclude(&session, outcome, "/dashboard").await
}

pub async fn delete_request(
    State(state): State<SharedAppState>,
    session: Session,
    Auth(ctx): Auth,
    Path(id): Path<String>,
) -> Redirect {
    let outcome = match id.parse::<api::request::Id>() {
        Ok(id) => service::delete_request(&state.db_client, &ctx, id)
            .await
            .map(|()| "Request deleted."),
        Err(_) => Err(Error::NotFound),
    };
    conclude(&session, outcome, "/dashboard").await
}

pub async fn delete_customer(
    State(state): State<SharedAppState>,
    session: Session,
    Auth(ctx): Auth,
    Path(id): Path<String>,
) -> Redirect {
    let outcome = match id.parse::<api::user::Id>() {
        Ok(id) => service::delete_customer(&state.db_client, &ctx, id)
            .await
            .map(|()| "Customer deleted."),
        Err(_) => Err(Error::NotFound),
    };
    conclude(&session, outcome, "/dashboard").await
}
