//! Portal operations.
//!
//! Each operation evaluates its authorization predicate against the
//! [`Context`] before touching the database.

use itertools::Itertools as _;
use time::OffsetDateTime;

use crate::{
    api,
    auth::{self, Context},
    db::{
        self,
        request::{self, Status},
        user::{self, PasswordHash, Role},
    },
    Error,
};

/// New values for the customer's own account.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    /// Empty keeps the current password.
    pub password: String,
}

/// Submits a new service request on behalf of the customer.
pub async fn create_request(
    db: &db::Client,
    ctx: &Context,
    title: &str,
    description: &str,
) -> Result<request::Id, Error> {
    ctx.require(Role::Customer)?;

    let (title, description) = (title.trim(), description.trim());
    if title.is_empty() || description.is_empty() {
        return Err(Error::Validation("Title and description are required."));
    }
    if db.get_user_by_id(ctx.user_id).await?.is_none() {
        return Err(Error::NotFound);
    }

    let now = OffsetDateTime::now_utc();
    let request = db::ServiceRequest {
        id: request::Id::new(),
        owner: ctx.user_id,
        title: title.to_string(),
        description: description.to_string(),
        status: Status::Submitted,
        created_at: now,
        updated_at: now,
    };
    db.write_request(&request).await?;

    tracing::info!(request_id = %request.id, "service request submitted");
    Ok(request.id)
}

/// Customers see their own requests, admins see all of them.
pub async fn list_requests(
    db: &db::Client,
    ctx: &Context,
) -> Result<Vec<api::ServiceRequest>, Error> {
    let requests = match ctx.role {
        Role::Customer => db.get_requests_by_owner(ctx.user_id).await?,
        Role::Admin => db.get_requests().await?,
    };

    let owner_ids = requests
        .iter()
        .map(|request| request.owner)
        .unique()
        .collect::<Vec<_>>();
    let owners = db.get_users_by_ids(&owner_ids).await?;

    requests
        .into_iter()
        .map(|request| {
            let owner = owners.get(&request.owner).ok_or(Error::NotFound)?;
            Ok::<_, Error>(api::ServiceRequest {
                id: request.id,
                title: request.title,
                description: request.description,
                status: request.status,
                owner: api::User::from(owner.clone()),
                created_at: request.created_at,
                updated_at: request.updated_at,
            })
        })
        .collect()
}

/// All customer accounts, ordered by name.
pub async fn list_customers(
    db: &db::Client,
    ctx: &Context,
) -> Result<Vec<api::User>, Error> {
    ctx.require(Role::Admin)?;

    Ok(db
        .get_customers()
        .await?
        .into_iter()
        .map(api::User::from)
        .collect())
}

/// Sets the status of any request, `status` being its form value.
pub async fn update_status(
    db: &db::Client,
    ctx: &Context,
    id: request::Id,
    status: &str,
) -> Result<(), Error> {
    ctx.require(Role::Admin)?;

    let status = status
        .parse::<Status>()
        .map_err(|_| Error::Validation("Invalid status selected."))?;
    let mut request =
        db.get_request_by_id(id).await?.ok_or(Error::NotFound)?;
    request.status = status;
    request.updated_at = OffsetDateTime::now_utc();
    db.write_request(&request).await?;

    tracing::info!(request_id = %id, status = status.as_str(), "status updated");
    Ok(())
}

/// Updates the customer's own name, email and, optionally, password.
pub async fn update_profile(
    db: &db::Client,
    ctx: &Context,
    update: ProfileUpdate,
) -> Result<(), Error> {
    ctx.require(Role::Customer)?;

    let name = update.name.trim();
    let email = auth::normalize_email(&update.email);
    if name.is_empty() || email.is_empty() {
        return Err(Error::Validation("Name and email are required."));
    }
    if !email.contains('@') {
        return Err(Error::Validation("Please enter a valid email address."));
    }

    if let Some(other) = db.get_user_by_email(&email).await? {
        if other.id != ctx.user_id {
            return Err(Error::DuplicateEmail);
        }
    }

    let mut me = db
        .get_user_by_id(ctx.user_id)
        .await?
        .ok_or(Error::NotFound)?;
    me.name = name.to_string();
    me.email = email;
    if !update.password.is_empty() {
        me.password_hash = PasswordHash::new(&update.password)?;
    }
    auth::insert_user(db, &me).await
}

/// Deletes a customer and, with them, all of their requests.
pub async fn delete_customer(
    db: &db::Client,
    ctx: &Context,
    id: user::Id,
) -> Result<(), Error> {
    ctx.require(Role::Admin)?;

    if !db.delete_customer(id).await? {
        return Err(Error::NotFound);
    }

    tracing::info!(user_id = %id, "customer deleted");
    Ok(())
}

pub async fn delete_request(
    db: &db::Client,
    ctx: &Context,
    id: request::Id,
) -> Result<(), Error> {
    ctx.require(Role::Admin)?;

    if !db.delete_request(id).await? {
        return Err(Error::NotFound);
    }

    tracing::info!(request_id = %id, "service request deleted");
    Ok(())
}
