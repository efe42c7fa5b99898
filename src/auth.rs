//! Credentials and sessions.
//!
//! Passwords are stored as salted argon2 hashes and verified by recomputation.
//! A successful login binds a [`Context`] to the browser's session, and every
//! later operation receives that context explicitly.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{
    api, config,
    db::{
        self,
        user::{self, PasswordHash, Role},
    },
    Error,
};

const CONTEXT_KEY: &str = "context";

/// Who is making the current request.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Context {
    pub user_id: user::Id,
    pub role: Role,
}

impl Context {
    /// Fails with [`Error::Unauthorized`] unless the session has `role`.
    pub fn require(&self, role: Role) -> Result<(), Error> {
        if self.role == role {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }
}

/// Profile fields supplied on registration.
#[derive(Clone, Debug, Default)]
pub struct Profile {
    pub name: String,
}

/// Emails are compared trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registers a new customer account.
pub async fn register(
    db: &db::Client,
    email: &str,
    password: &str,
    profile: Profile,
) -> Result<user::Id, Error> {
    let name = profile.name.trim();
    let email = normalize_email(email);
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(Error::Validation("All fields are required."));
    }
    if !email.contains('@') {
        return Err(Error::Validation("Please enter a valid email address."));
    }

    if db.get_user_by_email(&email).await?.is_some() {
        return Err(Error::DuplicateEmail);
    }

    let user = db::User {
        id: user::Id::new(),
        name: name.to_string(),
        email,
        password_hash: PasswordHash::new(password)?,
        role: Role::Customer,
    };
    insert_user(db, &user).await?;

    tracing::info!(user_id = %user.id, "customer registered");
    Ok(user.id)
}

/// Checks the credentials of a user with the given `role`.
///
/// Customers can't log in through the admin form and vice versa.
pub async fn authenticate(
    db: &db::Client,
    email: &str,
    password: &str,
    role: Role,
) -> Result<Context, Error> {
    let email = normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(Error::Validation("Email and password are required."));
    }

    let user = db
        .get_user_by_email(&email)
        .await?
        .filter(|u| u.role == role && u.password_hash.verify(password))
        .ok_or(Error::InvalidCredentials)?;

    Ok(Context {
        user_id: user.id,
        role: user.role,
    })
}

/// Binds `ctx` to the session under a fresh session id.
pub async fn login(session: &Session, ctx: Context) -> Result<(), Error> {
    session.cycle_id().await?;
    session.insert(CONTEXT_KEY, ctx).await?;
    Ok(())
}

/// Destroys the session and everything stored in it.
pub async fn logout(session: &Session) -> Result<(), Error> {
    session.flush().await?;
    Ok(())
}

/// Context of the session, if it is logged in.
pub async fn context(session: &Session) -> Option<Context> {
    match session.get::<Context>(CONTEXT_KEY).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::warn!("failed to read session context: {e}");
            None
        }
    }
}

/// The user behind `ctx`, or `None` if the account is gone.
pub async fn current_user(
    db: &db::Client,
    ctx: &Context,
) -> Result<Option<api::User>, Error> {
    Ok(db
        .get_user_by_id(ctx.user_id)
        .await?
        .filter(|u| u.role == ctx.role)
        .map(api::User::from))
}

/// Creates the admin account unless one already exists.
///
/// Returns whether an account was created.
pub async fn bootstrap_admin(
    db: &db::Client,
    admin: &config::Admin,
) -> Result<bool, Error> {
    if db.admin_exists().await? {
        return Ok(false);
    }

    let email = normalize_email(&admin.email);
    if email.is_empty() || admin.password.is_empty() {
        return Err(Error::Validation(
            "Admin email and password must not be empty.",
        ));
    }

    let user = db::User {
        id: user::Id::new(),
        name: "Admin".to_string(),
        email,
        password_hash: PasswordHash::new(&admin.password)?,
        role: Role::Admin,
    };
    insert_user(db, &user).await?;

    tracing::info!(email = %user.email, "admin account created");
    Ok(true)
}

/// Inserts or updates `user`, reporting a taken email as
/// [`Error::DuplicateEmail`].
pub(crate) async fn insert_user(
    db: &db::Client,
    user: &db::User,
) -> Result<(), Error> {
    db.write_user(user).await.map_err(|e| {
        if db::is_unique_violation(&e) {
            Error::DuplicateEmail
        } else {
            Error::Db(e)
        }
    })
}
