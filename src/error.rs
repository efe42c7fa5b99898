use std::error::Error as StdError;

use argon2::password_hash;
use derive_more::{Display, From};

use crate::db;

/// Failure of a portal operation.
///
/// Every variant is recovered at the request boundary, none of them is fatal.
#[derive(Debug, Display, From)]
pub enum Error {
    #[display("an account with that email already exists")]
    DuplicateEmail,

    #[display("invalid credentials")]
    InvalidCredentials,

    #[display("operation is not permitted for this session")]
    Unauthorized,

    #[display("record not found")]
    NotFound,

    #[display("validation failed: {_0}")]
    Validation(&'static str),

    #[from]
    #[display("database error: {_0}")]
    Db(db::Error),

    #[from]
    #[display("password hashing failed: {_0}")]
    PasswordHash(password_hash::Error),

    #[from]
    #[display("session store error: {_0}")]
    Session(tower_sessions::session::Error),
}

impl Error {
    /// Message shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            Self::DuplicateEmail => "An account with that email already exists.",
            Self::InvalidCredentials => "Invalid credentials.",
            Self::Unauthorized => {
                "You do not have permission to access that page."
            }
            Self::NotFound => "That record no longer exists.",
            Self::Validation(msg) => *msg,
            Self::Db(_) | Self::PasswordHash(_) | Self::Session(_) => {
                "Something went wrong. Please try again."
            }
        }
    }

    /// Whether the error comes from the infrastructure rather than the user.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Db(_) | Self::PasswordHash(_) | Self::Session(_))
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Db(e) => Some(e),
            Self::Session(e) => Some(e),
            Self::DuplicateEmail
            | Self::InvalidCredentials
            | Self::Unauthorized
            | Self::NotFound
            | Self::Validation(_)
            | Self::PasswordHash(_) => None,
        }
    }
}
