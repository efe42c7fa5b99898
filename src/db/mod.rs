pub mod request;
pub mod user;

use std::str::FromStr as _;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tower_sessions::{session_store, ExpiredDeletion as _};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config;

pub use sqlx::Error;

pub use self::{request::ServiceRequest, user::User};

/// Opens the database, creating the file and the tables when absent.
///
/// Sessions are kept in the same database.
pub async fn connect(config: config::Db) -> Result<Client, Error> {
    let options = SqliteConnectOptions::from_str(&config.url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let mut pool = SqlitePoolOptions::new();
    if config.url.contains(":memory:") {
        // The database lives only as long as its connection does.
        pool = pool.max_connections(1).idle_timeout(None).max_lifetime(None);
    }

    let client = Client(pool.connect_with(options).await?);
    client.create_tables().await?;
    client.session_store().migrate().await?;
    Ok(client)
}

#[derive(Clone, Debug)]
pub struct Client(SqlitePool);

impl Client {
    pub fn session_store(&self) -> SqliteStore {
        SqliteStore::new(self.0.clone())
    }

    pub async fn delete_expired_sessions(
        &self,
    ) -> Result<(), session_store::Error> {
        self.session_store().delete_expired().await
    }

    /// Ends every session, logged in or not.
    pub async fn clear_sessions(&self) -> Result<(), Error> {
        const SQL: &str = "DELETE FROM tower_sessions";
        sqlx::query(SQL).execute(&self.0).await.map(drop)
    }

    async fn create_tables(&self) -> Result<(), Error> {
        const USERS: &str = "\
            CREATE TABLE IF NOT EXISTS users ( \
                id BLOB PRIMARY KEY NOT NULL, \
                name TEXT NOT NULL, \
                email TEXT NOT NULL UNIQUE, \
                password_hash TEXT NOT NULL, \
                role INTEGER NOT NULL \
            )";
        const REQUESTS: &str = "\
            CREATE TABLE IF NOT EXISTS requests ( \
                id BLOB PRIMARY KEY NOT NULL, \
                owner_id BLOB NOT NULL REFERENCES users (id), \
                title TEXT NOT NULL, \
                description TEXT NOT NULL, \
                status INTEGER NOT NULL, \
                created_at INTEGER NOT NULL, \
                updated_at INTEGER NOT NULL \
            )";

        sqlx::query(USERS).execute(&self.0).await?;
        sqlx::query(REQUESTS).execute(&self.0).await?;
        Ok(())
    }
}

/// Whether `err` is a `UNIQUE` constraint violation.
pub fn is_unique_violation(err: &Error) -> bool {
    matches!(err, Error::Database(e) if e.is_unique_violation())
}
