use std::{net, time};

use serde::Deserialize;

/// Overrides the bootstrap admin's email.
pub const ADMIN_EMAIL_VAR: &str = "ADMIN_EMAIL";

/// Overrides the bootstrap admin's password.
pub const ADMIN_PASSWORD_VAR: &str = "ADMIN_PASSWORD";

/// Overrides the secret signing the session cookie.
pub const SECRET_KEY_VAR: &str = "SECRET_KEY";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub db: Db,
    pub http: Http,
    pub session: Session,
    #[serde(default)]
    pub admin: Admin,
}

impl Config {
    /// Applies environment overrides, looking each variable up with `var`.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(email) = var(ADMIN_EMAIL_VAR) {
            self.admin.email = email;
        }
        if let Some(password) = var(ADMIN_PASSWORD_VAR) {
            self.admin.password = password;
        }
        if let Some(secret) = var(SECRET_KEY_VAR) {
            self.session.secret = Some(secret);
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Db {
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Http {
    pub server: Server,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Session {
    /// At least 64 bytes. A random key is generated when absent.
    pub secret: Option<String>,
    #[serde(with = "humantime_serde")]
    pub expiration_time: time::Duration,
    #[serde(default)]
    pub secure_cookie: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Admin {
    pub email: String,
    pub password: String,
}

impl Default for Admin {
    fn default() -> Self {
        Self {
            email: "admin@example.com".to_string(),
            password: "admin123".to_string(),
        }
    }
}
