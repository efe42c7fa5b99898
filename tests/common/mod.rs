#![allow(dead_code)]

use std::{fmt::Display, time::Duration};

use customer_portal::{
    api,
    auth::{self, Context, Profile},
    config, db, web,
};
use reqwest::{header::LOCATION, redirect, StatusCode};
use tokio::net;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin123";

pub async fn memory_db() -> db::Client {
    db::connect(config::Db {
        url: "sqlite::memory:".to_string(),
    })
    .await
    .expect("failed to open database")
}

/// Database with the bootstrap admin account.
pub async fn seeded_db() -> db::Client {
    let db = memory_db().await;
    auth::bootstrap_admin(&db, &config::Admin::default())
        .await
        .expect("failed to create admin");
    db
}

pub async fn register(
    db: &db::Client,
    name: &str,
    email: &str,
    password: &str,
) -> api::user::Id {
    auth::register(
        db,
        email,
        password,
        Profile {
            name: name.to_string(),
        },
    )
    .await
    .expect("failed to register")
}

pub async fn customer(db: &db::Client, name: &str, email: &str) -> Context {
    register(db, name, email, "password").await;
    auth::authenticate(db, email, "password", api::user::Role::Customer)
        .await
        .expect("failed to authenticate")
}

pub async fn admin(db: &db::Client) -> Context {
    auth::authenticate(db, ADMIN_EMAIL, ADMIN_PASSWORD, api::user::Role::Admin)
        .await
        .expect("failed to authenticate")
}

pub fn session_config(secret: Option<&str>) -> config::Session {
    config::Session {
        secret: secret.map(str::to_string),
        expiration_time: Duration::from_secs(60 * 60),
        secure_cookie: false,
    }
}

/// Serves the application on an ephemeral port.
///
/// Returns the base URL and a handle to the database behind it.
pub async fn spawn_app() -> (String, db::Client) {
    let db = seeded_db().await;
    let app = web::router(db.clone(), &session_config(None))
        .expect("failed to build router");

    let listener = net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("no local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });

    (format!("http://{addr}"), db)
}

/// Browser-like client keeping its session cookie between requests.
pub struct Client {
    inner: reqwest::Client,
    base_url: String,
}

/// Status, `Location` header, session cookie set and body of a response.
#[derive(Debug)]
pub struct Page {
    pub status: StatusCode,
    pub location: Option<String>,
    pub cookie: Option<String>,
    pub body: String,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        Self {
            inner: reqwest::Client::builder()
                .cookie_store(true)
                .redirect(redirect::Policy::none())
                .build()
                .expect("failed to build client"),
            base_url: base_url.to_string(),
        }
    }

    pub async fn get(&self, path: &str) -> Page {
        let res = self
            .inner
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("failed to send a request");
        Self::page(res).await
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> Page {
        let res = self
            .inner
            .post(format!("{}{path}", self.base_url))
            .form(form)
            .send()
            .await
            .expect("failed to send a request");
        Self::page(res).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Page {
        self.post(
            "/register",
            &[("name", name), ("email", email), ("password", password)],
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> Page {
        self.post("/login", &[("email", email), ("password", password)])
            .await
    }

    pub async fn admin_login(&self, email: &str, password: &str) -> Page {
        self.post("/admin/login", &[("email", email), ("password", password)])
            .await
    }

    pub async fn dashboard(&self) -> Page {
        self.get("/dashboard").await
    }

    pub async fn update_profile(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Page {
        self.post(
            "/profile",
            &[("name", name), ("email", email), ("password", password)],
        )
        .await
    }

    pub async fn add_request(&self, title: &str, description: &str) -> Page {
        self.post(
            "/requests",
            &[("title", title), ("description", description)],
        )
        .await
    }

    pub async fn set_status(
        &self,
        id: impl Display,
        status: &str,
    ) -> Page {
        self.post(&format!("/requests/{id}/status"), &[("status", status)])
            .await
    }

    pub async fn delete_request(&self, id: impl Display) -> Page {
        self.post(&format!("/requests/{id}/delete"), &[]).await
    }

    pub async fn delete_customer(&self, id: impl Display) -> Page {
        self.post(&format!("/customers/{id}/delete"), &[]).await
    }

    async fn page(res: reqwest::Response) -> Page {
        let status = res.status();
        let location = res
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let cookie = res
            .cookies()
            .find(|c| c.name() == web::SESSION_COOKIE_NAME)
            .map(|c| c.value().to_string());
        let body = res.text().await.expect("failed to get a response");
        Page {
            status,
            location,
            cookie,
            body,
        }
    }
}
