pub mod common;

use customer_portal::{
    api::user::Role,
    auth::{self, Profile},
    config,
    web::{self, InvalidSecret, MIN_SECRET_LEN},
    Error,
};

#[tokio::test]
async fn authenticates_registered_customer() {
    let db = common::memory_db().await;
    let id = common::register(&db, "Alice", "alice@example.com", "password")
        .await;

    let ctx = auth::authenticate(
        &db,
        "alice@example.com",
        "password",
        Role::Customer,
    )
    .await
    .unwrap();
    assert_eq!(ctx.user_id, id);
    assert_eq!(ctx.role, Role::Customer);

    let me = auth::current_user(&db, &ctx).await.unwrap().unwrap();
    assert_eq!(me.id, id);
    assert_eq!(me.name, "Alice");
    assert_eq!(me.email, "alice@example.com");
    assert_eq!(me.role, Role::Customer);
}

#[tokio::test]
async fn normalizes_email_on_registration_and_login() {
    let db = common::memory_db().await;
    common::register(&db, "Alice", "  Alice@Example.com ", "password").await;

    let ctx = auth::authenticate(
        &db,
        "ALICE@example.com",
        "password",
        Role::Customer,
    )
    .await
    .unwrap();
    let me = auth::current_user(&db, &ctx).await.unwrap().unwrap();
    assert_eq!(me.email, "alice@example.com");
}

#[tokio::test]
async fn rejects_duplicate_email() {
    let db = common::memory_db().await;
    let id = common::register(&db, "Alice", "alice@example.com", "password")
        .await;

    let res = auth::register(
        &db,
        "ALICE@example.com",
        "other-password",
        Profile {
            name: "Mallory".to_string(),
        },
    )
    .await;
    assert!(matches!(res, Err(Error::DuplicateEmail)), "{res:?}");

    let ctx = auth::authenticate(
        &db,
        "alice@example.com",
        "password",
        Role::Customer,
    )
    .await
    .unwrap();
    let me = auth::current_user(&db, &ctx).await.unwrap().unwrap();
    assert_eq!(me.id, id);
    assert_eq!(me.name, "Alice");
}

#[tokio::test]
async fn requires_all_registration_fields() {
    let db = common::memory_db().await;

    for (name, email, password) in [
        ("", "alice@example.com", "password"),
        ("Alice", "   ", "password"),
        ("Alice", "alice@example.com", ""),
        ("Alice", "not-an-email", "password"),
    ] {
        let res = auth::register(
            &db,
            email,
            password,
            Profile {
                name: name.to_string(),
            },
        )
        .await;
        assert!(matches!(res, Err(Error::Validation(_))), "{res:?}");
    }
}

#[tokio::test]
async fn rejects_wrong_password() {
    let db = common::memory_db().await;
    common::register(&db, "Alice", "alice@example.com", "password").await;

    let res = auth::authenticate(
        &db,
        "alice@example.com",
        "Password",
        Role::Customer,
    )
    .await;
    assert!(matches!(res, Err(Error::InvalidCredentials)), "{res:?}");
}

#[tokio::test]
async fn rejects_unknown_email() {
    let db = common::memory_db().await;

    let res =
        auth::authenticate(&db, "bob@example.com", "password", Role::Customer)
            .await;
    assert!(matches!(res, Err(Error::InvalidCredentials)), "{res:?}");
}

#[tokio::test]
async fn separates_customer_and_admin_logins() {
    let db = common::seeded_db().await;
    common::register(&db, "Alice", "alice@example.com", "password").await;

    let res =
        auth::authenticate(&db, "alice@example.com", "password", Role::Admin)
            .await;
    assert!(matches!(res, Err(Error::InvalidCredentials)), "{res:?}");

    let res = auth::authenticate(
        &db,
        common::ADMIN_EMAIL,
        common::ADMIN_PASSWORD,
        Role::Customer,
    )
    .await;
    assert!(matches!(res, Err(Error::InvalidCredentials)), "{res:?}");

    let ctx = common::admin(&db).await;
    assert_eq!(ctx.role, Role::Admin);
}

#[tokio::test]
async fn requires_email_and_password_to_log_in() {
    let db = common::memory_db().await;

    let res = auth::authenticate(&db, "", "password", Role::Customer).await;
    assert!(matches!(res, Err(Error::Validation(_))), "{res:?}");

    let res =
        auth::authenticate(&db, "alice@example.com", "", Role::Customer).await;
    assert!(matches!(res, Err(Error::Validation(_))), "{res:?}");
}

#[tokio::test]
async fn bootstraps_admin_once() {
    let db = common::memory_db().await;

    let admin = config::Admin::default();
    assert!(auth::bootstrap_admin(&db, &admin).await.unwrap());
    assert!(!auth::bootstrap_admin(&db, &admin).await.unwrap());

    let other = config::Admin {
        email: "root@example.com".to_string(),
        password: "root".to_string(),
    };
    assert!(!auth::bootstrap_admin(&db, &other).await.unwrap());

    let res =
        auth::authenticate(&db, "root@example.com", "root", Role::Admin).await;
    assert!(matches!(res, Err(Error::InvalidCredentials)), "{res:?}");
}

#[tokio::test]
async fn bootstraps_admin_with_configured_credentials() {
    let db = common::memory_db().await;

    let admin = config::Admin {
        email: "Root@Example.com".to_string(),
        password: "hunter2".to_string(),
    };
    assert!(auth::bootstrap_admin(&db, &admin).await.unwrap());

    let ctx =
        auth::authenticate(&db, "root@example.com", "hunter2", Role::Admin)
            .await
            .unwrap();
    let me = auth::current_user(&db, &ctx).await.unwrap().unwrap();
    assert_eq!(me.name, "Admin");
    assert_eq!(me.role, Role::Admin);
}

#[tokio::test]
async fn forgets_deleted_user() {
    let db = common::seeded_db().await;
    let alice = common::customer(&db, "Alice", "alice@example.com").await;
    let admin = common::admin(&db).await;

    customer_portal::service::delete_customer(&db, &admin, alice.user_id)
        .await
        .unwrap();

    assert_eq!(auth::current_user(&db, &alice).await.unwrap(), None);
}

#[tokio::test]
async fn requires_long_session_secret() {
    let db = common::memory_db().await;

    let short = "s".repeat(MIN_SECRET_LEN - 1);
    let res = web::router(db.clone(), &common::session_config(Some(&short)));
    assert!(matches!(res, Err(InvalidSecret)));

    let long = "s".repeat(MIN_SECRET_LEN);
    assert!(web::router(db, &common::session_config(Some(&long))).is_ok());
}
