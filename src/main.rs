use std::{env, error::Error};

use tokio::{fs, net};
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use customer_portal::{auth, db, web, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = fs::read_to_string("config.toml").await?;
    let mut config = toml::from_str::<Config>(&config)?;
    config.apply_env(|name| env::var(name).ok());

    let db_client = db::connect(config.db.clone()).await?;
    db_client.clear_sessions().await?;

    match auth::bootstrap_admin(&db_client, &config.admin).await {
        Ok(_) => {}
        Err(e) if e.is_internal() => return Err(e.into()),
        Err(e) => tracing::warn!("admin account not created: {e}"),
    }

    let app = web::router(db_client, &config.session)?;

    let listener = net::TcpListener::bind(config.http.server.addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
