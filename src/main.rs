//! BookHaven - Bookstore E-commerce Backend

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookhaven::config::Config;
use bookhaven::http::{self, AppState};
use bookhaven::mail::Mailer;
use bookhaven::notify::Notifier;
use bookhaven::uploads::ImageStore;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new().max_connections(10).connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "could not connect to NATS, staff push disabled");
                None
            }
        },
        None => None,
    };
    let notifier = Notifier::new(nats, config.staff_notify_subject.clone());

    let mailer = match config.smtp.clone() {
        Some(smtp) => Some(Mailer::new(smtp)?),
        None => {
            tracing::info!("SMTP not configured, order bill emails disabled");
            None
        }
    };

    let images = ImageStore::new(config.upload_dir.clone());
    let bind_addr = config.bind_addr.clone();

    let state = AppState { db, notifier, mailer, images, config: Arc::new(config) };
    let app = http::router(state)?;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("bookhaven listening on {}", bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
