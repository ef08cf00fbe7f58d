use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &folio_api::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.database_url,
        upload_dir = %cfg.upload_dir.display(),
        loglevel = %cfg.loglevel,
        listen_addr = %cfg.listen_addr
    );

    tokio::fs::create_dir_all(&cfg.upload_dir).await?;

    let pool = folio_api::store::connect(&cfg.database_url).await?;
    let store = folio_api::store::RecordStore::new(pool);
    store.init_schema().await?;

    let mailer = Arc::new(folio_api::mail::SmtpMailer::new(&cfg.smtp)?);

    // Build axum router and serve
    let state = folio_api::router::AppState::new(store, Arc::new((**cfg).clone()), mailer);
    let app = folio_api::router::folio_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
