use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use finetrack_api::auth::hash_password;
use finetrack_api::state::{AppState, AppStateInner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finetrack=debug,tower_http=debug".into()),
        )
        .init();

    // Config. The JWT secret has no fallback: without it every token
    // check would fail open on a guessable default, so refuse to start.
    let jwt_secret = std::env::var("FINETRACK_JWT_SECRET")
        .context("FINETRACK_JWT_SECRET must be set")?;
    let db_path = std::env::var("FINETRACK_DB_PATH").unwrap_or_else(|_| "finetrack.db".into());
    let upload_dir =
        PathBuf::from(std::env::var("FINETRACK_UPLOAD_DIR").unwrap_or_else(|_| "uploads".into()));
    let host = std::env::var("FINETRACK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("FINETRACK_PORT")
        .unwrap_or_else(|_| "5000".into())
        .parse()?;

    // Init database
    let db = finetrack_db::Database::open(&PathBuf::from(&db_path))?;
    seed_admin(&db)?;

    tokio::fs::create_dir_all(upload_dir.join("receipts")).await?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        upload_dir: upload_dir.clone(),
    });

    let app = finetrack_api::router(state)
        .nest_service(
            "/uploads/receipts",
            ServeDir::new(upload_dir.join("receipts")),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("finetrack server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Admins have no self-registration route. When the admins table is
/// empty, seed one account from env so a fresh deployment is usable.
fn seed_admin(db: &finetrack_db::Database) -> anyhow::Result<()> {
    if db.admin_count()? > 0 {
        return Ok(());
    }

    let (Ok(email), Ok(password)) = (
        std::env::var("FINETRACK_ADMIN_EMAIL"),
        std::env::var("FINETRACK_ADMIN_PASSWORD"),
    ) else {
        warn!("no admin account exists and FINETRACK_ADMIN_EMAIL/PASSWORD are not set");
        return Ok(());
    };
    let name = std::env::var("FINETRACK_ADMIN_NAME").unwrap_or_else(|_| "Administrator".into());

    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("{e}"))?;
    db.create_admin(&Uuid::new_v4().to_string(), &name, &email, &hash)?;
    info!("seeded admin account {}", email);
    Ok(())
}
