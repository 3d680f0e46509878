// Yatube Server - serves the blog over HTTP

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use yatube::{app_state::AppState, config::Config, web::create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("yatube=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tokio::fs::create_dir_all(&config.media.root).await?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;
    let app = create_router(app_state);

    // Start server
    let addr = config.server_address();
    let listener = TcpListener::bind(&addr).await?;
    info!("Yatube listening on http://{}", listener.local_addr()?);
    info!(database = %config.database.url, media = %config.media.root.display(), "storage");

    axum::serve(listener, app).await?;

    Ok(())
}
