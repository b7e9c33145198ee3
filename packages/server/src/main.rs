use std::net::SocketAddr;
use std::sync::Arc;

use tokio::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::state::AppState;
use store::{BlobStore, FilesystemBlobStore, RecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;

    let data_dir = config.storage.data_dir.clone();
    fs::create_dir_all(&data_dir).await?;
    info!("Data directory: {}", data_dir.display());

    let blobs: Arc<dyn BlobStore> = Arc::new(
        FilesystemBlobStore::new(data_dir.clone(), config.storage.max_photo_size).await?,
    );
    let records = Arc::new(RecordStore::new(data_dir.join("db.json"), blobs.clone()));

    let state = AppState {
        records,
        blobs,
        config: config.clone(),
    };
    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server started on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
