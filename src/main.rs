use std::sync::Arc;

use campusnav::config::Config;
use campusnav::db::{MemStore, PgStore, Store};
use campusnav::engine::Engine;
use campusnav::error::Error;
use campusnav::server::serve;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("campusnav=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => Arc::new(PgStore::new(url, config.max_connections).await?),
        None => {
            tracing::warn!("DATABASE_URL is not set, keeping places and routes in memory");
            Arc::new(MemStore::new())
        }
    };

    let engine = Engine::from_config(store, &config);

    serve(Arc::new(engine), config.addr).await
}
