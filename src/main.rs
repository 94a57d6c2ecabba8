use anyhow::Result;
use cinescope::app::{App, Command};
use cinescope::config::Config;
use cinescope::favorites::FavoritesStore;
use cinescope::storage::FileStorage;
use cinescope::tmdb::TmdbClient;
use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    match loaded {
        Ok(path) => debug!("Loaded environment from {:?}", path),
        Err(e) => debug!("No .env file loaded ({}) - relying on environment", e),
    }

    let args: Vec<String> = env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    let config = Config::from_env()?;

    let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
    let favorites = Arc::new(FavoritesStore::load(storage));
    let movies = Arc::new(TmdbClient::from_config(&config)?);
    let app = App::new(movies, favorites);

    match app.run(command).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            warn!("Command failed: {:#}", e);
            Err(e)
        }
    }
}
