use crate::tmdb::TMDB_BASE;
use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct Config {
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub data_dir: PathBuf,
}

impl Config {
    /// Reads `TMDB_API_KEY` (required), `TMDB_BASE_URL` and `CINESCOPE_DATA_DIR`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(tmdb_api_key) = non_empty("TMDB_API_KEY") else {
            bail!("Missing required environment variable: TMDB_API_KEY");
        };
        let tmdb_base_url = non_empty("TMDB_BASE_URL").unwrap_or_else(|| TMDB_BASE.to_string());
        let data_dir = non_empty("CINESCOPE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        info!("Using data directory {}", data_dir.display());

        Ok(Self {
            tmdb_api_key,
            tmdb_base_url,
            data_dir,
        })
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("cinescope"))
        .unwrap_or_else(|| PathBuf::from(".cinescope"))
}
