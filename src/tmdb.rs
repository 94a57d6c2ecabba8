use crate::config::Config;
use crate::models::{Movie, MoviesPage};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

pub const TMDB_BASE: &str = "https://api.themoviedb.org/3";
pub const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W200,
    W500,
    W780,
    W1280,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::W200 => "w200",
            ImageSize::W500 => "w500",
            ImageSize::W780 => "w780",
            ImageSize::W1280 => "w1280",
            ImageSize::Original => "original",
        }
    }
}

/// Builds a CDN URL for an image path. No request is made to check it exists.
pub fn image_url(path: Option<&str>, size: ImageSize) -> Option<String> {
    let path = path.map(str::trim).filter(|p| !p.is_empty())?;
    let path = path.trim_start_matches('/');
    Some(format!("{IMAGE_BASE}/{}/{path}", size.as_str()))
}

pub fn poster_url(path: Option<&str>) -> Option<String> {
    image_url(path, ImageSize::W500)
}

pub fn backdrop_url(path: Option<&str>) -> Option<String> {
    image_url(path, ImageSize::W1280)
}

#[async_trait]
pub trait MovieApi: Send + Sync {
    async fn popular(&self, page: u32) -> Result<MoviesPage>;
    async fn trending(&self) -> Result<MoviesPage>;
    async fn search(&self, query: &str, page: u32) -> Result<MoviesPage>;
    /// `Ok(None)` when the provider has no movie with this id.
    async fn movie_details(&self, id: i32) -> Result<Option<Movie>>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let user_agent = format!("cinescope/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.tmdb_api_key.clone(), config.tmdb_base_url.clone())
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!(
            "{}{path}?api_key={}&language=en-US",
            self.base_url,
            urlencoding::encode(&self.api_key)
        );
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url
    }

    /// Returns `Ok(None)` on 404; any other non-success status is an error.
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<Option<T>> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.without_url())
            .context("request failed")?;
        let status = res.status();
        let text = res
            .text()
            .await
            .map_err(|e| e.without_url())
            .context("reading body failed")?;
        if status == StatusCode::NOT_FOUND {
            debug!("TMDB returned 404 for {}", self.redact(url));
            return Ok(None);
        }
        if !status.is_success() {
            return Err(anyhow!("{} -> {}: {}", self.redact(url), status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(Some(parsed))
    }

    async fn get_page(&self, url: &str) -> Result<MoviesPage> {
        self.get_json(url)
            .await?
            .ok_or_else(|| anyhow!("{} -> 404 Not Found", self.redact(url)))
    }

    fn redact(&self, url: &str) -> String {
        url.replace(&*urlencoding::encode(&self.api_key), "***")
    }
}

#[async_trait]
impl MovieApi for TmdbClient {
    async fn popular(&self, page: u32) -> Result<MoviesPage> {
        let url = self.url("/movie/popular", &[("page", page.to_string())]);
        self.get_page(&url).await
    }

    async fn trending(&self) -> Result<MoviesPage> {
        let url = self.url("/trending/movie/week", &[]);
        self.get_page(&url).await
    }

    async fn search(&self, query: &str, page: u32) -> Result<MoviesPage> {
        let url = self.url(
            "/search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        );
        self.get_page(&url).await
    }

    async fn movie_details(&self, id: i32) -> Result<Option<Movie>> {
        let url = self.url(&format!("/movie/{id}"), &[]);
        self.get_json(&url).await
    }
}
