//! Print the raw TMDB payload next to the fields cinescope maps from it.
//! Usage:
//!   cargo run --bin tmdb_raw -- movie <tmdb_id>
//!   cargo run --bin tmdb_raw -- popular [page]
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use cinescope::models::{Movie, MoviesPage};
use cinescope::tmdb::{backdrop_url, poster_url, TMDB_BASE};
use dotenvy::dotenv;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Endpoint {
    Movie,
    Popular,
}

impl FromStr for Endpoint {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(Endpoint::Movie),
            "popular" => Ok(Endpoint::Popular),
            _ => Err(anyhow::anyhow!("endpoint must be 'movie' or 'popular'")),
        }
    }
}

fn summary(movie: &Movie) -> Value {
    json!({
        "id": movie.id,
        "title": movie.title,
        "year": movie.year(),
        "rating": movie.rating_label(),
        "runtime": movie.runtime_label(),
        "genres": movie.genre_names(),
        "poster": poster_url(movie.poster_path.as_deref()),
        "backdrop": backdrop_url(movie.backdrop_path.as_deref()),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let api_key = env::var("TMDB_API_KEY").context("TMDB_API_KEY not set")?;
    let base = env::var("TMDB_BASE_URL").unwrap_or_else(|_| TMDB_BASE.to_string());

    let mut args = env::args().skip(1);
    let endpoint: Endpoint = args
        .next()
        .context("usage: tmdb_raw <movie|popular> [arg]")?
        .parse()?;
    let arg = args.next();

    let url = match endpoint {
        Endpoint::Movie => {
            let id: i32 = arg.context("movie id required")?.parse()?;
            format!("{base}/movie/{id}?language=en-US&api_key={api_key}")
        }
        Endpoint::Popular => {
            let page: u32 = arg.as_deref().unwrap_or("1").parse()?;
            format!("{base}/movie/popular?page={page}&language=en-US&api_key={api_key}")
        }
    };

    let raw: Value = Client::new()
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let mapped = match endpoint {
        Endpoint::Movie => {
            let movie: Movie = serde_json::from_value(raw.clone())?;
            summary(&movie)
        }
        Endpoint::Popular => {
            let page: MoviesPage = serde_json::from_value(raw.clone())?;
            json!({
                "page": page.page,
                "total_pages": page.total_pages,
                "total_results": page.total_results,
                "results": page.results.iter().map(summary).collect::<Vec<_>>(),
            })
        }
    };

    println!("--- raw ---\n{}", serde_json::to_string_pretty(&raw)?);
    println!("--- mapped ---\n{}", serde_json::to_string_pretty(&mapped)?);
    Ok(())
}
