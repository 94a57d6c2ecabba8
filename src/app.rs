use crate::favorites::{FavoritesStore, Subscription};
use crate::models::{Movie, MoviesPage};
use crate::tmdb::{backdrop_url, poster_url, MovieApi};
use anyhow::{anyhow, bail, Context, Result};
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

pub const USAGE: &str = "\
Usage:
  cinescope popular [page]
  cinescope trending
  cinescope search <query...>
  cinescope movie <tmdb_id>
  cinescope favorites
  cinescope fav <tmdb_id>
  cinescope unfav <tmdb_id>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Popular { page: u32 },
    Trending,
    Search { query: String },
    Movie { id: i32 },
    Favorites,
    Fav { id: i32 },
    Unfav { id: i32 },
}

impl Command {
    /// Parses the arguments following the program name.
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            bail!("missing command\n{USAGE}");
        };
        let command = match name.to_lowercase().as_str() {
            "popular" => Command::Popular {
                page: match rest.first() {
                    Some(p) => parse_page(p)?,
                    None => 1,
                },
            },
            "trending" => Command::Trending,
            "search" => Command::Search {
                query: rest.join(" "),
            },
            "movie" => Command::Movie { id: parse_id(rest)? },
            "favorites" => Command::Favorites,
            "fav" => Command::Fav { id: parse_id(rest)? },
            "unfav" => Command::Unfav { id: parse_id(rest)? },
            other => bail!("unknown command '{other}'\n{USAGE}"),
        };
        Ok(command)
    }
}

fn parse_page(raw: &str) -> Result<u32> {
    match raw.parse::<u32>() {
        Ok(page) if page >= 1 => Ok(page),
        _ => bail!("page must be a positive integer, got '{raw}'"),
    }
}

fn parse_id(rest: &[String]) -> Result<i32> {
    let raw = rest
        .first()
        .ok_or_else(|| anyhow!("missing movie id\n{USAGE}"))?;
    raw.parse()
        .with_context(|| format!("movie id must be numeric, got '{raw}'"))
}

/// Terminal front end over the movie API and the favorites store.
pub struct App {
    movies: Arc<dyn MovieApi>,
    favorites: Arc<FavoritesStore>,
    subscription: Subscription,
}

impl App {
    pub fn new(movies: Arc<dyn MovieApi>, favorites: Arc<FavoritesStore>) -> Self {
        let subscription = favorites.subscribe(|movies| {
            info!("Favorites updated: {} movies", movies.len());
        });
        Self {
            movies,
            favorites,
            subscription,
        }
    }

    pub async fn run(&self, command: Command) -> Result<String> {
        match command {
            Command::Popular { page } => self.show_popular(page).await,
            Command::Trending => {
                let data = self
                    .movies
                    .trending()
                    .await
                    .context("Failed to load movies. Please check your API key and try again.")?;
                Ok(self.render_page("Trending This Week", &data, "No movies available"))
            }
            Command::Search { query } => {
                let query = query.trim();
                if query.is_empty() {
                    return self.show_popular(1).await;
                }
                let data = self
                    .movies
                    .search(query, 1)
                    .await
                    .context("Failed to search movies. Please try again.")?;
                Ok(self.render_page(
                    &format!("Results for \"{query}\""),
                    &data,
                    &format!("No movies found for \"{query}\""),
                ))
            }
            Command::Movie { id } => match self.fetch_movie(id).await? {
                Some(movie) => Ok(self.render_details(&movie)),
                None => Ok("Movie not found".to_string()),
            },
            Command::Favorites => Ok(self.render_favorites()),
            Command::Fav { id } => {
                let Some(movie) = self.fetch_movie(id).await? else {
                    return Ok("Movie not found".to_string());
                };
                let title = movie.title.clone();
                if self.favorites.toggle(movie)? {
                    Ok(format!("Added \"{title}\" to favorites"))
                } else {
                    Ok(format!("Removed \"{title}\" from favorites"))
                }
            }
            Command::Unfav { id } => {
                let title = self
                    .favorites
                    .list()
                    .into_iter()
                    .find(|m| m.id == id)
                    .map(|m| m.title);
                self.favorites.remove(id)?;
                Ok(match title {
                    Some(title) => format!("Removed \"{title}\" from favorites"),
                    None => format!("Movie {id} is not in your favorites"),
                })
            }
        }
    }

    async fn show_popular(&self, page: u32) -> Result<String> {
        let data = self
            .movies
            .popular(page)
            .await
            .context("Failed to load popular movies. Please check your API key and try again.")?;
        Ok(self.render_page("Popular Movies", &data, "No movies available"))
    }

    async fn fetch_movie(&self, id: i32) -> Result<Option<Movie>> {
        self.movies
            .movie_details(id)
            .await
            .context("Failed to load movie details. Please try again.")
    }

    fn render_page(&self, title: &str, data: &MoviesPage, empty: &str) -> String {
        let mut out = format!("{title}\n");
        if data.results.is_empty() {
            out.push_str(empty);
            return out;
        }
        for movie in &data.results {
            out.push_str(&self.render_row(movie));
            out.push('\n');
        }
        let _ = write!(
            out,
            "Page {} of {} ({} results)",
            data.page, data.total_pages, data.total_results
        );
        out
    }

    fn render_row(&self, movie: &Movie) -> String {
        let heart = if self.favorites.is_favorite(movie.id) {
            "♥ "
        } else {
            ""
        };
        let year = movie
            .year()
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        format!(
            "{:>8}  {heart}{} ({year})  ★ {}",
            movie.id,
            movie.title,
            movie.rating_label()
        )
    }

    fn render_favorites(&self) -> String {
        let favorites = self.favorites.list();
        if favorites.is_empty() {
            return "My Favorites\nYou haven't added any favorites yet".to_string();
        }
        let plural = if favorites.len() == 1 { "" } else { "s" };
        let mut out = format!(
            "My Favorites\n{} movie{plural} in your collection\n",
            favorites.len()
        );
        for movie in &favorites {
            out.push_str(&self.render_row(movie));
            out.push('\n');
        }
        out.truncate(out.trim_end().len());
        out
    }

    fn render_details(&self, movie: &Movie) -> String {
        let mut out = format!("{}\n", movie.title);
        if let Some(tagline) = movie.tagline.as_deref().filter(|t| !t.is_empty()) {
            let _ = writeln!(out, "\"{tagline}\"");
        }
        let year = movie
            .year()
            .map(|y| y.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let _ = write!(out, "★ {} / 10  |  {year}", movie.rating_label());
        if let Some(runtime) = movie.runtime_label() {
            let _ = write!(out, "  |  {runtime}");
        }
        out.push('\n');
        let genres = movie.genre_names();
        if !genres.is_empty() {
            let _ = writeln!(out, "Genres: {}", genres.join(", "));
        }
        let overview = if movie.overview.is_empty() {
            "No overview available."
        } else {
            movie.overview.as_str()
        };
        let _ = writeln!(out, "\nOverview\n{overview}\n");
        if let Some(url) = poster_url(movie.poster_path.as_deref()) {
            let _ = writeln!(out, "Poster: {url}");
        }
        if let Some(url) = backdrop_url(movie.backdrop_path.as_deref()) {
            let _ = writeln!(out, "Backdrop: {url}");
        }
        let status = if self.favorites.is_favorite(movie.id) {
            "In Favorites"
        } else {
            "Not in favorites"
        };
        out.push_str(status);
        out
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.favorites.unsubscribe(self.subscription);
    }
}
