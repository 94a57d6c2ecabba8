use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use cinescope::tmdb::{MovieApi, TmdbClient};
use serde_json::{json, Value};
use std::collections::HashMap;

const API_KEY: &str = "test-key";

fn authorized(params: &HashMap<String, String>) -> bool {
    params.get("api_key").map(String::as_str) == Some(API_KEY)
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "status_code": 7,
            "status_message": "Invalid API key: You must be granted a valid key.",
            "success": false
        })),
    )
}

fn listing(page: u32, titles: &[(i32, &str)]) -> Value {
    let results: Vec<Value> = titles
        .iter()
        .map(|(id, title)| {
            json!({
                "id": id,
                "title": title,
                "poster_path": format!("/{id}.jpg"),
                "backdrop_path": null,
                "overview": "",
                "release_date": "2024-03-01",
                "vote_average": 6.5,
                "vote_count": 120,
                "genre_ids": [18]
            })
        })
        .collect();
    json!({
        "page": page,
        "results": results,
        "total_pages": 500,
        "total_results": 10000
    })
}

async fn popular(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if !authorized(&params) {
        return unauthorized();
    }
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    (StatusCode::OK, Json(listing(page, &[(1, "Alpha"), (2, "Beta")])))
}

async fn trending(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if !authorized(&params) {
        return unauthorized();
    }
    (StatusCode::OK, Json(listing(1, &[(3, "Gamma")])))
}

async fn search(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if !authorized(&params) {
        return unauthorized();
    }
    let query = params.get("query").cloned().unwrap_or_default();
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    if query == "the matrix & co" {
        (StatusCode::OK, Json(listing(page, &[(603, "The Matrix")])))
    } else {
        (StatusCode::OK, Json(listing(page, &[])))
    }
}

async fn details(
    Path(id): Path<i32>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    if !authorized(&params) {
        return unauthorized();
    }
    match id {
        438631 => (
            StatusCode::OK,
            Json(json!({
                "id": 438631,
                "title": "Dune",
                "poster_path": "/d5NXSklXo0qyIYkgV94XAgMIckC.jpg",
                "backdrop_path": "/jYEW5xZkZk2WTrdbMGAPFuBqbDc.jpg",
                "overview": "Paul Atreides, a brilliant and gifted young man...",
                "release_date": "2021-09-15",
                "vote_average": 7.8,
                "vote_count": 11000,
                "genres": [{"id": 878, "name": "Science Fiction"}],
                "runtime": 156,
                "tagline": "Beyond fear, destiny awaits."
            })),
        ),
        500 => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status_message": "boom" })),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "status_code": 34,
                "status_message": "The resource you requested could not be found.",
                "success": false
            })),
        ),
    }
}

async fn broken() -> &'static str {
    "<html>not json</html>"
}

async fn spawn_provider() -> String {
    let app = Router::new()
        .route("/3/movie/popular", get(popular))
        .route("/3/movie/:id", get(details))
        .route("/3/trending/movie/week", get(trending))
        .route("/3/search/movie", get(search))
        .route("/broken/movie/popular", get(broken));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve fake provider");
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn popular_page_keeps_paging_fields() {
    let base = spawn_provider().await;
    let client = TmdbClient::new(API_KEY, format!("{base}/3")).unwrap();
    let page = client.popular(2).await.unwrap();
    assert_eq!(page.page, 2);
    assert_eq!(page.total_pages, 500);
    assert_eq!(page.total_results, 10000);
    let titles: Vec<_> = page.results.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);
    assert_eq!(page.results[0].poster_path.as_deref(), Some("/1.jpg"));
}

#[tokio::test]
async fn trending_lists_movies() {
    let base = spawn_provider().await;
    let client = TmdbClient::new(API_KEY, format!("{base}/3")).unwrap();
    let page = client.trending().await.unwrap();
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].id, 3);
}

#[tokio::test]
async fn search_sends_encoded_query_and_page() {
    let base = spawn_provider().await;
    let client = TmdbClient::new(API_KEY, format!("{base}/3")).unwrap();
    let page = client.search("the matrix & co", 3).await.unwrap();
    assert_eq!(page.page, 3);
    assert_eq!(page.results[0].id, 603);

    let empty = client.search("nothing here", 1).await.unwrap();
    assert!(empty.results.is_empty());
}

#[tokio::test]
async fn details_include_extended_fields() {
    let base = spawn_provider().await;
    let client = TmdbClient::new(API_KEY, format!("{base}/3")).unwrap();
    let movie = client.movie_details(438631).await.unwrap().expect("found");
    assert_eq!(movie.title, "Dune");
    assert_eq!(movie.runtime, Some(156));
    assert_eq!(movie.genre_names(), vec!["Science Fiction"]);
    assert_eq!(movie.tagline.as_deref(), Some("Beyond fear, destiny awaits."));
}

#[tokio::test]
async fn missing_movie_is_none() {
    let base = spawn_provider().await;
    let client = TmdbClient::new(API_KEY, format!("{base}/3")).unwrap();
    assert!(client.movie_details(1).await.unwrap().is_none());
}

#[tokio::test]
async fn provider_errors_surface() {
    let base = spawn_provider().await;
    let client = TmdbClient::new(API_KEY, format!("{base}/3")).unwrap();
    assert!(client.movie_details(500).await.is_err());

    let bad_key = TmdbClient::new("wrong", format!("{base}/3")).unwrap();
    let err = bad_key.popular(1).await.unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("401"));
    assert!(!message.contains("api_key=wrong"));

    let malformed = TmdbClient::new(API_KEY, format!("{base}/broken")).unwrap();
    assert!(malformed.popular(1).await.is_err());
}

#[tokio::test]
async fn unreachable_provider_is_an_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = TmdbClient::new(API_KEY, format!("http://{addr}/3")).unwrap();
    assert!(client.popular(1).await.is_err());
}
