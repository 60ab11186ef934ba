//! In-process stand-in for the TMDB v3 API
//!
//! Serves `/search/multi` and `/{movie|tv}/{id}` with fixed data for the
//! titles in `constants`.

use super::constants::*;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::collections::HashMap;
use tokio::net::TcpListener;

fn authorized(params: &HashMap<String, String>) -> bool {
    params.get("api_key").map(String::as_str) == Some(TMDB_API_KEY)
}

async fn search_multi(Query(params): Query<HashMap<String, String>>) -> Response {
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let query = params.get("query").cloned().unwrap_or_default();
    let results = match query.as_str() {
        BROKEN_QUERY => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "Inception" | "盗梦空间" => json!([
            {"id": 17, "media_type": "person", "name": "Somebody"},
            {"id": INCEPTION_ID, "media_type": "movie", "title": INCEPTION_TITLE,
             "release_date": "2010-07-15", "overview": "梦境", "poster_path": "/inception.jpg"}
        ]),
        "Breaking Bad" => json!([
            {"id": BREAKING_BAD_ID, "media_type": "tv", "name": BREAKING_BAD_TITLE,
             "first_air_date": "2008-01-20"}
        ]),
        _ => json!([]),
    };
    Json(json!({ "results": results })).into_response()
}

fn inception(language: &str) -> serde_json::Value {
    let (title, tagline) = if language.starts_with("en") {
        ("Inception", INCEPTION_TAGLINE_EN)
    } else {
        (INCEPTION_TITLE, "梦境即犯罪现场")
    };
    json!({
        "id": INCEPTION_ID,
        "title": title,
        "original_title": "Inception",
        "release_date": "2010-07-15",
        "overview": "一个关于梦境的故事。",
        "tagline": tagline,
        "vote_average": 8.4,
        "budget": 160000000,
        "revenue": 836800000,
        "credits": {
            "cast": [
                {"name": "Leonardo DiCaprio", "character": "Cobb", "profile_path": "/leo.jpg"},
                {"name": "Joseph Gordon-Levitt", "character": "Arthur"}
            ],
            "crew": [
                {"name": "Christopher Nolan", "job": "Director"},
                {"name": "Hans Zimmer", "job": "Original Music Composer"}
            ]
        },
        "images": {
            "posters": [{"file_path": "/poster1.jpg"}],
            "backdrops": [{"file_path": "/still1.jpg"}, {"file_path": "/still2.jpg"}]
        },
        "recommendations": {
            "results": [{"id": 155, "title": "The Dark Knight", "media_type": "movie"}]
        }
    })
}

fn breaking_bad() -> serde_json::Value {
    json!({
        "id": BREAKING_BAD_ID,
        "name": BREAKING_BAD_TITLE,
        "first_air_date": "2008-01-20",
        "overview": "",
        "credits": {"cast": [{"name": "Bryan Cranston", "character": "Walter White"}]}
    })
}

async fn details(
    Path((kind, id)): Path<(String, u64)>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&params) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let language = params.get("language").cloned().unwrap_or_default();
    match (kind.as_str(), id) {
        ("movie", INCEPTION_ID) => Json(inception(&language)).into_response(),
        ("tv", BREAKING_BAD_ID) => Json(breaking_bad()).into_response(),
        ("movie", BROKEN_ID) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Starts the fake provider on a random port and returns its base URL.
pub async fn spawn_fake_tmdb() -> (String, tokio::sync::oneshot::Sender<()>) {
    let app = Router::new()
        .route("/search/multi", get(search_multi))
        .route("/{kind}/{id}", get(details));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake TMDB");
    let addr = listener.local_addr().expect("Failed to get local address");
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Fake TMDB failed");
    });

    (format!("http://{}", addr), shutdown_tx)
}
