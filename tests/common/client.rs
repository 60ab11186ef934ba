//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all catalog-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::json;
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// GET /api/movies
    pub async fn get_movies(&self) -> Response {
        self.client
            .get(self.url("/api/movies"))
            .send()
            .await
            .expect("Get movies request failed")
    }

    /// GET /api/movie_data/{list}/{id}
    pub async fn get_movie_data(&self, list: &str, id: &str) -> Response {
        self.client
            .get(self.url(&format!("/api/movie_data/{}/{}", list, id)))
            .send()
            .await
            .expect("Get movie data request failed")
    }

    /// GET /api/tmdb_data/{media_type}/{tmdb_id}
    pub async fn get_tmdb_data(&self, media_type: &str, tmdb_id: u64) -> Response {
        self.client
            .get(self.url(&format!("/api/tmdb_data/{}/{}", media_type, tmdb_id)))
            .query(&[("posterLang", "en,null")])
            .send()
            .await
            .expect("Get TMDB data request failed")
    }

    /// GET /api/search?query=
    pub async fn search(&self, query: &str) -> Response {
        self.client
            .get(self.url("/api/search"))
            .query(&[("query", query)])
            .send()
            .await
            .expect("Search request failed")
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// POST /api/add
    pub async fn add(&self, tmdb_id: u64, media_type: &str, target_list: &str) -> Response {
        self.client
            .post(self.url("/api/add"))
            .json(&json!({
                "tmdb_id": tmdb_id,
                "media_type": media_type,
                "target_list": target_list,
            }))
            .send()
            .await
            .expect("Add request failed")
    }

    /// POST /api/delete
    pub async fn delete(&self, list_name: &str, movie_id: &str) -> Response {
        self.client
            .post(self.url("/api/delete"))
            .json(&json!({
                "list_name": list_name,
                "movie_id": movie_id,
            }))
            .send()
            .await
            .expect("Delete request failed")
    }

    /// POST /api/clear_cache
    pub async fn clear(&self) -> Response {
        self.client
            .post(self.url("/api/clear_cache"))
            .send()
            .await
            .expect("Clear request failed")
    }

    /// POST /api/upload with a single file part
    pub async fn upload(&self, filename: &str, data: Vec<u8>) -> Response {
        let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("posterLang", "en,null");
        self.client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()
            .await
            .expect("Upload request failed")
    }
}
