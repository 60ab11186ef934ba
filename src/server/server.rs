use anyhow::{Context, Result};
use std::io::Write;
use std::time::Duration;

use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{log_requests, state::*, ServerConfig};
use crate::catalog::{ListName, MovieRecord, ServiceError};
use crate::reconcile::ImportReport;
use crate::tmdb::MediaKind;

const MAX_UPLOAD_SIZE: usize = 20 * 1024 * 1024;
const WORKBOOK_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "ods"];

#[derive(Serialize)]
struct ServerStats {
    pub started_at: String,
    pub uptime: String,
    pub version: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[derive(Debug, Serialize)]
struct AddResponse {
    message: String,
    movie: MovieRecord,
}

#[derive(Debug, Serialize)]
struct UploadResponse {
    message: String,
    report: ImportReport,
}

#[derive(Deserialize, Debug)]
struct ImageLanguageQuery {
    #[serde(rename = "posterLang")]
    poster_lang: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SearchQuery {
    #[serde(default)]
    query: String,
}

#[derive(Deserialize, Debug)]
struct AddBody {
    tmdb_id: u64,
    media_type: String,
    target_list: String,
    #[serde(rename = "posterLang")]
    poster_lang: Option<String>,
}

#[derive(Deserialize, Debug)]
struct DeleteBody {
    list_name: String,
    movie_id: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::BadRequest(_) | ServiceError::Import(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Duplicate { .. } => StatusCode::CONFLICT,
            ServiceError::ProviderUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Storage(err) => {
                error!("Catalog storage failure: {:#}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, self.to_string())
    }
}

fn parse_list(value: &str) -> Result<ListName, ServiceError> {
    value.parse().map_err(ServiceError::BadRequest)
}

fn parse_media_type(value: &str) -> Result<MediaKind, ServiceError> {
    value.parse().map_err(ServiceError::BadRequest)
}

// =============================================================================
// Handlers
// =============================================================================

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        started_at: state.started_at.to_rfc3339(),
        uptime: format_uptime(state.start_time.elapsed()),
        version: state.version.clone(),
    };
    Json(stats)
}

async fn get_movies(State(service): State<GuardedCatalogService>) -> Response {
    match service.list().await {
        Ok(catalog) => Json(catalog).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_movie_data(
    State(service): State<GuardedCatalogService>,
    Path((list, id)): Path<(String, String)>,
    Query(query): Query<ImageLanguageQuery>,
) -> Response {
    let list = match parse_list(&list) {
        Ok(list) => list,
        Err(err) => return err.into_response(),
    };
    match service
        .enrich(list, &id, query.poster_lang.as_deref())
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn get_tmdb_data(
    State(service): State<GuardedCatalogService>,
    Path((media_type, tmdb_id)): Path<(String, String)>,
    Query(query): Query<ImageLanguageQuery>,
) -> Response {
    let media_type = match parse_media_type(&media_type) {
        Ok(media_type) => media_type,
        Err(err) => return err.into_response(),
    };
    let tmdb_id = match tmdb_id.parse::<u64>() {
        Ok(tmdb_id) => tmdb_id,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "Invalid TMDB id"),
    };
    match service
        .provider_record(media_type, tmdb_id, query.poster_lang.as_deref())
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn search(
    State(service): State<GuardedCatalogService>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match service.search(&query.query).await {
        Ok(candidates) => Json(candidates).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn add_movie(
    State(service): State<GuardedCatalogService>,
    body: Result<Json<AddBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected add request: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };
    let (media_type, list) = match (
        parse_media_type(&body.media_type),
        parse_list(&body.target_list),
    ) {
        (Ok(media_type), Ok(list)) => (media_type, list),
        (Err(err), _) | (_, Err(err)) => return err.into_response(),
    };

    match service
        .add(body.tmdb_id, media_type, list, body.poster_lang.as_deref())
        .await
    {
        Ok(movie) => Json(AddResponse {
            message: format!("\"{}\" was added to {}", movie.title, list),
            movie,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

async fn delete_movie(
    State(service): State<GuardedCatalogService>,
    body: Result<Json<DeleteBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected delete request: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, "Invalid JSON");
        }
    };
    let list = match parse_list(&body.list_name) {
        Ok(list) => list,
        Err(err) => return err.into_response(),
    };

    match service.delete(list, &body.movie_id).await {
        Ok(title) => Json(MessageResponse {
            message: format!("\"{}\" was deleted", title),
        })
        .into_response(),
        Err(ServiceError::NotFound(_)) => {
            error_response(StatusCode::NOT_FOUND, "Movie not found to delete")
        }
        Err(err) => err.into_response(),
    }
}

async fn clear_catalog(State(service): State<GuardedCatalogService>) -> Response {
    match service.clear().await {
        Ok(()) => Json(MessageResponse {
            message: "All catalog data was cleared".to_string(),
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

fn workbook_extension(filename: &str) -> Option<&'static str> {
    let lowered = filename.to_lowercase();
    WORKBOOK_EXTENSIONS
        .into_iter()
        .find(|ext| lowered.ends_with(&format!(".{}", ext)))
}

/// Keeps an uploaded workbook on disk for the length of the import.
fn save_upload(
    config: &ServerConfig,
    extension: &str,
    data: &[u8],
) -> Result<tempfile::NamedTempFile> {
    std::fs::create_dir_all(&config.uploads_dir)
        .with_context(|| format!("Failed to create {:?}", config.uploads_dir))?;
    let mut file = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&format!(".{}", extension))
        .tempfile_in(&config.uploads_dir)
        .context("Failed to create upload file")?;
    file.write_all(data).context("Failed to write upload")?;
    file.flush().context("Failed to flush upload")?;
    Ok(file)
}

async fn upload_workbook(
    State(service): State<GuardedCatalogService>,
    State(config): State<ServerConfig>,
    mut multipart: Multipart,
) -> Response {
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut poster_lang: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                warn!("Malformed upload: {}", err);
                return error_response(StatusCode::BAD_REQUEST, "Malformed upload");
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                match field.bytes().await {
                    Ok(bytes) => upload = Some((filename, bytes.to_vec())),
                    Err(err) => {
                        warn!("Failed to read uploaded file: {}", err);
                        return error_response(StatusCode::BAD_REQUEST, "Failed to read file");
                    }
                }
            }
            "posterLang" => {
                if let Ok(text) = field.text().await {
                    poster_lang = Some(text);
                }
            }
            _ => {}
        }
    }

    let (filename, data) = match upload {
        Some(upload) => upload,
        None => return error_response(StatusCode::BAD_REQUEST, "No file part"),
    };
    let extension = match workbook_extension(&filename) {
        Some(extension) if !data.is_empty() => extension,
        _ => return error_response(StatusCode::BAD_REQUEST, "Invalid file"),
    };

    let file = match save_upload(&config, extension, &data) {
        Ok(file) => file,
        Err(err) => {
            error!("Could not store upload '{}': {:#}", filename, err);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not store the uploaded file",
            );
        }
    };

    info!("Importing '{}' ({} bytes)", filename, data.len());
    let result = service
        .import_workbook(file.path().to_path_buf(), poster_lang.as_deref())
        .await;
    drop(file);

    match result {
        Ok(report) => Json(UploadResponse {
            message: format!("File '{}' processed. {}", filename, report.summary()),
            report,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

// =============================================================================
// App
// =============================================================================

pub fn make_app(config: ServerConfig, catalog_service: GuardedCatalogService) -> Router {
    let state = ServerState::new(config.clone(), catalog_service);

    let api_routes: Router = Router::new()
        .route("/movies", get(get_movies))
        .route("/movie_data/{list}/{id}", get(get_movie_data))
        .route("/tmdb_data/{media_type}/{tmdb_id}", get(get_tmdb_data))
        .route("/search", get(search))
        .route("/add", post(add_movie))
        .route("/delete", post(delete_movie))
        .route("/clear_cache", post(clear_catalog))
        .route(
            "/upload",
            post(upload_workbook).layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE)),
        )
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    home_router
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub async fn run_server(config: ServerConfig, catalog_service: GuardedCatalogService) -> Result<()> {
    let port = config.port;
    let app = make_app(config, catalog_service);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on {}", listener.local_addr()?);

    Ok(axum::serve(listener, app).await?)
}
