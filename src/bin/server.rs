//! FilmDeck Sync Server
//!
//! Stores each user's recipe and settings documents as plain JSON and
//! fans out every write to the user's connected devices over WebSocket.
//!
//! # Configuration
//!
//! Environment variables:
//! - `FILMDECK_SERVER_PORT`: Port to listen on (default: 8080)
//! - `FILMDECK_SERVER_DATA_DIR`: Directory to store documents (default: ~/.local/share/filmdeck-server)
//! - `FILMDECK_SERVER_CONFIG`: Path to config file (default: ~/.config/filmdeck-server/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! api_keys:
//!   - key: "your-secret-key-here"
//!     user_id: "erik"
//! ```
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `GET /data/{kind}`: Fetch the recipes or settings document
//! - `PUT /data/{kind}`: Replace the recipes or settings document
//! - `GET /backups`: List backups, newest first
//! - `POST /backups`: Store a backup snapshot
//! - `GET /backups/{id}`: Fetch one backup
//! - `DELETE /backups/{id}`: Delete one backup
//! - `GET /sync?key=...`: WebSocket change feed of `{kind, doc}` frames

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, Request, State,
    },
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use filmdeck::remote::DocKind;
use filmdeck::server::{FeedHub, ServerStorage};

// ============================================================================
// Configuration
// ============================================================================

/// API key entry in config
#[derive(Debug, Clone, Deserialize)]
struct ApiKeyEntry {
    key: String,
    user_id: String,
}

/// Config file structure
#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    api_keys: Vec<ApiKeyEntry>,
}

/// Server configuration
#[derive(Debug, Clone)]
struct Config {
    port: u16,
    data_dir: PathBuf,
    config_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Self {
        let port = std::env::var("FILMDECK_SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("FILMDECK_SERVER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("filmdeck-server")
            });

        let config_path = std::env::var("FILMDECK_SERVER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("filmdeck-server")
                    .join("config.yaml")
            });

        Self {
            port,
            data_dir,
            config_path,
        }
    }
}

// ============================================================================
// Authentication
// ============================================================================

/// Authenticated user info, added to request extensions after auth
#[derive(Debug, Clone)]
struct AuthUser {
    user_id: String,
}

/// API key store - maps key -> AuthUser
#[derive(Debug, Clone)]
struct ApiKeyStore {
    keys: HashMap<String, AuthUser>,
}

/// First 8 hex chars of the key's SHA-256, safe to log.
fn key_fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let mut out = String::with_capacity(8);
    for byte in &digest[..4] {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

impl ApiKeyStore {
    /// Load API keys from config file
    fn load(config_path: &PathBuf) -> Self {
        let keys = match std::fs::read_to_string(config_path) {
            Ok(contents) => match serde_yaml::from_str::<ConfigFile>(&contents) {
                Ok(config) => {
                    let mut map = HashMap::new();
                    for entry in config.api_keys {
                        tracing::info!(
                            "Loaded key {} for user '{}'",
                            key_fingerprint(&entry.key),
                            entry.user_id
                        );
                        map.insert(
                            entry.key,
                            AuthUser {
                                user_id: entry.user_id,
                            },
                        );
                    }
                    map
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}", e);
                    HashMap::new()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}",
                    config_path.display(),
                    e
                );
                tracing::warn!("No API keys loaded - all authenticated requests will fail");
                HashMap::new()
            }
        };

        Self { keys }
    }

    /// Validate an API key and return the associated user
    fn validate(&self, key: &str) -> Option<AuthUser> {
        self.keys.get(key).cloned()
    }
}

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    api_keys: Arc<ApiKeyStore>,
    storage: ServerStorage,
    hub: Arc<FeedHub>,
}

/// Error response body
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: &'static str,
}

fn error_response(status: StatusCode, error: &'static str, message: &'static str) -> Response {
    (status, Json(ErrorBody { error, message })).into_response()
}

/// Authentication middleware
async fn auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let api_key = match auth_header {
        Some(h) if h.starts_with("Bearer ") => &h[7..],
        Some(_) => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "invalid_auth",
                "Authorization header must use Bearer scheme",
            );
        }
        None => {
            return error_response(
                StatusCode::UNAUTHORIZED,
                "missing_auth",
                "Authorization header required",
            );
        }
    };

    match state.api_keys.validate(api_key) {
        Some(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        None => error_response(StatusCode::UNAUTHORIZED, "invalid_key", "Invalid API key"),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn storage_error(e: filmdeck::server::ServerStorageError) -> Response {
    tracing::error!("Storage error: {}", e);
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "storage",
        "Storage operation failed",
    )
}

async fn get_doc(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
) -> Response {
    let Some(kind) = DocKind::parse(&kind) else {
        return error_response(StatusCode::NOT_FOUND, "unknown_kind", "Unknown document kind");
    };
    match state.storage.load(&user.user_id, kind) {
        Ok(Some(doc)) => Json(doc).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "not_found", "Document not stored yet"),
        Err(e) => storage_error(e),
    }
}

async fn put_doc(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
    Json(doc): Json<serde_json::Value>,
) -> Response {
    let Some(kind) = DocKind::parse(&kind) else {
        return error_response(StatusCode::NOT_FOUND, "unknown_kind", "Unknown document kind");
    };
    if let Err(e) = state.storage.save(&user.user_id, kind, &doc) {
        return storage_error(e);
    }
    tracing::debug!("Stored {} document for '{}'", kind.name(), user.user_id);
    state.hub.broadcast(&user.user_id, kind, doc).await;
    StatusCode::NO_CONTENT.into_response()
}

#[derive(Serialize)]
struct BackupSummary {
    id: String,
    #[serde(rename = "createdAt")]
    created_at: chrono::DateTime<chrono::Utc>,
}

async fn list_backups(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Response {
    match state.storage.list_backups(&user.user_id) {
        Ok(backups) => Json(
            backups
                .into_iter()
                .map(|b| BackupSummary {
                    id: b.id,
                    created_at: b.created_at,
                })
                .collect::<Vec<_>>(),
        )
        .into_response(),
        Err(e) => storage_error(e),
    }
}

#[derive(Serialize)]
struct CreatedResponse {
    id: String,
}

async fn create_backup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(doc): Json<serde_json::Value>,
) -> Response {
    match state.storage.create_backup(&user.user_id, &doc) {
        Ok(id) => {
            tracing::info!("Stored backup {} for '{}'", id, user.user_id);
            (StatusCode::CREATED, Json(CreatedResponse { id })).into_response()
        }
        Err(e) => storage_error(e),
    }
}

async fn get_backup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Response {
    match state.storage.load_backup(&user.user_id, &id) {
        Ok(Some(doc)) => Json(doc).into_response(),
        Ok(None) | Err(filmdeck::server::ServerStorageError::InvalidBackupId(_)) => {
            error_response(StatusCode::NOT_FOUND, "not_found", "No such backup")
        }
        Err(e) => storage_error(e),
    }
}

async fn delete_backup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Response {
    match state.storage.delete_backup(&user.user_id, &id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) | Err(filmdeck::server::ServerStorageError::InvalidBackupId(_)) => {
            error_response(StatusCode::NOT_FOUND, "not_found", "No such backup")
        }
        Err(e) => storage_error(e),
    }
}

// ============================================================================
// Change feed
// ============================================================================

#[derive(Deserialize)]
struct FeedQuery {
    key: Option<String>,
}

/// One outbound feed frame, serialized to JSON text.
#[derive(Serialize)]
struct FeedFrame<'a> {
    kind: &'a str,
    doc: &'a serde_json::Value,
}

/// WebSocket upgrade for the change feed. Browsers and WebSocket clients
/// can't set an Authorization header on the upgrade request, so the key
/// travels as a query parameter instead.
async fn feed_handler(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let user = query.key.as_deref().and_then(|k| state.api_keys.validate(k));
    let Some(user) = user else {
        return error_response(StatusCode::UNAUTHORIZED, "invalid_key", "Invalid API key");
    };
    ws.on_upgrade(move |socket| feed_connection(socket, state, user))
}

async fn feed_connection(mut socket: WebSocket, state: AppState, user: AuthUser) {
    tracing::info!("Feed connected for '{}'", user.user_id);
    let mut updates = state.hub.subscribe(&user.user_id).await;

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(update) => {
                    let frame = FeedFrame {
                        kind: update.kind.name(),
                        doc: &update.doc,
                    };
                    let text = serde_json::to_string(&frame)
                        .expect("feed frame always serializes");
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Feed for '{}' lagged by {} updates", user.user_id, n);
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            message = socket.recv() => match message {
                Some(Ok(Message::Ping(data))) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Feed socket error for '{}': {}", user.user_id, e);
                    break;
                }
            },
        }
    }

    tracing::info!("Feed disconnected for '{}'", user.user_id);
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "filmdeck_server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    // Ensure data directory exists
    if let Err(e) = std::fs::create_dir_all(&config.data_dir) {
        tracing::error!("Failed to create data directory: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Config file: {}", config.config_path.display());

    let api_keys = Arc::new(ApiKeyStore::load(&config.config_path));

    let state = AppState {
        api_keys,
        storage: ServerStorage::new(&config.data_dir),
        hub: Arc::new(FeedHub::new()),
    };

    // Build router
    // Public routes (no auth; the feed authenticates via query key)
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/sync", get(feed_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/data/{kind}", get(get_doc).put(put_doc))
        .route("/backups", get(list_backups).post(create_backup))
        .route("/backups/{id}", get(get_backup).delete(delete_backup))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
