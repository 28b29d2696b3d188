//! REST API over the shared operation layer.

mod items;
mod routes;

use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    adapters::Runner,
    cli::Args,
    core::connection::resolve_path,
    error::{AppError, AppResult},
};

/// Shared handler state. The database path is fixed for the server's lifetime.
#[derive(Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
    runner: Runner,
}

impl AppState {
    pub fn new(db_path: impl Into<PathBuf>, runner: Runner) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
            runner,
        }
    }

    pub fn db_path(&self) -> &std::path::Path {
        &self.db_path
    }
}

/// Handler error. Every core failure is a 500; the only 400 is a missing
/// SQL body on `/query`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    Db(AppError),
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        ApiError::Db(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Db(e) => {
                tracing::error!(code = e.code(), error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Database error", "details": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

pub async fn serve(args: &Args, host: &str, port: u16) -> AppResult<()> {
    let db_path = resolve_path(&args.db)?;
    let state = AppState::new(db_path.clone(), Runner::from_args(args));
    let app = router(state);

    let addr = listen_addr(host, port)?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|source| AppError::Io {
        path: PathBuf::from(addr.to_string()),
        source,
    })?;

    tracing::info!("SQLite CRUD server listening on http://{addr}");
    tracing::info!(db = %db_path.display(), "using database");
    for route in ROUTES {
        tracing::info!("{route}");
    }

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("server error: {e}")))
}

/// Accepts IPv4 and IPv6 literals, with or without brackets.
fn listen_addr(host: &str, port: u16) -> AppResult<SocketAddr> {
    let literal = host.trim_start_matches('[').trim_end_matches(']');
    let ip: IpAddr = literal
        .parse()
        .map_err(|e| AppError::validation(format!("invalid listen host {host}: {e}")))?;
    Ok(SocketAddr::new(ip, port))
}

const ROUTES: [&str; 10] = [
    "GET /schema - database schema",
    "POST /query - run a custom SQL query",
    "GET /table/:name - list rows of a table",
    "POST /table/:name - create a row",
    "PUT /table/:name/:id - update a row",
    "DELETE /table/:name/:id - delete a row",
    "GET /items - list items (legacy)",
    "POST /items - create an item (legacy)",
    "PUT /items/:id - update an item (legacy)",
    "DELETE /items/:id - delete an item (legacy)",
];

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/schema", get(routes::schema))
        .route("/query", post(routes::query))
        .route(
            "/table/:name",
            get(routes::list_rows).post(routes::create_row),
        )
        .route(
            "/table/:name/:id",
            put(routes::update_row).delete(routes::delete_row),
        )
        .route("/items", get(items::list).post(items::create))
        .route("/items/:id", put(items::update).delete(items::remove))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
