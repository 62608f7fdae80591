//! Book catalogue API
//!
//! A small axum application serving the in-memory `BookStore` under `/api`:
//!
//! - `GET /api` lists the available endpoints
//! - `GET /api/books`, `POST /api/books`
//! - `GET /api/books/:id`, `PUT /api/books/:id`, `DELETE /api/books/:id`
//!
//! Errors are JSON bodies of the form `{"error": "..."}`.

mod store;

pub use store::BookStore;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::data::{Book, BookUpdate, NewBook};

/// Fields a new book must carry, with the legacy names also accepted
const REQUIRED_FIELDS: [(&str, &str); 3] = [("title", "titulo"), ("author", "autor"), ("year", "año")];

/// Errors returned by the handlers
#[derive(Debug)]
enum ApiError {
    NotFound,
    BadRequest(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "book not found"),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Builds the API router over `store`
pub fn router(store: BookStore) -> Router {
    Router::new()
        .route("/api", get(index))
        .route("/api/books", get(list_books).post(create_book))
        .route(
            "/api/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

/// Serves the API on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, store: BookStore) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "Book API listening");
    axum::serve(listener, router(store)).await
}

/// Binds `addr` and serves the API on a background task
///
/// Returns the bound address (useful with port 0) and the server task.
pub async fn spawn(
    addr: SocketAddr,
    store: BookStore,
) -> std::io::Result<(SocketAddr, JoinHandle<std::io::Result<()>>)> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let handle = tokio::spawn(serve(listener, store));
    Ok((local, handle))
}

async fn index() -> Json<Value> {
    Json(json!({
        "message": "Library API",
        "endpoints": {
            "GET /api/books": "List all books",
            "GET /api/books/<id>": "Get a single book",
            "POST /api/books": "Create a book",
            "PUT /api/books/<id>": "Update a book",
            "DELETE /api/books/<id>": "Delete a book"
        }
    }))
}

async fn list_books(State(store): State<BookStore>) -> Json<Vec<Book>> {
    Json(store.list())
}

async fn get_book(State(store): State<BookStore>, Path(id): Path<u64>) -> Result<Json<Book>, ApiError> {
    store.get(id).map(Json).ok_or(ApiError::NotFound)
}

async fn create_book(
    State(store): State<BookStore>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let has_all = REQUIRED_FIELDS
        .iter()
        .all(|(name, legacy)| body.get(name).is_some() || body.get(legacy).is_some());
    if !has_all {
        return Err(ApiError::BadRequest("missing required fields"));
    }

    let new_book: NewBook =
        serde_json::from_value(body).map_err(|_| ApiError::BadRequest("invalid field values"))?;
    let book = store.insert(new_book);
    debug!(id = book.id, "Book created");
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(store): State<BookStore>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Result<Json<Book>, ApiError> {
    let update: BookUpdate =
        serde_json::from_value(body).map_err(|_| ApiError::BadRequest("invalid field values"))?;
    let book = store.update(id, &update).ok_or(ApiError::NotFound)?;
    debug!(id, "Book updated");
    Ok(Json(book))
}

async fn delete_book(State(store): State<BookStore>, Path(id): Path<u64>) -> Result<Json<Value>, ApiError> {
    if !store.remove(id) {
        return Err(ApiError::NotFound);
    }
    debug!(id, "Book deleted");
    Ok(Json(json!({ "message": "book deleted" })))
}
