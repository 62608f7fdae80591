//! Typed client for the book API
//!
//! Builds on `ResilientClient` and applies the fallback policy callers need:
//! reads prefer a fresh snapshot, and when the API cannot be reached the last
//! known snapshot is served with a warning instead of failing.

use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use tracing::{info, warn};

use super::{Book, BookUpdate, MessageBody, NewBook};
use crate::fetch::{ApiResponse, FetchError, FetchOptions, ResilientClient};

/// Errors returned by `BooksClient`
#[derive(Debug, Error)]
pub enum BooksError {
    /// The request never got an HTTP answer
    #[error("Connection error: {0}")]
    Fetch(#[from] FetchError),

    /// The API has no book with this id
    #[error("Book {0} not found")]
    NotFound(u64),

    /// The API answered with an unexpected status
    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// The body could not be decoded or encoded
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where a listing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingOrigin {
    /// Served from a snapshot within its validity window, no network call
    FreshCache,
    /// Fetched from the API just now
    Live,
    /// The API failed; served from an expired snapshot
    StaleCache,
    /// The API failed and nothing was cached
    Empty,
}

/// Result of listing books; never an error, warnings explain any degradation
#[derive(Debug, Clone)]
pub struct BookListing {
    pub books: Vec<Book>,
    pub origin: ListingOrigin,
    /// Capture time of the snapshot the books came from, when cached
    pub cached_at: Option<DateTime<Utc>>,
    pub warnings: Vec<String>,
}

/// Where a single book came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOrigin {
    FreshCache,
    Live,
    StaleCache,
}

/// Result of looking up one book
#[derive(Debug, Clone)]
pub struct BookLookup {
    pub book: Book,
    pub origin: LookupOrigin,
    pub warnings: Vec<String>,
}

/// Client for the book collection endpoints
#[derive(Clone)]
pub struct BooksClient {
    http: ResilientClient,
}

impl BooksClient {
    pub fn new(http: ResilientClient) -> Self {
        Self { http }
    }

    /// The underlying fetch helper
    pub fn http(&self) -> &ResilientClient {
        &self.http
    }

    /// Lists all books
    ///
    /// # Behavior
    /// - A fresh snapshot is returned without touching the network
    /// - Otherwise the collection is fetched; a 200 replaces the snapshot
    /// - On an error status or a connection failure, the last snapshot is
    ///   returned if there is one, otherwise an empty list; both with warnings
    pub async fn list_books(&self) -> BookListing {
        if let Some(snapshot) = self.http.cache().fresh() {
            info!("Using cached books");
            return BookListing {
                books: snapshot.books.clone(),
                origin: ListingOrigin::FreshCache,
                cached_at: Some(snapshot.captured_at),
                warnings: Vec::new(),
            };
        }

        let url = self.http.collection_url().to_string();
        let warning = match self.http.fetch(Method::GET, &url, FetchOptions::new()).await {
            Ok(response) if response.status == StatusCode::OK => match response.json::<Vec<Book>>() {
                Ok(books) => {
                    let snapshot = self.http.cache().replace(books);
                    return BookListing {
                        books: snapshot.books.clone(),
                        origin: ListingOrigin::Live,
                        cached_at: Some(snapshot.captured_at),
                        warnings: Vec::new(),
                    };
                }
                Err(e) => format!("Failed to read books: {}", e),
            },
            Ok(response) => format!("Failed to fetch books: {}", response.status.as_u16()),
            Err(e) => format!("Connection error: {}", e),
        };

        warn!(%warning, "Falling back to cached books");
        self.fallback_listing(warning)
    }

    fn fallback_listing(&self, warning: String) -> BookListing {
        match self.http.cache().current() {
            Some(snapshot) => BookListing {
                books: snapshot.books.clone(),
                origin: ListingOrigin::StaleCache,
                cached_at: Some(snapshot.captured_at),
                warnings: vec![warning, "Showing cached data".to_string()],
            },
            None => BookListing {
                books: Vec::new(),
                origin: ListingOrigin::Empty,
                cached_at: None,
                warnings: vec![warning],
            },
        }
    }

    /// Looks up one book
    ///
    /// A fresh snapshot answers without a network call. If the API cannot be
    /// reached, an entry from an expired snapshot is returned with a warning.
    pub async fn get_book(&self, id: u64) -> Result<BookLookup, BooksError> {
        if let Some(book) = self.http.cache().find_fresh(id) {
            info!(id, "Book found in cache");
            return Ok(BookLookup {
                book,
                origin: LookupOrigin::FreshCache,
                warnings: Vec::new(),
            });
        }

        let url = self.http.item_url(id);
        match self.http.fetch(Method::GET, &url, FetchOptions::new()).await {
            Ok(response) => match response.status {
                StatusCode::OK => Ok(BookLookup {
                    book: response.json()?,
                    origin: LookupOrigin::Live,
                    warnings: Vec::new(),
                }),
                StatusCode::NOT_FOUND => Err(BooksError::NotFound(id)),
                _ => Err(api_error(&response)),
            },
            Err(e) => match self.http.cache().find_any(id) {
                Some(cached) => Ok(BookLookup {
                    book: cached.data,
                    origin: LookupOrigin::StaleCache,
                    warnings: vec![format!("Connection error: {}", e), "Showing cached data".to_string()],
                }),
                None => Err(e.into()),
            },
        }
    }

    /// Creates a book; the API answers 201 with the stored record
    pub async fn create_book(&self, book: &NewBook) -> Result<Book, BooksError> {
        let url = self.http.collection_url().to_string();
        let options = FetchOptions::new().body(serde_json::to_value(book)?);
        let response = self.http.fetch(Method::POST, &url, options).await?;

        match response.status {
            StatusCode::CREATED => Ok(response.json()?),
            _ => Err(api_error(&response)),
        }
    }

    /// Updates the given fields of a book
    pub async fn update_book(&self, id: u64, update: &BookUpdate) -> Result<Book, BooksError> {
        let url = self.http.item_url(id);
        let options = FetchOptions::new().body(serde_json::to_value(update)?);
        let response = self.http.fetch(Method::PUT, &url, options).await?;

        match response.status {
            StatusCode::OK => Ok(response.json()?),
            StatusCode::NOT_FOUND => Err(BooksError::NotFound(id)),
            _ => Err(api_error(&response)),
        }
    }

    /// Deletes a book, returning the API's confirmation message
    pub async fn delete_book(&self, id: u64) -> Result<String, BooksError> {
        let url = self.http.item_url(id);
        let response = self.http.fetch(Method::DELETE, &url, FetchOptions::new()).await?;

        match response.status {
            StatusCode::OK => Ok(response
                .json::<MessageBody>()
                .map(|body| body.message)
                .unwrap_or_else(|_| "Book deleted".to_string())),
            StatusCode::NOT_FOUND => Err(BooksError::NotFound(id)),
            _ => Err(api_error(&response)),
        }
    }
}

fn api_error(response: &ApiResponse) -> BooksError {
    BooksError::Api {
        status: response.status,
        message: response
            .error_message()
            .unwrap_or_else(|| "unknown error".to_string()),
    }
}
