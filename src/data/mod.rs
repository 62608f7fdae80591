//! Core data models for the book catalogue
//!
//! This module contains the record types exchanged with the book API and the
//! typed client that applies the cache fallback policy on top of the
//! resilient fetch helper.

pub mod books;

pub use books::{BookListing, BookLookup, BooksClient, BooksError, ListingOrigin, LookupOrigin};

use serde::{Deserialize, Serialize};

/// A single book record as served by the catalogue API
///
/// Deserialization also accepts the Spanish field names used by the first
/// version of the API (`titulo`, `autor`, `año`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier assigned by the API
    pub id: u64,
    /// Title of the book
    #[serde(alias = "titulo")]
    pub title: String,
    /// Author's name
    #[serde(alias = "autor")]
    pub author: String,
    /// Publication year
    #[serde(alias = "año")]
    pub year: i32,
}

/// Payload for creating a book; the API assigns the id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    #[serde(alias = "titulo")]
    pub title: String,
    #[serde(alias = "autor")]
    pub author: String,
    #[serde(alias = "año")]
    pub year: i32,
}

/// Partial update of a book; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    #[serde(default, alias = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, alias = "autor", skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, alias = "año", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl BookUpdate {
    /// Returns true when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.year.is_none()
    }

    /// Applies the present fields to `book`
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(title) = &self.title {
            book.title = title.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(year) = self.year {
            book.year = year;
        }
    }
}

/// Error body returned by the API on 4xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Informational body returned by the API, e.g. after a delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(alias = "mensaje")]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_serializes_with_english_fields() {
        let book = Book {
            id: 1,
            title: "Rayuela".to_string(),
            author: "Julio Cortázar".to_string(),
            year: 1963,
        };

        let json = serde_json::to_value(&book).expect("Failed to serialize Book");

        assert_eq!(json["id"], 1);
        assert_eq!(json["title"], "Rayuela");
        assert_eq!(json["author"], "Julio Cortázar");
        assert_eq!(json["year"], 1963);
    }

    #[test]
    fn test_book_accepts_legacy_field_names() {
        let json = r#"{"id": 2, "titulo": "Cien años de soledad", "autor": "Gabriel García Márquez", "año": 1967}"#;

        let book: Book = serde_json::from_str(json).expect("Failed to deserialize legacy Book");

        assert_eq!(book.id, 2);
        assert_eq!(book.title, "Cien años de soledad");
        assert_eq!(book.year, 1967);
    }

    #[test]
    fn test_book_update_applies_only_present_fields() {
        let mut book = Book {
            id: 3,
            title: "Old".to_string(),
            author: "Someone".to_string(),
            year: 1900,
        };
        let update = BookUpdate {
            title: Some("New".to_string()),
            ..Default::default()
        };

        update.apply_to(&mut book);

        assert_eq!(book.title, "New");
        assert_eq!(book.author, "Someone");
        assert_eq!(book.year, 1900);
    }

    #[test]
    fn test_book_update_skips_absent_fields_when_serialized() {
        let update = BookUpdate {
            year: Some(2001),
            ..Default::default()
        };

        let json = serde_json::to_string(&update).unwrap();

        assert_eq!(json, r#"{"year":2001}"#);
        assert!(!update.is_empty());
        assert!(BookUpdate::default().is_empty());
    }
}
