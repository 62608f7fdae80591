//! In-memory book store backing the API

use parking_lot::Mutex;
use std::sync::Arc;

use crate::data::{Book, BookUpdate, NewBook};

#[derive(Debug)]
struct Inner {
    books: Vec<Book>,
    next_id: u64,
}

/// Thread-safe list of books with sequential ids
///
/// Clones share the same storage.
#[derive(Debug, Clone)]
pub struct BookStore {
    inner: Arc<Mutex<Inner>>,
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BookStore {
    /// Creates an empty store; ids start at 1
    pub fn new() -> Self {
        Self::with_books(Vec::new())
    }

    /// Creates a store holding `books`; new ids continue after the highest one
    pub fn with_books(books: Vec<Book>) -> Self {
        let next_id = books.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        Self {
            inner: Arc::new(Mutex::new(Inner { books, next_id })),
        }
    }

    /// Creates a store with the three demo books
    pub fn seeded() -> Self {
        Self::with_books(vec![
            Book {
                id: 1,
                title: "Don Quijote".to_string(),
                author: "Miguel de Cervantes".to_string(),
                year: 1605,
            },
            Book {
                id: 2,
                title: "Cien años de soledad".to_string(),
                author: "Gabriel García Márquez".to_string(),
                year: 1967,
            },
            Book {
                id: 3,
                title: "Rayuela".to_string(),
                author: "Julio Cortázar".to_string(),
                year: 1963,
            },
        ])
    }

    pub fn list(&self) -> Vec<Book> {
        self.inner.lock().books.clone()
    }

    pub fn get(&self, id: u64) -> Option<Book> {
        self.inner.lock().books.iter().find(|b| b.id == id).cloned()
    }

    pub fn insert(&self, new_book: NewBook) -> Book {
        let mut inner = self.inner.lock();
        let book = Book {
            id: inner.next_id,
            title: new_book.title,
            author: new_book.author,
            year: new_book.year,
        };
        inner.books.push(book.clone());
        inner.next_id += 1;
        book
    }

    pub fn update(&self, id: u64, update: &BookUpdate) -> Option<Book> {
        let mut inner = self.inner.lock();
        let book = inner.books.iter_mut().find(|b| b.id == id)?;
        update.apply_to(book);
        Some(book.clone())
    }

    /// Removes a book; returns false if it did not exist
    pub fn remove(&self, id: u64) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.books.len();
        inner.books.retain(|b| b.id != id);
        inner.books.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_store_continues_ids_after_seed() {
        let store = BookStore::seeded();

        let book = store.insert(NewBook {
            title: "Ficciones".to_string(),
            author: "Jorge Luis Borges".to_string(),
            year: 1944,
        });

        assert_eq!(book.id, 4);
        assert_eq!(store.list().len(), 4);
    }

    #[test]
    fn test_ids_are_not_reused_after_remove() {
        let store = BookStore::new();
        let first = store.insert(NewBook {
            title: "A".to_string(),
            author: "X".to_string(),
            year: 1,
        });
        assert!(store.remove(first.id));
        assert!(!store.remove(first.id));

        let second = store.insert(NewBook {
            title: "B".to_string(),
            author: "Y".to_string(),
            year: 2,
        });

        assert_eq!(second.id, 2);
    }

    #[test]
    fn test_update_missing_book_returns_none() {
        let store = BookStore::seeded();

        assert!(store.update(99, &BookUpdate::default()).is_none());
        let updated = store
            .update(
                1,
                &BookUpdate {
                    year: Some(1615),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.year, 1615);
        assert_eq!(store.get(1).unwrap().year, 1615);
    }
}
