//! Plain-text rendering of books for the terminal

use chrono::{DateTime, Utc};

use crate::data::{Book, BookListing, ListingOrigin};

const ID_WIDTH: usize = 4;
const YEAR_WIDTH: usize = 6;

/// Renders books as an aligned table with a header row
pub fn books_table(books: &[Book]) -> String {
    if books.is_empty() {
        return "No books found.".to_string();
    }

    let title_width = books
        .iter()
        .map(|b| b.title.chars().count())
        .max()
        .unwrap_or(0)
        .max("TITLE".len());

    let mut out = format!(
        "{:<id$}  {:<title$}  {:<year$}  {}\n",
        "ID",
        "TITLE",
        "YEAR",
        "AUTHOR",
        id = ID_WIDTH,
        title = title_width,
        year = YEAR_WIDTH
    );
    for book in books {
        out.push_str(&format!(
            "{:<id$}  {:<title$}  {:<year$}  {}\n",
            book.id,
            book.title,
            book.year,
            book.author,
            id = ID_WIDTH,
            title = title_width,
            year = YEAR_WIDTH
        ));
    }
    out.trim_end().to_string()
}

/// Renders one book as labelled lines
pub fn book_details(book: &Book) -> String {
    format!(
        "ID:     {}\nTitle:  {}\nAuthor: {}\nYear:   {}",
        book.id, book.title, book.author, book.year
    )
}

/// Describes where a listing came from, e.g. "cached 12s ago"
pub fn listing_source(listing: &BookListing, now: DateTime<Utc>) -> String {
    let age = listing
        .cached_at
        .map(|at| format!("{}s ago", (now - at).num_seconds().max(0)));
    match (listing.origin, age) {
        (ListingOrigin::Live, _) => "live".to_string(),
        (ListingOrigin::FreshCache, Some(age)) => format!("cached {}", age),
        (ListingOrigin::StaleCache, Some(age)) => format!("stale cache from {}", age),
        (ListingOrigin::FreshCache | ListingOrigin::StaleCache, None) => "cache".to_string(),
        (ListingOrigin::Empty, _) => "unavailable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn book(id: u64, title: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: "Author".to_string(),
            year: 1999,
        }
    }

    #[test]
    fn test_empty_table_message() {
        assert_eq!(books_table(&[]), "No books found.");
    }

    #[test]
    fn test_table_aligns_columns_to_longest_title() {
        let table = books_table(&[book(1, "Short"), book(22, "A much longer title")]);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID    TITLE"));
        let year_col = lines[1].find("1999").unwrap();
        assert_eq!(lines[2].find("1999").unwrap(), year_col);
    }

    #[test]
    fn test_book_details() {
        let details = book_details(&book(7, "Rayuela"));
        assert!(details.contains("ID:     7"));
        assert!(details.contains("Title:  Rayuela"));
    }

    #[test]
    fn test_listing_source_descriptions() {
        let now = Utc::now();
        let mut listing = BookListing {
            books: Vec::new(),
            origin: ListingOrigin::FreshCache,
            cached_at: Some(now - Duration::seconds(12)),
            warnings: Vec::new(),
        };
        assert_eq!(listing_source(&listing, now), "cached 12s ago");

        listing.origin = ListingOrigin::StaleCache;
        assert_eq!(listing_source(&listing, now), "stale cache from 12s ago");

        listing.origin = ListingOrigin::Empty;
        listing.cached_at = None;
        assert_eq!(listing_source(&listing, now), "unavailable");
    }
}
