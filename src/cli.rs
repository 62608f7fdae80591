//! Command-line interface parsing for shelfwatch
//!
//! This module handles parsing of CLI arguments using clap and turns the
//! edit/add flags into the request payloads the books client sends.

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use thiserror::Error;

use crate::data::{BookUpdate, NewBook};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// `edit` was called without any field to change
    #[error("Nothing to update: pass at least one of --title, --author or --year")]
    EmptyUpdate,

    /// A text field was blank
    #[error("Invalid {0}: value must not be empty")]
    BlankField(&'static str),
}

/// shelfwatch - browse and edit a book catalogue API, with caching and retries
#[derive(Parser, Debug)]
#[command(name = "shelfwatch")]
#[command(about = "Resilient client and demo server for a book catalogue API")]
#[command(version)]
pub struct Cli {
    /// Base URL of the API (overrides SHELFWATCH_API_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Print results as JSON instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    /// Log requests, retries and cache decisions to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List all books, falling back to cached data when the API is down
    List,
    /// Show one book
    Show {
        /// Book id
        id: u64,
    },
    /// Add a new book
    Add(AddArgs),
    /// Change fields of an existing book
    Edit(EditArgs),
    /// Delete a book
    Remove {
        /// Book id
        id: u64,
    },
    /// Keep listing books on an interval
    Watch {
        /// Seconds between refreshes
        #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
        interval: u64,
        /// Stop after this many refreshes
        #[arg(long)]
        count: Option<u32>,
    },
    /// Run the book API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:5000")]
        bind: SocketAddr,
    },
    /// Run the API and the client in one process, then list the books
    Demo {
        /// Address the embedded API listens on
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: SocketAddr,
    },
}

/// Fields of a new book
#[derive(Args, Debug, Clone, PartialEq)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub author: String,
    #[arg(long, allow_negative_numbers = true)]
    pub year: i32,
}

/// Fields to change on an existing book
#[derive(Args, Debug, Clone, PartialEq)]
pub struct EditArgs {
    /// Book id
    pub id: u64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub year: Option<i32>,
}

fn non_blank(value: &str, field: &'static str) -> Result<String, CliError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CliError::BlankField(field));
    }
    Ok(trimmed.to_string())
}

impl AddArgs {
    /// Validates the arguments into a create payload
    pub fn to_new_book(&self) -> Result<NewBook, CliError> {
        Ok(NewBook {
            title: non_blank(&self.title, "title")?,
            author: non_blank(&self.author, "author")?,
            year: self.year,
        })
    }
}

impl EditArgs {
    /// Validates the arguments into an update payload
    pub fn to_update(&self) -> Result<BookUpdate, CliError> {
        let update = BookUpdate {
            title: self.title.as_deref().map(|t| non_blank(t, "title")).transpose()?,
            author: self.author.as_deref().map(|a| non_blank(a, "author")).transpose()?,
            year: self.year,
        };
        if update.is_empty() {
            return Err(CliError::EmptyUpdate);
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::parse_from(["shelfwatch", "list"]);
        assert_eq!(cli.command, Command::List);
        assert!(!cli.json);
        assert!(cli.api_url.is_none());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["shelfwatch", "show", "3", "--json", "--api-url", "http://h:1/api"]);
        assert_eq!(cli.command, Command::Show { id: 3 });
        assert!(cli.json);
        assert_eq!(cli.api_url.as_deref(), Some("http://h:1/api"));
    }

    #[test]
    fn test_cli_parse_add() {
        let cli = Cli::parse_from([
            "shelfwatch", "add", "--title", "Ficciones", "--author", "Jorge Luis Borges", "--year", "1944",
        ]);
        let Command::Add(args) = cli.command else {
            panic!("Expected add command");
        };
        let book = args.to_new_book().unwrap();
        assert_eq!(book.title, "Ficciones");
        assert_eq!(book.year, 1944);
    }

    #[test]
    fn test_cli_add_rejects_non_numeric_year() {
        let result = Cli::try_parse_from([
            "shelfwatch", "add", "--title", "T", "--author", "A", "--year", "soon",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_add_rejects_blank_title() {
        let args = AddArgs {
            title: "   ".to_string(),
            author: "A".to_string(),
            year: 2000,
        };
        let err = args.to_new_book().unwrap_err();
        assert!(err.to_string().contains("title"));
    }

    #[test]
    fn test_edit_requires_a_field() {
        let cli = Cli::parse_from(["shelfwatch", "edit", "2"]);
        let Command::Edit(args) = cli.command else {
            panic!("Expected edit command");
        };
        assert!(matches!(args.to_update(), Err(CliError::EmptyUpdate)));
    }

    #[test]
    fn test_edit_builds_partial_update() {
        let cli = Cli::parse_from(["shelfwatch", "edit", "2", "--year", "1968"]);
        let Command::Edit(args) = cli.command else {
            panic!("Expected edit command");
        };
        let update = args.to_update().unwrap();
        assert_eq!(update.year, Some(1968));
        assert!(update.title.is_none());
    }

    #[test]
    fn test_watch_defaults_and_rejects_zero_interval() {
        let cli = Cli::parse_from(["shelfwatch", "watch"]);
        assert_eq!(
            cli.command,
            Command::Watch {
                interval: 10,
                count: None
            }
        );
        assert!(Cli::try_parse_from(["shelfwatch", "watch", "--interval", "0"]).is_err());
    }

    #[test]
    fn test_serve_default_bind() {
        let cli = Cli::parse_from(["shelfwatch", "serve"]);
        assert_eq!(
            cli.command,
            Command::Serve {
                bind: "0.0.0.0:5000".parse().unwrap()
            }
        );
    }

    #[test]
    fn test_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["shelfwatch"]).is_err());
    }
}
