//! shelfwatch - resilient client for a book catalogue API
//!
//! Lists, shows and edits books through an HTTP API, caching the collection
//! in memory and retrying transient failures. Also runs the API itself.

use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info};

use shelfwatch::cli::{Cli, Command};
use shelfwatch::config::ClientConfig;
use shelfwatch::data::{BookListing, BooksClient};
use shelfwatch::fetch::ResilientClient;
use shelfwatch::refresh::{RefreshConfig, RefreshHandle, RefreshMessage};
use shelfwatch::render;
use shelfwatch::server::{self, BookStore};
use shelfwatch::telemetry;

type AppResult<T> = Result<T, Box<dyn Error>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration, applying the --api-url override
fn load_config(cli: &Cli) -> AppResult<ClientConfig> {
    let config = ClientConfig::from_env()?;
    match &cli.api_url {
        Some(url) => Ok(config.with_api_url(url)?),
        None => Ok(config),
    }
}

fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
}

fn print_listing(listing: &BookListing, json: bool) -> AppResult<()> {
    print_warnings(&listing.warnings);
    if json {
        return print_json(&listing.books);
    }
    println!("{}", render::books_table(&listing.books));
    println!("({} books, {})", listing.books.len(), render::listing_source(listing, Utc::now()));
    Ok(())
}

async fn run(cli: Cli) -> AppResult<()> {
    match cli.command.clone() {
        Command::Serve { bind } => {
            let listener = TcpListener::bind(bind).await?;
            tokio::select! {
                result = server::serve(listener, BookStore::seeded()) => result?,
                _ = tokio::signal::ctrl_c() => info!("Shutting down"),
            }
            Ok(())
        }
        Command::Demo { bind } => run_demo(bind, cli.json).await,
        command => {
            let config = load_config(&cli)?;
            let books = BooksClient::new(ResilientClient::new(&config));
            run_client(command, &books, cli.json).await
        }
    }
}

async fn run_client(command: Command, books: &BooksClient, json: bool) -> AppResult<()> {
    match command {
        Command::List => {
            let listing = books.list_books().await;
            print_listing(&listing, json)
        }
        Command::Show { id } => {
            let lookup = books.get_book(id).await?;
            print_warnings(&lookup.warnings);
            if json {
                return print_json(&lookup.book);
            }
            println!("{}", render::book_details(&lookup.book));
            Ok(())
        }
        Command::Add(args) => {
            let book = books.create_book(&args.to_new_book()?).await?;
            if json {
                return print_json(&book);
            }
            println!("Book added with id {}", book.id);
            Ok(())
        }
        Command::Edit(args) => {
            let book = books.update_book(args.id, &args.to_update()?).await?;
            if json {
                return print_json(&book);
            }
            println!("Book updated:\n{}", render::book_details(&book));
            Ok(())
        }
        Command::Remove { id } => {
            let message = books.delete_book(id).await?;
            println!("{}", message);
            Ok(())
        }
        Command::Watch { interval, count } => {
            let config = RefreshConfig {
                interval: Duration::from_secs(interval),
                cycles: count,
            };
            let mut handle = RefreshHandle::spawn(books.clone(), config);
            loop {
                tokio::select! {
                    message = handle.recv() => match message {
                        Some(RefreshMessage::Listing(listing)) => print_listing(&listing, json)?,
                        Some(_) => {}
                        None => break,
                    },
                    _ = tokio::signal::ctrl_c() => {
                        handle.shutdown().await;
                        break;
                    }
                }
            }
            Ok(())
        }
        Command::Serve { .. } | Command::Demo { .. } => Ok(()),
    }
}

/// Runs the API on a background task and lists the books through the client
async fn run_demo(bind: std::net::SocketAddr, json: bool) -> AppResult<()> {
    eprintln!("Running the API and the client in one process is meant for development only.");
    eprintln!("Use `shelfwatch serve` and a separate client for anything else.");

    let (addr, server_task) = server::spawn(bind, BookStore::seeded()).await?;
    let config = ClientConfig::default().with_api_url(&format!("http://{}/api", addr))?;
    let books = BooksClient::new(ResilientClient::new(&config));

    let report = books.http().warm_up().await;
    info!(api_ready = report.api_ready, cache_loaded = report.cache_loaded, "Demo client warmed up");

    let listing = books.list_books().await;
    print_listing(&listing, json)?;

    server_task.abort();
    Ok(())
}
