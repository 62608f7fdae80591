//! Background refresh of the book listing
//!
//! Lists the books on a fixed interval in the background and sends each
//! result to the caller over a tokio channel. Used by the `watch` command.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use crate::data::{BookListing, BooksClient};

/// Messages sent from the background refresh task
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// A refresh cycle is starting
    RefreshStarted,
    /// A listing was obtained (possibly degraded, see its warnings)
    Listing(BookListing),
    /// A refresh cycle finished
    RefreshCompleted,
}

/// Configuration for the refresh loop
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between refresh cycles
    pub interval: Duration,
    /// Stop after this many cycles; `None` runs until shutdown
    pub cycles: Option<u32>,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            cycles: None,
        }
    }
}

/// Handle for controlling the background refresh task
pub struct RefreshHandle {
    /// Channel for receiving refresh messages; closes when the task ends
    pub receiver: mpsc::Receiver<RefreshMessage>,
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Spawns the refresh task
    ///
    /// The first cycle runs immediately, later cycles every `config.interval`.
    pub fn spawn(books: BooksClient, config: RefreshConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut completed = 0u32;

            loop {
                if config.cycles.is_some_and(|cycles| completed >= cycles) {
                    break;
                }

                tokio::select! {
                    _ = interval.tick() => {
                        if msg_tx.send(RefreshMessage::RefreshStarted).await.is_err() {
                            break;
                        }
                        let listing = books.list_books().await;
                        debug!(books = listing.books.len(), origin = ?listing.origin, "Refresh cycle finished");
                        if msg_tx.send(RefreshMessage::Listing(listing)).await.is_err() {
                            break;
                        }
                        let _ = msg_tx.send(RefreshMessage::RefreshCompleted).await;
                        completed += 1;
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Waits for the next message; `None` once the task has stopped
    pub async fn recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.recv().await
    }

    /// Stops the refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
