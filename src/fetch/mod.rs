//! Resilient fetch helper for the book API
//!
//! `ResilientClient::fetch` wraps a single HTTP call with the policy the
//! client relies on:
//!
//! 1. a GET on the whole collection first makes one best-effort cache refresh
//! 2. until the API has answered once, its root URL is polled for readiness
//! 3. network errors are retried with capped exponential backoff
//! 4. 4xx/5xx responses are returned as-is and never retried
//!
//! The snapshot cache and readiness flag live in the client itself, so every
//! clone of a client shares them while separate clients stay isolated.

mod readiness;
mod retry;
mod transport;

pub use readiness::ReadinessGate;
pub use retry::RetryPolicy;
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, TransportError};

use reqwest::{Method, StatusCode, Url};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::SnapshotCache;
use crate::config::ClientConfig;
use crate::data::Book;

/// Errors surfaced by `ResilientClient::fetch`
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt failed at the network level
    #[error("request to {url} failed after {attempts} attempt(s): {source}")]
    Transport {
        url: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The URL could not be parsed; nothing was sent
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Per-call timeouts used by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    /// Main request attempts
    pub request: Duration,
    /// Best-effort cache refresh
    pub refresh: Duration,
    /// Startup verification probe
    pub warm_up: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(5),
            refresh: Duration::from_secs(2),
            warm_up: Duration::from_secs(2),
        }
    }
}

/// Optional parts of a fetch
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// JSON body to send
    pub body: Option<serde_json::Value>,
    /// Overrides the client's default attempt budget
    pub max_attempts: Option<u32>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Outcome of `ResilientClient::warm_up`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarmUpReport {
    pub api_ready: bool,
    pub cache_loaded: bool,
}

/// HTTP client context holding the snapshot cache and readiness flag
#[derive(Clone)]
pub struct ResilientClient {
    transport: Arc<dyn Transport>,
    cache: SnapshotCache,
    readiness: ReadinessGate,
    retry: RetryPolicy,
    timeouts: Timeouts,
    root_url: String,
    collection_url: String,
}

impl ResilientClient {
    /// Creates a client that talks to the network through reqwest
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Creates a client with a custom transport
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            cache: SnapshotCache::new(config.cache_ttl),
            readiness: ReadinessGate::new(),
            retry: RetryPolicy::with_max_attempts(config.max_attempts),
            timeouts: Timeouts {
                request: config.request_timeout,
                ..Timeouts::default()
            },
            root_url: config.root_url(),
            collection_url: config.collection_url(),
        }
    }

    /// Replaces the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the readiness gate, e.g. to share one between clients
    pub fn with_readiness(mut self, readiness: ReadinessGate) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn readiness(&self) -> &ReadinessGate {
        &self.readiness
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    pub fn item_url(&self, id: u64) -> String {
        format!("{}/{}", self.collection_url, id)
    }

    /// Sends a request following the cache, readiness and retry policy
    ///
    /// # Returns
    /// * `Ok(ApiResponse)` for any HTTP response, including 4xx/5xx
    /// * `Err(FetchError::Transport)` once every attempt failed at the network level
    pub async fn fetch(
        &self,
        method: Method,
        url: &str,
        options: FetchOptions,
    ) -> Result<ApiResponse, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if method == Method::GET && is_collection_url(&parsed) {
            self.refresh_cache().await;
        }

        self.readiness
            .wait(self.transport.as_ref(), &self.root_url)
            .await;

        let policy = match options.max_attempts {
            Some(max_attempts) => RetryPolicy {
                max_attempts,
                ..self.retry.clone()
            },
            None => self.retry.clone(),
        };
        let max_attempts = policy.effective_attempts();

        let mut attempt = 0;
        loop {
            attempt += 1;
            info!(attempt, max_attempts, %method, url, "Sending request");

            let request = ApiRequest {
                method: method.clone(),
                url: url.to_string(),
                body: options.body.clone(),
            };
            match self.transport.send(request, self.timeouts.request).await {
                Ok(response) => {
                    info!(status = response.status.as_u16(), url, "Response received");
                    if response.is_error() {
                        warn!(status = response.status.as_u16(), body = %response.body, "API returned an error status");
                    }
                    return Ok(response);
                }
                Err(source) => {
                    error!(attempt, max_attempts, url, error = %source, "Request failed");
                    if attempt >= max_attempts {
                        return Err(FetchError::Transport {
                            url: url.to_string(),
                            attempts: attempt,
                            source,
                        });
                    }
                    let delay = policy.delay_for_retry(attempt - 1);
                    debug!(?delay, "Backing off before retry");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Makes one attempt to replace the snapshot with the live collection
    ///
    /// Failures and non-200 answers are logged and leave the cache untouched.
    pub async fn refresh_cache(&self) -> bool {
        let response = match self
            .transport
            .send(ApiRequest::get(&self.collection_url), self.timeouts.refresh)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Cache refresh skipped");
                return false;
            }
        };

        if response.status != StatusCode::OK {
            debug!(status = response.status.as_u16(), "Cache refresh got a non-200 answer");
            return false;
        }

        match response.json::<Vec<Book>>() {
            Ok(books) => {
                let count = books.len();
                self.cache.replace(books);
                info!(books = count, "Book cache refreshed");
                true
            }
            Err(e) => {
                warn!(error = %e, "Cache refresh got an unreadable body");
                false
            }
        }
    }

    /// Verifies the API once and preloads the cache
    pub async fn warm_up(&self) -> WarmUpReport {
        let api_ready = match self
            .transport
            .send(ApiRequest::get(&self.root_url), self.timeouts.warm_up)
            .await
        {
            Ok(_) => {
                self.readiness.mark_ready();
                info!(url = %self.root_url, "API verified and answering");
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not verify the API, continuing anyway");
                false
            }
        };

        let cache_loaded = self.refresh_cache().await;
        WarmUpReport {
            api_ready,
            cache_loaded,
        }
    }
}

/// True when the URL addresses the whole collection rather than one item
pub fn is_collection_url(url: &Url) -> bool {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|last| last == "books")
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for exercising the fetch policy without a network

    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};

    type Outcome = Result<ApiResponse, TransportError>;

    /// Replays queued outcomes per (method, url); unknown routes refuse the connection
    #[derive(Default)]
    pub struct ScriptedTransport {
        queued: Mutex<HashMap<(Method, String), VecDeque<Outcome>>>,
        always: Mutex<HashMap<(Method, String), Outcome>>,
        calls: Mutex<Vec<(Method, String)>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Queues one outcome for the route, consumed before any `always` outcome
        pub fn push(&self, method: Method, url: &str, outcome: Outcome) {
            self.queued
                .lock()
                .entry((method, url.to_string()))
                .or_default()
                .push_back(outcome);
        }

        /// Answers the route with `outcome` whenever the queue is empty
        pub fn always(&self, method: Method, url: &str, outcome: Outcome) {
            self.always.lock().insert((method, url.to_string()), outcome);
        }

        pub fn calls(&self) -> Vec<(Method, String)> {
            self.calls.lock().clone()
        }

        pub fn count(&self, method: &Method, url: &str) -> usize {
            self.calls
                .lock()
                .iter()
                .filter(|(m, u)| m == method && u == url)
                .count()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: ApiRequest, _timeout: Duration) -> Result<ApiResponse, TransportError> {
            let key = (request.method.clone(), request.url.clone());
            self.calls.lock().push(key.clone());

            if let Some(outcome) = self.queued.lock().get_mut(&key).and_then(|q| q.pop_front()) {
                return outcome;
            }
            self.always
                .lock()
                .get(&key)
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Connect("connection refused".to_string())))
        }
    }

    pub fn refused() -> Outcome {
        Err(TransportError::Connect("connection refused".to_string()))
    }

    pub fn ok_json(status: StatusCode, body: serde_json::Value) -> Outcome {
        Ok(ApiResponse::new(status, body.to_string()))
    }

    pub fn test_config() -> ClientConfig {
        ClientConfig {
            api_url: "http://books.test/api".to_string(),
            ..ClientConfig::default()
        }
    }
}
