//! One-shot readiness flag for the upstream API

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::transport::{ApiRequest, Transport};

/// Remembers whether the API has answered at least once
///
/// Clones share the same flag. Once set the flag is never cleared.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    ready: Arc<AtomicBool>,
    /// Number of probes before giving up
    pub probe_attempts: u32,
    /// Sleep after a failed probe
    pub probe_interval: Duration,
    /// Per-probe timeout
    pub probe_timeout: Duration,
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self {
            ready: Arc::new(AtomicBool::new(false)),
            probe_attempts: 10,
            probe_interval: Duration::from_millis(500),
            probe_timeout: Duration::from_millis(500),
        }
    }
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unset gate with a custom probe budget
    pub fn with_probes(probe_attempts: u32, probe_interval: Duration, probe_timeout: Duration) -> Self {
        Self {
            probe_attempts,
            probe_interval,
            probe_timeout,
            ..Self::default()
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Polls `root_url` until it answers or the probe budget is spent
    ///
    /// Any HTTP response counts, whatever its status. Returns whether the API
    /// answered; callers continue either way.
    pub async fn wait(&self, transport: &dyn Transport, root_url: &str) -> bool {
        if self.is_ready() {
            return true;
        }

        warn!(url = %root_url, "Waiting for the API to become ready");
        for _ in 0..self.probe_attempts {
            match transport.send(ApiRequest::get(root_url), self.probe_timeout).await {
                Ok(_) => {
                    self.mark_ready();
                    info!(url = %root_url, "API detected and ready");
                    return true;
                }
                Err(_) => tokio::time::sleep(self.probe_interval).await,
            }
        }

        warn!(
            url = %root_url,
            attempts = self.probe_attempts,
            "API did not answer readiness probes, continuing anyway"
        );
        false
    }
}
