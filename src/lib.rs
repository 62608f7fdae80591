//! shelfwatch library
//!
//! Resilient client for a book catalogue API (snapshot cache, readiness
//! polling, retry with backoff) and the API server it talks to. Exposed as a
//! library for the binary and the integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod fetch;
pub mod refresh;
pub mod render;
pub mod server;
pub mod telemetry;
