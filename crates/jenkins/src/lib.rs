//! Jenkins adapter for shipwatch.
//!
//! Triggers a parameterized job build and follows it through the two phases
//! Jenkins exposes: the queue item (waiting for an executor, or cancelled)
//! and the build itself (running until it has a result).
//!
//! ```text
//! POST /job/{job}/buildWithParameters  ──► Location: /queue/item/{n}/
//! GET  /queue/item/{n}/api/json        ──► executable.number (every 1s)
//! GET  /job/{job}/{number}/api/json    ──► result (every 2s)
//! ```

pub mod client;
pub mod config;
pub mod model;
pub mod tracker;

pub use client::JenkinsClient;
pub use config::JenkinsConfig;
pub use model::{BuildStatus, BuildSummary, QueueItem, QueueStatus};
pub use tracker::{JenkinsHandle, JenkinsTracker};
