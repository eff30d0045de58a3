//! Core types for shipwatch.
//!
//! This crate holds everything the two backend adapters share:
//!
//! - [`Error`] / [`Result`]: the single diagnostic error type for a run
//! - [`BuildState`] / [`Outcome`]: the backend-neutral state vocabulary
//! - [`BuildTracker`] and [`track`]: the trigger/poll contract and the
//!   fixed-interval loop that drives it to a terminal state
//! - [`Catalog`]: the repository-to-job mapping loaded from TOML

pub mod catalog;
pub mod error;
pub mod paths;
pub mod request;
pub mod state;
pub mod tracker;

pub use catalog::{Catalog, Repository};
pub use error::{Error, Result};
pub use request::{BuildRequest, TrackPlan, TrackTarget};
pub use state::{Backend, BuildState, Outcome};
pub use tracker::{BuildTracker, track};
