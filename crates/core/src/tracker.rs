//! The trigger/poll contract shared by the Jenkins and CodePipeline adapters.

use crate::request::BuildRequest;
use crate::state::{Backend, BuildState, Outcome};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// A backend that can start a build and report on it.
///
/// Implementations translate backend vocabulary into [`BuildState`]; the
/// waiting between observations is done by [`track`].
#[async_trait]
pub trait BuildTracker: Send + Sync {
    /// Backend-specific cursor for one triggered build.
    type Handle: Send + Sync;

    /// Which backend this is.
    fn backend(&self) -> Backend;

    /// Check connectivity and credentials before anything is triggered.
    ///
    /// Interactive recovery (such as an MFA prompt) belongs here so that it
    /// never runs while another backend is polling.
    async fn prepare(&mut self) -> Result<()>;

    /// Start the build and return a handle to poll it with.
    async fn trigger(&self, request: &BuildRequest) -> Result<Self::Handle>;

    /// Make one observation. May advance the handle (queue item to build,
    /// recent executions to a matched execution).
    async fn poll(&self, handle: &mut Self::Handle) -> Result<BuildState>;

    /// How long to wait before the next observation of this handle.
    fn poll_interval(&self, handle: &Self::Handle) -> Duration;
}

/// Poll until the build reaches a terminal state.
///
/// The first observation happens immediately, then one every
/// [`BuildTracker::poll_interval`]. There is no retry limit and no backoff.
///
/// # Errors
///
/// Returns the first error a poll reports, or [`Error::BuildUnsuccessful`]
/// when the build ends in anything other than success.
#[instrument(name = "track", skip_all, fields(backend = %tracker.backend()))]
pub async fn track<T>(tracker: &T, handle: &mut T::Handle) -> Result<Outcome>
where
    T: BuildTracker + ?Sized,
{
    let mut polls: u64 = 0;
    loop {
        let state = tracker.poll(handle).await?;
        polls += 1;

        if let Some(outcome) = state.outcome() {
            debug!(%state, polls, "Build reached terminal state");
            if outcome.is_success() {
                return Ok(outcome);
            }
            return Err(Error::BuildUnsuccessful {
                backend: tracker.backend(),
                outcome,
            });
        }

        let interval = tracker.poll_interval(handle);
        debug!(%state, ?interval, "Build not finished, waiting");
        tokio::time::sleep(interval).await;
    }
}
