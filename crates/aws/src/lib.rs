//! AWS CodePipeline adapter for shipwatch.
//!
//! A Jenkins deploy for some repositories ends by handing off to a
//! CodePipeline. This crate finds the execution that deploy started and
//! follows its actions until the execution finishes:
//!
//! - [`correlate`](correlate::correlate) picks the execution, refusing to
//!   guess when an older or a second execution could be the one
//! - [`AwsTracker`] polls actions and maps their status onto build states
//! - [`session`] validates the STS session and refreshes it with an MFA code
//!   when it has expired

pub mod api;
pub mod config;
pub mod correlate;
pub mod sdk;
pub mod session;
pub mod tracker;

pub use api::{ActionExecution, ActionStatus, ExecutionStatus, ExecutionSummary, PipelineApi};
pub use config::AwsConfig;
pub use sdk::{SdkPipelineApi, SdkSessionApi};
pub use session::{
    AwsCliCredentialStore, CredentialStore, MfaPrompt, SessionApi, SessionCredentials,
    SessionGuard, SessionStatus, ensure_session,
};
pub use tracker::{AwsHandle, AwsTracker};

use shipwatch_events::Step;

/// Build a tracker backed by the AWS SDK, with MFA refresh through the
/// `aws` CLI and `prompt`.
pub async fn connect(config: AwsConfig, prompt: Box<dyn MfaPrompt>, step: Step) -> AwsTracker {
    let pipelines = SdkPipelineApi::connect(config.clone()).await;
    let session = SessionGuard {
        api: Box::new(SdkSessionApi::connect(&config).await),
        store: Box::new(AwsCliCredentialStore::default()),
        prompt,
    };
    AwsTracker::new(Box::new(pipelines), config, step).with_session(session)
}
