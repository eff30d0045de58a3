//! AWS SDK implementations of [`PipelineApi`] and [`SessionApi`].

use crate::api::{ActionExecution, ActionStatus, ExecutionStatus, ExecutionSummary, PipelineApi};
use crate::config::AwsConfig;
use crate::session::{SessionApi, SessionCredentials};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_codepipeline::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_codepipeline::primitives::DateTime as SmithyDateTime;
use aws_sdk_codepipeline::types::ActionExecutionFilter;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use shipwatch_core::{Error, Result};
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Load SDK configuration for `profile` (or the default chain).
pub async fn load_sdk_config(config: &AwsConfig, profile: Option<&str>) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    loader.load().await
}

/// Turn an SDK error into a shipwatch error.
///
/// Connection failures become [`Error::AwsUnreachable`]; service errors keep
/// their code so expired tokens can be recognised.
fn sdk_error<E, R>(operation: &'static str, err: &SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    if let SdkError::DispatchFailure(failure) = err
        && (failure.is_io() || failure.is_timeout())
    {
        return Error::AwsUnreachable {
            operation,
            message: DisplayErrorContext(err).to_string(),
        };
    }
    if let SdkError::TimeoutError(_) = err {
        return Error::AwsUnreachable {
            operation,
            message: DisplayErrorContext(err).to_string(),
        };
    }

    let message = err
        .message()
        .map_or_else(|| DisplayErrorContext(err).to_string(), str::to_string);
    Error::aws(operation, err.code(), message)
}

fn to_chrono(time: &SmithyDateTime) -> Option<DateTime<Utc>> {
    time.to_millis().ok().and_then(DateTime::from_timestamp_millis)
}

/// CodePipeline over the AWS SDK.
#[derive(Debug, Clone)]
pub struct SdkPipelineApi {
    client: aws_sdk_codepipeline::Client,
    config: AwsConfig,
    profile: Option<String>,
}

impl SdkPipelineApi {
    /// Create a client from the client profile.
    pub async fn connect(config: AwsConfig) -> Self {
        let profile = config.client_profile().map(str::to_string);
        let sdk = load_sdk_config(&config, profile.as_deref()).await;
        Self {
            client: aws_sdk_codepipeline::Client::new(&sdk),
            config,
            profile,
        }
    }

    /// Profile the current client was built from.
    #[must_use]
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }
}

#[async_trait]
impl PipelineApi for SdkPipelineApi {
    #[instrument(name = "codepipeline_list_executions", skip(self))]
    async fn list_executions(
        &self,
        pipeline: &str,
        max_results: i32,
    ) -> Result<Vec<ExecutionSummary>> {
        let output = self
            .client
            .list_pipeline_executions()
            .pipeline_name(pipeline)
            .max_results(max_results)
            .send()
            .await
            .map_err(|e| sdk_error("ListPipelineExecutions", &e))?;

        Ok(output
            .pipeline_execution_summaries()
            .iter()
            .map(|s| ExecutionSummary {
                execution_id: s.pipeline_execution_id().unwrap_or_default().to_string(),
                status: s
                    .status()
                    .map_or(ExecutionStatus::Unknown(String::new()), |st| {
                        ExecutionStatus::parse(st.as_str())
                    }),
                started_at: s.start_time().and_then(to_chrono),
            })
            .collect())
    }

    async fn list_action_executions(
        &self,
        pipeline: &str,
        execution_id: &str,
    ) -> Result<Vec<ActionExecution>> {
        let filter = ActionExecutionFilter::builder()
            .pipeline_execution_id(execution_id)
            .build();
        let output = self
            .client
            .list_action_executions()
            .pipeline_name(pipeline)
            .filter(filter)
            .send()
            .await
            .map_err(|e| sdk_error("ListActionExecutions", &e))?;

        Ok(output
            .action_execution_details()
            .iter()
            .map(|d| ActionExecution {
                stage_name: d.stage_name().unwrap_or_default().to_string(),
                action_name: d.action_name().unwrap_or_default().to_string(),
                status: d
                    .status()
                    .map_or(ActionStatus::Unknown(String::new()), |st| {
                        ActionStatus::parse(st.as_str())
                    }),
            })
            .collect())
    }

    async fn execution_status(
        &self,
        pipeline: &str,
        execution_id: &str,
    ) -> Result<ExecutionStatus> {
        let output = self
            .client
            .get_pipeline_execution()
            .pipeline_name(pipeline)
            .pipeline_execution_id(execution_id)
            .send()
            .await
            .map_err(|e| sdk_error("GetPipelineExecution", &e))?;

        Ok(output
            .pipeline_execution()
            .and_then(|e| e.status())
            .map_or(ExecutionStatus::Unknown(String::new()), |st| {
                ExecutionStatus::parse(st.as_str())
            }))
    }

    async fn reload(&mut self) -> Result<()> {
        self.profile = self.config.client_profile().map(str::to_string);
        debug!(profile = ?self.profile, "Reloading CodePipeline client credentials");
        let sdk = load_sdk_config(&self.config, self.profile.as_deref()).await;
        self.client = aws_sdk_codepipeline::Client::new(&sdk);
        Ok(())
    }
}

/// STS over the AWS SDK.
///
/// Identity checks run with the client profile; `GetSessionToken` runs
/// with the source profile, since the client one is the one that expired.
#[derive(Debug, Clone)]
pub struct SdkSessionApi {
    current: aws_sdk_sts::Client,
    source: aws_sdk_sts::Client,
}

impl SdkSessionApi {
    /// Create clients for the client and source profiles.
    pub async fn connect(config: &AwsConfig) -> Self {
        let current = load_sdk_config(config, config.client_profile()).await;
        let source = match config.source_profile.as_deref() {
            Some(profile) => load_sdk_config(config, Some(profile)).await,
            None => current.clone(),
        };
        Self {
            current: aws_sdk_sts::Client::new(&current),
            source: aws_sdk_sts::Client::new(&source),
        }
    }
}

#[async_trait]
impl SessionApi for SdkSessionApi {
    async fn caller_identity(&self) -> Result<String> {
        let output = self
            .current
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| sdk_error("GetCallerIdentity", &e))?;
        Ok(output.arn().unwrap_or_default().to_string())
    }

    #[instrument(name = "sts_get_session_token", skip(self, token_code))]
    async fn session_token(
        &self,
        mfa_serial: &str,
        token_code: &str,
        duration_secs: i32,
    ) -> Result<SessionCredentials> {
        let output = self
            .source
            .get_session_token()
            .duration_seconds(duration_secs)
            .serial_number(mfa_serial)
            .token_code(token_code)
            .send()
            .await
            .map_err(|e| sdk_error("GetSessionToken", &e))?;

        let credentials = output.credentials().ok_or_else(|| {
            Error::aws("GetSessionToken", None, "response did not include credentials")
        })?;

        Ok(SessionCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: SecretString::from(credentials.secret_access_key().to_string()),
            session_token: SecretString::from(credentials.session_token().to_string()),
            expires_at: to_chrono(credentials.expiration()),
        })
    }
}
