//! Scripted fakes for the AWS traits.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;
use shipwatch_aws::{
    ActionExecution, ActionStatus, CredentialStore, ExecutionStatus, ExecutionSummary,
    MfaPrompt, PipelineApi, SessionApi, SessionCredentials,
};
use shipwatch_core::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const PIPELINE: &str = "MailAccounts-pipeline-qa-Pipeline";

pub fn at(base: DateTime<Utc>, offset_secs: i64) -> Option<DateTime<Utc>> {
    Some(base + TimeDelta::seconds(offset_secs))
}

pub fn summary(id: &str, status: ExecutionStatus, started_at: Option<DateTime<Utc>>) -> ExecutionSummary {
    ExecutionSummary {
        execution_id: id.to_string(),
        status,
        started_at,
    }
}

pub fn action(stage: &str, name: &str, status: ActionStatus) -> ActionExecution {
    ActionExecution {
        stage_name: stage.to_string(),
        action_name: name.to_string(),
        status,
    }
}

/// Replays queued responses; the last response of each queue repeats.
#[derive(Default)]
pub struct FakePipelines {
    pub executions: Mutex<VecDeque<Result<Vec<ExecutionSummary>>>>,
    pub actions: Mutex<VecDeque<Vec<ActionExecution>>>,
    pub statuses: Mutex<VecDeque<ExecutionStatus>>,
    pub action_queries: Mutex<Vec<String>>,
    pub reloads: Mutex<u32>,
}

fn next<T: Clone>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    let mut queue = queue.lock().unwrap();
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

fn clone_result<T: Clone>(result: &Result<T>) -> Result<T> {
    match result {
        Ok(v) => Ok(v.clone()),
        Err(Error::CredentialsExpired { code }) => Err(Error::CredentialsExpired { code: code.clone() }),
        Err(e) => Err(Error::aws("ListPipelineExecutions", None, e.to_string())),
    }
}

/// Shares a [`FakePipelines`] with the test after it is boxed into a tracker.
#[derive(Clone, Default)]
pub struct SharedPipelines(pub Arc<FakePipelines>);

#[async_trait]
impl PipelineApi for SharedPipelines {
    async fn list_executions(&self, pipeline: &str, max_results: i32) -> Result<Vec<ExecutionSummary>> {
        assert_eq!(pipeline, PIPELINE);
        assert_eq!(max_results, 5);
        let mut queue = self.0.executions.lock().unwrap();
        let item = if queue.len() > 1 { queue.pop_front() } else { None };
        match item {
            Some(result) => result,
            None => queue.front().map_or(Ok(Vec::new()), clone_result),
        }
    }

    async fn list_action_executions(&self, pipeline: &str, execution_id: &str) -> Result<Vec<ActionExecution>> {
        assert_eq!(pipeline, PIPELINE);
        self.0.action_queries.lock().unwrap().push(execution_id.to_string());
        Ok(next(&self.0.actions).unwrap_or_default())
    }

    async fn execution_status(&self, _pipeline: &str, _execution_id: &str) -> Result<ExecutionStatus> {
        Ok(next(&self.0.statuses).unwrap_or(ExecutionStatus::InProgress))
    }

    async fn reload(&mut self) -> Result<()> {
        *self.0.reloads.lock().unwrap() += 1;
        Ok(())
    }
}

/// STS fake: the identity call answers from a script, token requests are recorded.
#[derive(Default)]
pub struct FakeSession {
    pub identity: Mutex<VecDeque<Result<String>>>,
    pub token_requests: Arc<Mutex<Vec<(String, String, i32)>>>,
    pub fail_token: bool,
}

#[async_trait]
impl SessionApi for FakeSession {
    async fn caller_identity(&self) -> Result<String> {
        self.identity
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("arn:aws:iam::123456789012:user/dev".to_string()))
    }

    async fn session_token(&self, mfa_serial: &str, token_code: &str, duration_secs: i32) -> Result<SessionCredentials> {
        self.token_requests
            .lock()
            .unwrap()
            .push((mfa_serial.to_string(), token_code.to_string(), duration_secs));
        if self.fail_token {
            return Err(Error::aws("GetSessionToken", Some("AccessDenied"), "MultiFactorAuthentication failed with invalid MFA one time pass code"));
        }
        Ok(SessionCredentials {
            access_key_id: "ASIAFAKEACCESSKEY".to_string(),
            secret_access_key: SecretString::from("fake-secret-access-key".to_string()),
            session_token: SecretString::from("fake-session-token".to_string()),
            expires_at: None,
        })
    }
}

/// Records what would have been written to the AWS config.
#[derive(Clone, Default)]
pub struct RecordingStore(pub Arc<Mutex<Vec<(String, String)>>>);

#[async_trait]
impl CredentialStore for RecordingStore {
    async fn store(&self, profile: &str, credentials: &SessionCredentials) -> Result<()> {
        self.0
            .lock()
            .unwrap()
            .push((profile.to_string(), credentials.access_key_id.clone()));
        Ok(())
    }
}

/// Answers every MFA prompt with a fixed code and counts the prompts.
#[derive(Clone, Default)]
pub struct FixedPrompt {
    pub code: String,
    pub asked: Arc<Mutex<u32>>,
}

impl MfaPrompt for FixedPrompt {
    fn token_code(&self, _mfa_serial: &str) -> Result<String> {
        *self.asked.lock().unwrap() += 1;
        Ok(self.code.clone())
    }
}
