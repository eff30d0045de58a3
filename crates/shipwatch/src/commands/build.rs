//! `shipwatch build`: trigger a build and follow it to the end.

use super::{AWS_CHANNEL, choose, jenkins_tracker};
use crate::cli::{Cli, OkEnvelope};
use crate::prompt::{self, Prompter};
use serde::Serialize;
use shipwatch_aws::AwsTracker;
use shipwatch_core::{
    BuildRequest, BuildTracker, Catalog, Error, Outcome, Result, TrackPlan, TrackTarget, track,
};
use shipwatch_events::{SharedReporter, Step, emit_run_completed};
use shipwatch_jenkins::JenkinsTracker;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// What the user already answered on the command line.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Repository name.
    pub repository: Option<String>,
    /// `NAME=VALUE` parameters.
    pub params: Vec<(String, String)>,
    /// Which build to follow.
    pub track: Option<TrackTarget>,
}

/// One build parameter as it was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterValue {
    /// Parameter name.
    pub name: String,
    /// Value sent to Jenkins.
    pub value: String,
}

/// Result of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Repository that was built.
    pub repository: String,
    /// Parameters sent with the build.
    pub parameters: Vec<ParameterValue>,
    /// Jenkins outcome, when Jenkins was tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jenkins: Option<Outcome>,
    /// Pipeline outcome, when the pipeline was tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<Outcome>,
    /// Wall time from the first health check to the end.
    pub duration_ms: u64,
}

impl RunReport {
    fn summary(&self) -> String {
        let tracked: Vec<&str> = [
            self.jenkins.map(|_| "Jenkins"),
            self.aws.map(|_| "CodePipeline"),
        ]
        .into_iter()
        .flatten()
        .collect();
        format!(
            "{} deployed successfully ({}, {:.1}s)",
            self.repository,
            tracked.join(" + "),
            Duration::from_millis(self.duration_ms).as_secs_f64()
        )
    }
}

/// Resolve the repository, its parameters and what to track, asking for
/// anything the options leave open.
///
/// Parameters are asked for in the order the repository declares them.
/// The tracking target is only asked for when the repository has a pipeline.
///
/// # Errors
///
/// Returns an error for an unknown repository or parameter, or when a
/// prompt cannot be answered.
pub fn plan_build(
    catalog: &Catalog,
    options: BuildOptions,
    prompter: &mut dyn Prompter,
) -> Result<(BuildRequest, TrackPlan)> {
    let name = match options.repository {
        Some(name) => name,
        None => choose(catalog, "Which repository do you want to build?", prompter)?,
    };
    let repository = catalog.get(&name)?.clone();

    let mut given: HashMap<String, String> = HashMap::new();
    for (param, value) in options.params {
        if !repository.parameters.contains(&param) {
            return Err(Error::configuration_with_help(
                format!("Repository `{}` has no build parameter `{param}`", repository.name),
                format!("Known parameters: {}", known_parameters(&repository.parameters)),
            ));
        }
        given.insert(param, value);
    }

    let mut request = BuildRequest::new(repository.clone());
    for param in &repository.parameters {
        let value = match given.remove(param) {
            Some(value) => value,
            None => prompter.input(&format!("Build parameter - {param}:"))?,
        };
        request.set_parameter(param.clone(), value);
    }

    let target = if repository.has_pipeline() {
        match options.track {
            Some(target) => Some(target),
            None => {
                let labels: Vec<String> = TrackTarget::ALL.iter().map(ToString::to_string).collect();
                let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
                let index = prompter.select("Which build do you want to track?", &labels)?;
                Some(TrackTarget::ALL[index])
            }
        }
    } else {
        if matches!(options.track, Some(TrackTarget::Aws | TrackTarget::Both)) {
            warn!(
                repository = %repository.name,
                "Repository has no CodePipeline, tracking Jenkins only"
            );
        }
        None
    };

    Ok((request, TrackPlan::for_repository(&repository, target)))
}

fn known_parameters(parameters: &[String]) -> String {
    if parameters.is_empty() {
        "none".to_string()
    } else {
        parameters.join(", ")
    }
}

/// Prepare each tracker, then trigger and follow them concurrently.
///
/// Preparation runs one tracker at a time so an MFA prompt never competes
/// with another backend's progress. The first failure ends the run.
///
/// # Errors
///
/// Returns the first preparation, trigger or poll error, or
/// [`Error::BuildUnsuccessful`] when a build does not succeed.
#[instrument(name = "run_build", skip_all, fields(repository = %request.repository.name))]
pub async fn run_build(
    request: &BuildRequest,
    mut jenkins: Option<JenkinsTracker>,
    mut aws: Option<AwsTracker>,
) -> Result<RunReport> {
    let started = Instant::now();

    let result = async {
        if let Some(tracker) = jenkins.as_mut() {
            tracker.prepare().await?;
        }
        if let Some(tracker) = aws.as_mut() {
            tracker.prepare().await?;
        }

        tokio::try_join!(
            follow(jenkins.as_ref(), request),
            follow(aws.as_ref(), request)
        )
    }
    .await;

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    emit_run_completed!(request.repository.name, result.is_ok(), duration_ms);
    let (jenkins, aws) = result?;

    Ok(RunReport {
        repository: request.repository.name.clone(),
        parameters: request
            .parameters
            .iter()
            .map(|(name, value)| ParameterValue {
                name: name.clone(),
                value: value.clone(),
            })
            .collect(),
        jenkins,
        aws,
        duration_ms,
    })
}

async fn follow<T: BuildTracker>(
    tracker: Option<&T>,
    request: &BuildRequest,
) -> Result<Option<Outcome>> {
    let Some(tracker) = tracker else {
        return Ok(None);
    };
    let mut handle = tracker.trigger(request).await?;
    track(tracker, &mut handle).await.map(Some)
}

/// Run `shipwatch build`.
///
/// # Errors
///
/// Returns an error if planning, preparation or tracking fails.
pub async fn execute(
    cli: &Cli,
    catalog: &Catalog,
    options: BuildOptions,
    reporter: &SharedReporter,
) -> Result<String> {
    // The stdin lock is released before tracking; the MFA prompt needs it.
    let (request, plan) = plan_build(catalog, options, &mut prompt::terminal())?;
    info!(
        repository = %request.repository.name,
        jenkins = plan.jenkins,
        aws = plan.aws,
        "Starting build"
    );

    let jenkins = if plan.jenkins {
        Some(jenkins_tracker(&cli.jenkins, reporter)?)
    } else {
        None
    };
    let aws = if plan.aws {
        Some(
            shipwatch_aws::connect(
                super::aws_config(&cli.aws),
                Box::new(prompt::TerminalMfaPrompt::default()),
                Step::new(AWS_CHANNEL, Arc::clone(reporter)),
            )
            .await,
        )
    } else {
        None
    };

    let report = run_build(&request, jenkins, aws).await?;
    if cli.json {
        serde_json::to_string(&OkEnvelope::new(&report))
            .map_err(|e| Error::configuration(format!("Failed to serialize run report: {e}")))
    } else {
        debug!(?report, "Run finished");
        Ok(report.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::LinePrompter;
    use async_trait::async_trait;
    use chrono::Utc;
    use shipwatch_aws::{
        ActionExecution, ActionStatus, AwsConfig, ExecutionStatus, ExecutionSummary, PipelineApi,
    };
    use shipwatch_core::Backend;
    use shipwatch_events::{RecordingReporter, StepKind};
    use shipwatch_jenkins::{JenkinsClient, JenkinsConfig};
    use std::io::Cursor;
    use std::path::Path;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CATALOG: &str = r#"
[[repository]]
name = "static"
jenkins_job = "static-Deploy_RC"
parameters = ["Branch", "Machine"]

[[repository]]
name = "mail-accounts"
jenkins_job = "mail-accounts_Deploy_RC_S3"
parameters = ["Branch"]
pipeline_name = "MailAccounts-pipeline-qa-Pipeline"
"#;

    fn catalog() -> Catalog {
        Catalog::from_toml(CATALOG, Path::new("repositories.toml")).unwrap()
    }

    fn answers(input: &str) -> LinePrompter<Cursor<Vec<u8>>, Vec<u8>> {
        LinePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_plan_prompts_for_everything() {
        let mut prompter = answers("2\nrelease/2.4\n3\n");
        let (request, plan) = plan_build(&catalog(), BuildOptions::default(), &mut prompter).unwrap();

        assert_eq!(request.repository.name, "mail-accounts");
        assert_eq!(request.parameter("Branch"), Some("release/2.4"));
        assert_eq!(plan, TrackPlan { jenkins: true, aws: true });

        let shown = String::from_utf8(prompter.into_writer()).unwrap();
        assert!(shown.contains("Which repository do you want to build?"));
        assert!(shown.contains("Build parameter - Branch:"));
        assert!(shown.contains("Which build do you want to track?"));
    }

    #[test]
    fn test_plan_keeps_declared_order_and_prompts_only_missing() {
        let mut prompter = answers("qa-3\n");
        let options = BuildOptions {
            repository: Some("static".to_string()),
            params: vec![("Branch".to_string(), "main".to_string())],
            track: None,
        };
        let (request, plan) = plan_build(&catalog(), options, &mut prompter).unwrap();

        assert_eq!(
            request.parameters,
            vec![
                ("Branch".to_string(), "main".to_string()),
                ("Machine".to_string(), "qa-3".to_string()),
            ]
        );
        assert_eq!(plan, TrackPlan { jenkins: true, aws: false });

        let shown = String::from_utf8(prompter.into_writer()).unwrap();
        assert!(!shown.contains("Build parameter - Branch:"));
        assert!(!shown.contains("Which build do you want to track?"));
    }

    #[test]
    fn test_plan_rejects_unknown_parameter() {
        let options = BuildOptions {
            repository: Some("mail-accounts".to_string()),
            params: vec![("Machine".to_string(), "qa-1".to_string())],
            track: Some(TrackTarget::Jenkins),
        };
        let err = plan_build(&catalog(), options, &mut answers("")).unwrap_err();
        assert!(err.to_string().contains("has no build parameter `Machine`"));
    }

    #[test]
    fn test_plan_unknown_repository() {
        let options = BuildOptions {
            repository: Some("nope".to_string()),
            ..BuildOptions::default()
        };
        let err = plan_build(&catalog(), options, &mut answers("")).unwrap_err();
        assert!(matches!(err, Error::UnknownRepository { .. }));
    }

    #[test]
    fn test_plan_aws_target_without_pipeline_tracks_jenkins() {
        let options = BuildOptions {
            repository: Some("static".to_string()),
            params: vec![
                ("Branch".to_string(), "main".to_string()),
                ("Machine".to_string(), String::new()),
            ],
            track: Some(TrackTarget::Aws),
        };
        let (_, plan) = plan_build(&catalog(), options, &mut answers("")).unwrap();
        assert_eq!(plan, TrackPlan { jenkins: true, aws: false });
    }

    /// One in-progress execution that started now, whose only action succeeds.
    struct FinishedPipeline;

    #[async_trait]
    impl PipelineApi for FinishedPipeline {
        async fn list_executions(
            &self,
            _pipeline: &str,
            _max_results: i32,
        ) -> Result<Vec<ExecutionSummary>> {
            Ok(vec![ExecutionSummary {
                execution_id: "exec-1".to_string(),
                status: ExecutionStatus::InProgress,
                started_at: Some(Utc::now()),
            }])
        }

        async fn list_action_executions(
            &self,
            _pipeline: &str,
            _execution_id: &str,
        ) -> Result<Vec<ActionExecution>> {
            Ok(vec![ActionExecution {
                stage_name: "Deploy".to_string(),
                action_name: "DeployToS3".to_string(),
                status: ActionStatus::Succeeded,
            }])
        }

        async fn execution_status(
            &self,
            _pipeline: &str,
            _execution_id: &str,
        ) -> Result<ExecutionStatus> {
            Ok(ExecutionStatus::Succeeded)
        }
    }

    async fn jenkins_server(result: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/job/mail-accounts_Deploy_RC_S3/buildWithParameters"))
            .and(body_string_contains("Branch=main"))
            .respond_with(
                ResponseTemplate::new(201)
                    .insert_header("Location", format!("{}/queue/item/7/", server.uri()).as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/queue/item/7/api/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"cancelled":false,"executable":{"number":42}}"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/job/mail-accounts_Deploy_RC_S3/42/api/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"result":"{result}","id":"42"}}"#)),
            )
            .mount(&server)
            .await;
        server
    }

    fn trackers(
        server: &MockServer,
        reporter: &Arc<RecordingReporter>,
    ) -> (JenkinsTracker, AwsTracker) {
        let client = JenkinsClient::new(JenkinsConfig::new(server.uri()).unwrap()).unwrap();
        let jenkins = JenkinsTracker::new(client, Step::new("jenkins", reporter.clone()));
        let aws = AwsTracker::new(
            Box::new(FinishedPipeline),
            AwsConfig::default(),
            Step::new("aws", reporter.clone()),
        );
        (jenkins, aws)
    }

    fn mail_request() -> BuildRequest {
        BuildRequest::new(catalog().get("mail-accounts").unwrap().clone())
            .with_parameter("Branch", "main")
    }

    #[tokio::test]
    async fn test_run_both_backends() {
        let server = jenkins_server("SUCCESS").await;
        let reporter = Arc::new(RecordingReporter::new());
        let (jenkins, aws) = trackers(&server, &reporter);

        let report = run_build(&mail_request(), Some(jenkins), Some(aws))
            .await
            .unwrap();

        assert_eq!(report.repository, "mail-accounts");
        assert_eq!(report.jenkins, Some(Outcome::Success));
        assert_eq!(report.aws, Some(Outcome::Success));
        assert_eq!(
            report.parameters,
            vec![ParameterValue {
                name: "Branch".to_string(),
                value: "main".to_string(),
            }]
        );

        let jenkins_messages = reporter.messages("jenkins");
        assert!(jenkins_messages.contains(&(StepKind::Succeeded, "Build completed...".to_string())));
        let aws_messages = reporter.messages("aws");
        assert!(aws_messages.contains(&(StepKind::Succeeded, "Pipeline finished...".to_string())));
    }

    #[tokio::test]
    async fn test_run_jenkins_failure_ends_run() {
        let server = jenkins_server("FAILURE").await;
        let reporter = Arc::new(RecordingReporter::new());
        let (jenkins, _) = trackers(&server, &reporter);

        let err = run_build(&mail_request(), Some(jenkins), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::BuildUnsuccessful {
                backend: Backend::Jenkins,
                outcome: Outcome::Failure,
            }
        ));
    }

    #[tokio::test]
    async fn test_run_aws_only_does_not_trigger_jenkins() {
        let server = MockServer::start().await;
        let reporter = Arc::new(RecordingReporter::new());
        let (_, aws) = trackers(&server, &reporter);

        let report = run_build(&mail_request(), None, Some(aws)).await.unwrap();

        assert_eq!(report.jenkins, None);
        assert_eq!(report.aws, Some(Outcome::Success));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_jenkins_stops_before_trigger() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/login"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let reporter = Arc::new(RecordingReporter::new());
        let (jenkins, aws) = trackers(&server, &reporter);

        let err = run_build(&mail_request(), Some(jenkins), Some(aws))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::JenkinsUnreachable { .. }));
        assert!(reporter.messages("aws").is_empty());
    }

    #[test]
    fn test_report_json_shape() {
        let report = RunReport {
            repository: "static".to_string(),
            parameters: vec![ParameterValue {
                name: "Branch".to_string(),
                value: "main".to_string(),
            }],
            jenkins: Some(Outcome::Success),
            aws: None,
            duration_ms: 1500,
        };
        let json = serde_json::to_value(OkEnvelope::new(&report)).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["data"]["repository"], "static");
        assert_eq!(json["data"]["parameters"][0]["name"], "Branch");
        assert!(json["data"].get("aws").is_none());
        assert_eq!(report.summary(), "static deployed successfully (Jenkins, 1.5s)");
    }
}
