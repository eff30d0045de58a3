//! Tests for error types

use miette::Diagnostic;
use shipwatch_core::{Backend, Error, Outcome};
use std::path::Path;

#[test]
fn test_configuration_error() {
    let error = Error::configuration("Jenkins base URL is not set");
    assert_eq!(
        error.to_string(),
        "Configuration error: Jenkins base URL is not set"
    );
    assert!(error.help().is_none());

    let error = Error::configuration_with_help("no MFA device", "Set SHIPWATCH_AWS_MFA_SERIAL");
    assert_eq!(
        error.help().map(|h| h.to_string()).as_deref(),
        Some("Set SHIPWATCH_AWS_MFA_SERIAL")
    );
}

#[test]
fn test_catalog_error_names_file() {
    let error = Error::catalog(Path::new("/etc/shipwatch/repositories.toml"), "duplicate repository `api`");
    assert_eq!(
        error.to_string(),
        "Invalid repository catalog /etc/shipwatch/repositories.toml: duplicate repository `api`"
    );
    assert!(error.help().is_some());
}

#[test]
fn test_unreachable_jenkins_suggests_vpn() {
    let error = Error::JenkinsUnreachable {
        url: "https://ci.example.com/login".to_string(),
        reason: "connection refused".to_string(),
    };
    assert_eq!(
        error.help().map(|h| h.to_string()).as_deref(),
        Some("Maybe you are not connected to the VPN?")
    );
    assert_eq!(
        error.code().map(|c| c.to_string()).as_deref(),
        Some("shipwatch::jenkins::unreachable")
    );
}

#[test]
fn test_build_unsuccessful_message() {
    let error = Error::BuildUnsuccessful {
        backend: Backend::Aws,
        outcome: Outcome::Aborted,
    };
    assert_eq!(error.to_string(), "AWS CodePipeline build finished with ABORTED");
    assert!(error.is_build_result());
    assert!(Error::BuildCancelled.is_build_result());
    assert!(!Error::configuration("x").is_build_result());
}

#[test]
fn test_aws_error_keeps_code() {
    let error = Error::aws("ListPipelineExecutions", Some("PipelineNotFoundException"), "no such pipeline");
    match error {
        Error::Aws {
            operation,
            code,
            message,
        } => {
            assert_eq!(operation, "ListPipelineExecutions");
            assert_eq!(code.as_deref(), Some("PipelineNotFoundException"));
            assert_eq!(message, "no such pipeline");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_expired_token_is_routed_to_reauthentication() {
    let error = Error::aws("GetCallerIdentity", Some("ExpiredToken"), "token expired");
    assert!(error.is_expired_credentials());

    let error = Error::aws("GetCallerIdentity", None, "no code");
    assert!(!error.is_expired_credentials());
}

#[test]
fn test_ambiguous_execution_message() {
    let error = Error::AmbiguousExecution {
        pipeline: "MailAccounts-pipeline".to_string(),
        in_progress: 2,
    };
    assert_eq!(
        error.to_string(),
        "There are 2 in progress executions for pipeline MailAccounts-pipeline. Can't track which one belongs to this run"
    );
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let error: Error = io.into();
    assert!(error.to_string().starts_with("IO error:"));
}
