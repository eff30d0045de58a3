//! Error types for shipwatch.
//!
//! Every error ends the run. The variants exist so the binary can pick an exit
//! code and print a useful hint, not so callers can recover.

use crate::state::{Backend, Outcome};
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the shipwatch error type.
pub type Result<T> = std::result::Result<T, Error>;

/// AWS error codes that mean the session token has to be revalidated.
pub const EXPIRED_CREDENTIAL_CODES: [&str; 2] = ["ExpiredToken", "InvalidClientTokenId"];

/// Errors that can occur while triggering or tracking a build.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Missing or invalid configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(code(shipwatch::config))]
    Configuration {
        /// Error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },

    /// The repository catalog could not be read or is invalid.
    #[error("Invalid repository catalog {}: {message}", path.display())]
    #[diagnostic(
        code(shipwatch::catalog),
        help("Each [[repository]] needs a unique `name` and a `jenkins_job`")
    )]
    Catalog {
        /// Path to the catalog file
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// The requested repository is not in the catalog.
    #[error("Unknown repository: {name}")]
    #[diagnostic(
        code(shipwatch::unknown_repository),
        help("Run `shipwatch repos` to list the configured repositories")
    )]
    UnknownRepository {
        /// Repository name
        name: String,
    },

    /// Jenkins did not answer the health check.
    #[error("Could not connect to Jenkins at {url}: {reason}")]
    #[diagnostic(
        code(shipwatch::jenkins::unreachable),
        help("Maybe you are not connected to the VPN?")
    )]
    JenkinsUnreachable {
        /// URL that was probed
        url: String,
        /// Underlying failure
        reason: String,
    },

    /// A Jenkins API call failed.
    #[error("Jenkins request to {url} failed: {message}")]
    #[diagnostic(code(shipwatch::jenkins::request))]
    Jenkins {
        /// Request URL
        url: String,
        /// Error message
        message: String,
    },

    /// The queued Jenkins build was cancelled before it started.
    #[error("The build has been cancelled while waiting in the Jenkins queue")]
    #[diagnostic(code(shipwatch::jenkins::cancelled))]
    BuildCancelled,

    /// The tracked build reached a terminal state other than success.
    #[error("{backend} build finished with {outcome}")]
    #[diagnostic(
        code(shipwatch::build_unsuccessful),
        help("Something wrong happened to the build... Go check!")
    )]
    BuildUnsuccessful {
        /// Backend that reported the result
        backend: Backend,
        /// Terminal outcome
        outcome: Outcome,
    },

    /// More than one pipeline execution is in progress.
    #[error(
        "There are {in_progress} in progress executions for pipeline {pipeline}. Can't track which one belongs to this run"
    )]
    #[diagnostic(
        code(shipwatch::aws::ambiguous_execution),
        help("Wait for the other executions to finish and track again")
    )]
    AmbiguousExecution {
        /// Pipeline name
        pipeline: String,
        /// Number of in-progress executions observed
        in_progress: usize,
    },

    /// The in-progress execution started too long before tracking began.
    #[error(
        "Execution {execution_id} of pipeline {pipeline} started {age_secs}s before tracking began, maybe it is a previous execution"
    )]
    #[diagnostic(code(shipwatch::aws::stale_execution))]
    StaleExecution {
        /// Pipeline name
        pipeline: String,
        /// Execution that was rejected
        execution_id: String,
        /// Seconds between the execution start and the poll start
        age_secs: i64,
    },

    /// The AWS session token is invalid or expired.
    #[error("Your AWS access token is invalid or expired ({code})")]
    #[diagnostic(code(shipwatch::aws::expired_credentials))]
    CredentialsExpired {
        /// AWS error code
        code: String,
    },

    /// MFA re-authentication did not produce usable credentials.
    #[error("Could not revalidate AWS credentials: {message}")]
    #[diagnostic(code(shipwatch::aws::reauthentication))]
    Reauthentication {
        /// Error message
        message: String,
    },

    /// An AWS API call failed.
    #[error("AWS {operation} failed: {message}")]
    #[diagnostic(code(shipwatch::aws::request))]
    Aws {
        /// API operation name
        operation: &'static str,
        /// AWS error code, if the service returned one
        code: Option<String>,
        /// Error message
        message: String,
    },

    /// The AWS endpoint could not be reached at all.
    #[error("Could not reach AWS during {operation}: {message}")]
    #[diagnostic(
        code(shipwatch::aws::network),
        help("Could not resolve the AWS endpoint. Are you online?")
    )]
    AwsUnreachable {
        /// API operation name
        operation: &'static str,
        /// Error message
        message: String,
    },

    /// Reading an answer from the terminal failed.
    #[error("Prompt failed: {message}")]
    #[diagnostic(code(shipwatch::prompt))]
    Prompt {
        /// Error message
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    #[diagnostic(code(shipwatch::io))]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: None,
        }
    }

    /// Create a configuration error with help text.
    #[must_use]
    pub fn configuration_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create a catalog error.
    #[must_use]
    pub fn catalog(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Catalog {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a Jenkins request error.
    #[must_use]
    pub fn jenkins(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Jenkins {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an AWS error from an operation name and optional service error code.
    ///
    /// Codes listed in [`EXPIRED_CREDENTIAL_CODES`] become
    /// [`Error::CredentialsExpired`] so callers can route them to re-authentication.
    #[must_use]
    pub fn aws(operation: &'static str, code: Option<&str>, message: impl Into<String>) -> Self {
        match code {
            Some(code) if EXPIRED_CREDENTIAL_CODES.contains(&code) => Self::CredentialsExpired {
                code: code.to_string(),
            },
            _ => Self::Aws {
                operation,
                code: code.map(str::to_string),
                message: message.into(),
            },
        }
    }

    /// Create a re-authentication error.
    #[must_use]
    pub fn reauthentication(message: impl Into<String>) -> Self {
        Self::Reauthentication {
            message: message.into(),
        }
    }

    /// Create a prompt error.
    #[must_use]
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt {
            message: message.into(),
        }
    }

    /// Whether this error means the AWS session has to be revalidated.
    #[must_use]
    pub const fn is_expired_credentials(&self) -> bool {
        matches!(self, Self::CredentialsExpired { .. })
    }

    /// Whether this error is a build that ran and did not succeed, as opposed
    /// to a failure of the tool itself.
    #[must_use]
    pub const fn is_build_result(&self) -> bool {
        matches!(
            self,
            Self::BuildUnsuccessful { .. } | Self::BuildCancelled
        )
    }
}
