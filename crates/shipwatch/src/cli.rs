//! Command-line interface: arguments, CLI errors and exit codes.

use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, Report};
use serde::{Deserialize, Serialize};
use shipwatch_core::TrackTarget;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes.
pub const EXIT_OK: i32 = 0;
/// A build failed, a backend could not be reached, or credentials were rejected
pub const EXIT_FAILED: i32 = 1;
/// Bad input, configuration or catalog.
pub const EXIT_CLI: i32 = 2;

/// Errors surfaced by the binary, grouped by exit code.
#[derive(Error, Debug, Clone, Diagnostic)]
pub enum CliError {
    /// Bad input or configuration (exit code 2).
    #[error("CLI/configuration error: {message}")]
    #[diagnostic(code(shipwatch::cli::config))]
    Config {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// The tracked build did not succeed (exit code 1)
    #[error("{message}")]
    #[diagnostic(code(shipwatch::cli::build))]
    Build {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
    /// Network, authentication or other runtime error (exit code 1)
    #[error("{message}")]
    #[diagnostic(code(shipwatch::cli::other))]
    Other {
        /// The error message
        message: String,
        /// Optional help text
        #[help]
        help: Option<String>,
    },
}

impl CliError {
    /// Configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    /// Configuration error with a hint.
    #[must_use]
    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Any other failure.
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            help: None,
        }
    }

    /// Short machine-readable category.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Build { .. } => "build",
            Self::Other { .. } => "other",
        }
    }
}

/// Convert `shipwatch_core::Error` to appropriate `CliError` variant.
///
/// - catalog, configuration and prompt problems -> Config (exit code 2)
/// - builds that ran and did not succeed -> Build (exit code 1)
/// - everything else (network, AWS, Jenkins API) -> Other (exit code 1)
impl From<shipwatch_core::Error> for CliError {
    fn from(err: shipwatch_core::Error) -> Self {
        use shipwatch_core::Error;

        let help = err.help().map(|h| h.to_string());
        match err {
            // Keep only the message so the prefix is not repeated
            Error::Configuration { message, help } => Self::Config { message, help },
            Error::Catalog { .. } | Error::UnknownRepository { .. } | Error::Prompt { .. } => {
                Self::Config {
                    message: err.to_string(),
                    help,
                }
            }
            _ if err.is_build_result() => Self::Build {
                message: err.to_string(),
                help,
            },
            Error::CredentialsExpired { .. } => Self::Other {
                message: "Your AWS access token is invalid or expired...".to_string(),
                help: Some("Configure an MFA device with SHIPWATCH_AWS_MFA_SERIAL".to_string()),
            },
            _ => Self::Other {
                message: err.to_string(),
                help,
            },
        }
    }
}

/// Exit code for a failed run.
#[must_use]
pub const fn exit_code_for(err: &CliError) -> i32 {
    match err {
        CliError::Config { .. } => EXIT_CLI,
        CliError::Build { .. } | CliError::Other { .. } => EXIT_FAILED,
    }
}

/// Write `err` to stderr, or as a JSON envelope on stdout with `--json`.
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: &CliError, json_mode: bool) {
    if json_mode {
        let error_envelope = ErrorEnvelope::new(serde_json::json!({
            "code": err.code(),
            "message": err.to_string(),
        }));

        match serde_json::to_string(&error_envelope) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        // Human output goes through miette
        let report = Report::new(err.clone());
        eprintln!("{report:?}");
        // main exits right after this
        let _ = io::stderr().flush();
    }
}

/// `{"status":"ok","data":...}` wrapper for `--json` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkEnvelope<T> {
    /// Always `"ok"`.
    pub status: &'static str,
    /// Command result.
    pub data: T,
}

impl<T> OkEnvelope<T> {
    /// Wrap `data`.
    #[must_use]
    pub const fn new(data: T) -> Self {
        Self { status: "ok", data }
    }
}

/// `{"status":"error","error":...}` wrapper for `--json` failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope<E> {
    /// Always `"error"`.
    pub status: &'static str,
    /// The error details
    pub error: E,
}

impl<E> ErrorEnvelope<E> {
    /// Wrap `error`.
    #[must_use]
    pub const fn new(error: E) -> Self {
        Self {
            status: "error",
            error,
        }
    }
}

/// Main CLI entry point for shipwatch.
///
/// Triggers a Jenkins build and follows it, and the CodePipeline it feeds,
/// until a final result.
#[derive(Parser, Debug)]
#[command(name = "shipwatch")]
#[command(about = "Trigger a Jenkins build and follow it through Jenkins and AWS CodePipeline")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// The subcommand to execute. Without one, shipwatch asks what to do.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level.
    #[arg(
        short = 'L',
        long,
        global = true,
        help = "Set logging level",
        default_value = "warn",
        value_enum
    )]
    pub level: crate::tracing::LogLevel,

    /// Log line format.
    #[arg(
        long,
        global = true,
        default_value = "compact",
        value_enum,
        help = "Log line format"
    )]
    pub log_format: crate::tracing::TracingFormat,

    /// Emit JSON lines instead of spinners.
    #[arg(long, global = true, help = "Emit JSON lines instead of spinners")]
    pub json: bool,

    /// Path to the repository catalog.
    #[arg(
        long,
        global = true,
        env = "SHIPWATCH_CATALOG",
        value_name = "FILE",
        help = "Repository catalog (defaults to <config dir>/shipwatch/repositories.toml)"
    )]
    pub catalog: Option<PathBuf>,

    /// Jenkins connection settings.
    #[command(flatten)]
    pub jenkins: JenkinsArgs,

    /// AWS settings.
    #[command(flatten)]
    pub aws: AwsArgs,
}

/// Jenkins connection settings.
#[derive(Args, Debug, Clone, Default)]
pub struct JenkinsArgs {
    /// Jenkins base URL.
    #[arg(long = "jenkins-url", env = "JENKINS_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Path probed before anything is triggered.
    #[arg(
        long = "jenkins-health-check",
        env = "JENKINS_HEALTH_CHECK_PATH",
        global = true,
        default_value = shipwatch_jenkins::config::DEFAULT_HEALTH_CHECK_PATH
    )]
    pub health_check_path: String,

    /// Jenkins user.
    #[arg(long = "jenkins-user", env = "JENKINS_USER", global = true)]
    pub user: Option<String>,

    /// Jenkins API token or password.
    #[arg(
        long = "jenkins-password",
        env = "JENKINS_USER_PASS",
        global = true,
        hide_env_values = true
    )]
    pub password: Option<String>,
}

/// AWS profile and MFA settings.
#[derive(Args, Debug, Clone)]
pub struct AwsArgs {
    /// AWS profile for CodePipeline calls.
    #[arg(long = "aws-profile", env = "AWS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// AWS region.
    #[arg(long = "aws-region", env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    /// Profile with long-lived keys used to request an MFA session.
    #[arg(
        long = "aws-source-profile",
        env = "SHIPWATCH_AWS_SOURCE_PROFILE",
        global = true
    )]
    pub source_profile: Option<String>,

    /// Profile holding the MFA session; AWS calls run with it (defaults to --aws-profile).
    #[arg(
        long = "aws-token-profile",
        env = "SHIPWATCH_AWS_TOKEN_PROFILE",
        global = true
    )]
    pub token_profile: Option<String>,

    /// ARN of the MFA device.
    #[arg(long = "mfa-serial", env = "SHIPWATCH_AWS_MFA_SERIAL", global = true)]
    pub mfa_serial: Option<String>,

    /// Length of a refreshed session, in seconds.
    #[arg(
        long = "aws-session-seconds",
        env = "SHIPWATCH_AWS_SESSION_SECONDS",
        global = true,
        default_value_t = shipwatch_aws::config::DEFAULT_SESSION_DURATION_SECS
    )]
    pub session_duration_secs: i32,
}

/// Subcommands. Without one, shipwatch asks what to do.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Trigger a build and track it until it finishes.
    #[command(about = "Trigger a build and track it until it finishes")]
    Build {
        /// Repository to build (prompted if omitted).
        #[arg(short, long)]
        repository: Option<String>,
        /// Build parameter value (repeatable). Missing parameters are prompted.
        #[arg(
            short = 'p',
            long = "param",
            value_name = "NAME=VALUE",
            value_parser = parse_param,
            action = clap::ArgAction::Append
        )]
        params: Vec<(String, String)>,
        /// Which build to follow when the repository has a pipeline (prompted if omitted).
        #[arg(short, long, value_enum)]
        track: Option<TrackArg>,
    },
    /// Show the last successful Jenkins build of a repository.
    #[command(about = "Show the last successful Jenkins build of a repository")]
    LastSuccess {
        /// Repository to look up (prompted if omitted).
        #[arg(short, long)]
        repository: Option<String>,
    },
    /// List the repositories in the catalog.
    #[command(about = "List the repositories in the catalog")]
    Repos,
}

/// Which build to follow.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum TrackArg {
    /// The Jenkins build only
    Jenkins,
    /// The CodePipeline execution only
    Aws,
    /// Both at the same time
    Both,
}

impl From<TrackArg> for TrackTarget {
    fn from(arg: TrackArg) -> Self {
        match arg {
            TrackArg::Jenkins => Self::Jenkins,
            TrackArg::Aws => Self::Aws,
            TrackArg::Both => Self::Both,
        }
    }
}

/// Parse `NAME=VALUE`. The value may be empty and may contain `=`.
///
/// # Errors
///
/// Returns an error if there is no `=` or the name is empty.
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("parameter name is empty in `{raw}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Parse command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
