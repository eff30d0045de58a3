//! Subcommand implementations.
//!
//! Each command returns the text to print on stdout; progress is reported
//! through the step channels while it runs.

pub mod build;
pub mod last_success;
pub mod repos;

use crate::cli::{AwsArgs, Cli, CliError, Commands, JenkinsArgs};
use crate::prompt::{self, Prompter};
use secrecy::SecretString;
use shipwatch_aws::AwsConfig;
use shipwatch_core::{Backend, Catalog, Error, Result, paths};
use shipwatch_events::{
    CliRenderer, JsonRenderer, SharedReporter, SpinnerRenderer, Step, register_secret,
};
use shipwatch_jenkins::{JenkinsClient, JenkinsConfig, JenkinsTracker};
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Step channel for the Jenkins build.
pub const JENKINS_CHANNEL: &str = Backend::Jenkins.as_str();
/// Step channel for the CodePipeline execution.
pub const AWS_CHANNEL: &str = Backend::Aws.as_str();

const MENU: [&str; 2] = ["Create a build", "Get last successful build"];

/// Pick how progress is shown.
///
/// JSON lines with `--json`, spinners on an interactive terminal, plain
/// prefixed lines otherwise.
#[must_use]
pub fn reporter_for(json: bool) -> SharedReporter {
    if json {
        Arc::new(JsonRenderer::new())
    } else if std::io::stderr().is_terminal() {
        Arc::new(SpinnerRenderer::new())
    } else {
        Arc::new(CliRenderer::with_channels())
    }
}

/// Load the catalog from `path`, or from the default location.
///
/// # Errors
///
/// Returns an error if the catalog cannot be found or is invalid.
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => paths::catalog_path()?,
    };
    debug!(path = %path.display(), "Loading repository catalog");
    Catalog::load(path)
}

/// Build the Jenkins connection settings from the command line.
///
/// The password is registered for redaction before it is used.
///
/// # Errors
///
/// Returns a configuration error if the base URL is missing or invalid, or
/// if only one of user and password is given.
pub fn jenkins_config(args: &JenkinsArgs) -> Result<JenkinsConfig> {
    let config = JenkinsConfig::new(args.base_url.clone().unwrap_or_default())?
        .with_health_check_path(args.health_check_path.clone());

    match (&args.user, &args.password) {
        (Some(user), Some(password)) => {
            register_secret(password);
            Ok(config.with_credentials(user.clone(), SecretString::from(password.clone())))
        }
        (None, None) => Ok(config),
        _ => Err(Error::configuration_with_help(
            "Jenkins user and password must be set together",
            "Set both JENKINS_USER and JENKINS_USER_PASS",
        )),
    }
}

/// Build the AWS settings from the command line.
#[must_use]
pub fn aws_config(args: &AwsArgs) -> AwsConfig {
    AwsConfig {
        profile: args.profile.clone(),
        region: args.region.clone(),
        source_profile: args.source_profile.clone(),
        token_profile: args.token_profile.clone(),
        mfa_serial: args.mfa_serial.clone(),
        session_duration_secs: args.session_duration_secs,
    }
}

/// Jenkins tracker reporting on the `jenkins` channel.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn jenkins_tracker(args: &JenkinsArgs, reporter: &SharedReporter) -> Result<JenkinsTracker> {
    let client = JenkinsClient::new(jenkins_config(args)?)?;
    Ok(JenkinsTracker::new(
        client,
        Step::new(JENKINS_CHANNEL, Arc::clone(reporter)),
    ))
}

/// Run the command line.
///
/// # Errors
///
/// Returns the error of the command that ran.
pub async fn run(cli: Cli) -> std::result::Result<String, CliError> {
    let reporter = reporter_for(cli.json);
    let catalog_path = cli.catalog.as_deref();

    let output = match cli.command.clone() {
        Some(Commands::Repos) => repos::execute(&load_catalog(catalog_path)?, cli.json)?,
        Some(Commands::LastSuccess { repository }) => {
            let catalog = load_catalog(catalog_path)?;
            let repository = match repository {
                Some(name) => name,
                None => last_success::choose_repository(&catalog, &mut prompt::terminal())?,
            };
            last_success::execute(&cli, &catalog, &repository, &reporter).await?
        }
        Some(Commands::Build {
            repository,
            params,
            track,
        }) => {
            let options = build::BuildOptions {
                repository,
                params,
                track: track.map(Into::into),
            };
            build::execute(&cli, &load_catalog(catalog_path)?, options, &reporter).await?
        }
        None => {
            let catalog = load_catalog(catalog_path)?;
            let choice = prompt::terminal().select("What do you want to do?", &MENU)?;
            if choice == 0 {
                build::execute(&cli, &catalog, build::BuildOptions::default(), &reporter).await?
            } else {
                let repository =
                    last_success::choose_repository(&catalog, &mut prompt::terminal())?;
                last_success::execute(&cli, &catalog, &repository, &reporter).await?
            }
        }
    };
    Ok(output)
}

/// Pick a repository name from the catalog.
fn choose(catalog: &Catalog, message: &str, prompter: &mut dyn Prompter) -> Result<String> {
    let names = catalog.names();
    if names.is_empty() {
        return Err(Error::configuration_with_help(
            "The repository catalog is empty",
            "Add [[repository]] entries with a name and a jenkins_job",
        ));
    }
    let index = prompter.select(message, &names)?;
    Ok(names[index].to_string())
}
