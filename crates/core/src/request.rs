//! What to build and what to watch.

use crate::catalog::Repository;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A build the user asked for: a repository plus its parameter values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Repository being built.
    pub repository: Repository,
    /// Parameter values in the order the repository declares them.
    pub parameters: Vec<(String, String)>,
}

impl BuildRequest {
    /// Create a request with no parameter values yet.
    #[must_use]
    pub const fn new(repository: Repository) -> Self {
        Self {
            repository,
            parameters: Vec::new(),
        }
    }

    /// Set a parameter value, replacing any earlier value for the same name.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_parameter(name, value);
        self
    }

    /// Set a parameter value, replacing any earlier value for the same name.
    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.parameters.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            self.parameters.push((name, value));
        }
    }

    /// Look up a parameter value.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parameters declared by the repository that have no value yet.
    #[must_use]
    pub fn missing_parameters(&self) -> Vec<&str> {
        self.repository
            .parameters
            .iter()
            .map(String::as_str)
            .filter(|name| self.parameter(name).is_none())
            .collect()
    }
}

/// Which build the user wants to follow once it is triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackTarget {
    /// Only the Jenkins build.
    Jenkins,
    /// Only the CodePipeline execution.
    Aws,
    /// Both, concurrently.
    Both,
}

impl TrackTarget {
    /// All targets in prompt order.
    pub const ALL: [Self; 3] = [Self::Jenkins, Self::Aws, Self::Both];
}

impl fmt::Display for TrackTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Jenkins => "Jenkins",
            Self::Aws => "AWS",
            Self::Both => "Both",
        };
        write!(f, "{s}")
    }
}

impl FromStr for TrackTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jenkins" => Ok(Self::Jenkins),
            "aws" => Ok(Self::Aws),
            "both" => Ok(Self::Both),
            other => Err(Error::configuration_with_help(
                format!("Unknown tracking target `{other}`"),
                "Use one of: jenkins, aws, both",
            )),
        }
    }
}

/// The backends a run will trigger and poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackPlan {
    /// Trigger the Jenkins job and poll it.
    pub jenkins: bool,
    /// Correlate and poll the CodePipeline execution.
    pub aws: bool,
}

impl TrackPlan {
    /// Decide what to track for a repository.
    ///
    /// Jenkins is tracked when the target asks for it or when the repository
    /// has no pipeline (there is nothing else to follow). The pipeline is
    /// tracked only when asked for and only if the repository has one.
    #[must_use]
    pub fn for_repository(repository: &Repository, target: Option<TrackTarget>) -> Self {
        let jenkins = matches!(target, Some(TrackTarget::Jenkins | TrackTarget::Both))
            || !repository.has_pipeline();
        let aws = repository.has_pipeline()
            && matches!(target, Some(TrackTarget::Aws | TrackTarget::Both));
        Self { jenkins, aws }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(pipeline: Option<&str>) -> Repository {
        Repository {
            name: "mail-accounts".to_string(),
            jenkins_job: "mail-accounts_Deploy".to_string(),
            parameters: vec!["Branch".to_string(), "Machine".to_string()],
            pipeline_name: pipeline.map(str::to_string),
        }
    }

    #[test]
    fn test_parameters_keep_declaration_order_and_replace() {
        let mut request = BuildRequest::new(repo(None))
            .with_parameter("Branch", "main")
            .with_parameter("Machine", "qa-1");
        request.set_parameter("Branch", "release");

        assert_eq!(
            request.parameters,
            vec![
                ("Branch".to_string(), "release".to_string()),
                ("Machine".to_string(), "qa-1".to_string()),
            ]
        );
        assert_eq!(request.parameter("Branch"), Some("release"));
        assert!(request.missing_parameters().is_empty());
    }

    #[test]
    fn test_missing_parameters() {
        let request = BuildRequest::new(repo(None)).with_parameter("Machine", "qa-1");
        assert_eq!(request.missing_parameters(), vec!["Branch"]);
    }

    #[test]
    fn test_target_parsing() {
        assert_eq!("jenkins".parse::<TrackTarget>().unwrap(), TrackTarget::Jenkins);
        assert_eq!("AWS".parse::<TrackTarget>().unwrap(), TrackTarget::Aws);
        assert_eq!("Both".parse::<TrackTarget>().unwrap(), TrackTarget::Both);
        assert!("gitlab".parse::<TrackTarget>().is_err());
    }

    #[test]
    fn test_plan_without_pipeline_always_tracks_jenkins() {
        let repo = repo(None);
        for target in [None, Some(TrackTarget::Aws), Some(TrackTarget::Both)] {
            let plan = TrackPlan::for_repository(&repo, target);
            assert!(plan.jenkins);
            assert!(!plan.aws);
        }
    }

    #[test]
    fn test_plan_with_pipeline() {
        let repo = repo(Some("MailAccounts-pipeline"));

        let plan = TrackPlan::for_repository(&repo, Some(TrackTarget::Jenkins));
        assert_eq!(plan, TrackPlan { jenkins: true, aws: false });

        let plan = TrackPlan::for_repository(&repo, Some(TrackTarget::Aws));
        assert_eq!(plan, TrackPlan { jenkins: false, aws: true });

        let plan = TrackPlan::for_repository(&repo, Some(TrackTarget::Both));
        assert_eq!(plan, TrackPlan { jenkins: true, aws: true });
    }
}
