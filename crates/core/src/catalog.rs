//! Repository catalog.
//!
//! Maps the repository names a user picks from onto the Jenkins job that
//! builds them, the parameters that job asks for, and the CodePipeline the
//! deploy feeds into (if any).
//!
//! ```toml
//! [[repository]]
//! name = "mail-accounts"
//! jenkins_job = "mail-accounts_Deploy_RC_S3"
//! parameters = ["Branch"]
//! pipeline_name = "MailAccounts-pipeline-qa-Pipeline"
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, instrument};

/// A repository that can be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Name shown to the user.
    pub name: String,
    /// Jenkins job that builds and deploys the repository.
    pub jenkins_job: String,
    /// Build parameters the job expects, prompted in this order.
    #[serde(default)]
    pub parameters: Vec<String>,
    /// CodePipeline triggered by the deploy, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_name: Option<String>,
}

impl Repository {
    /// Whether a CodePipeline follows the Jenkins deploy.
    #[must_use]
    pub const fn has_pipeline(&self) -> bool {
        self.pipeline_name.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "repository")]
    repositories: Vec<Repository>,
}

/// The set of repositories shipwatch knows about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    repositories: Vec<Repository>,
}

impl Catalog {
    /// Load a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails validation.
    #[instrument(name = "catalog_load", skip_all)]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::catalog(path, "file not found")
            } else {
                Error::catalog(path, e.to_string())
            }
        })?;
        Self::from_toml(&content, path)
    }

    /// Parse a catalog from TOML text. `origin` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or fails validation.
    pub fn from_toml(content: &str, origin: &Path) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| Error::catalog(origin, e.to_string()))?;
        Self::new(file.repositories).map_err(|message| Error::catalog(origin, message))
    }

    /// Build a catalog from repositories, validating names and jobs.
    fn new(repositories: Vec<Repository>) -> std::result::Result<Self, String> {
        let mut seen = HashSet::new();
        for repo in &repositories {
            if repo.name.trim().is_empty() {
                return Err("repository with an empty name".to_string());
            }
            if !seen.insert(repo.name.as_str()) {
                return Err(format!("duplicate repository `{}`", repo.name));
            }
            if repo.jenkins_job.trim().is_empty() {
                return Err(format!("repository `{}` has an empty jenkins_job", repo.name));
            }
            if repo
                .pipeline_name
                .as_ref()
                .is_some_and(|name| name.trim().is_empty())
            {
                return Err(format!(
                    "repository `{}` has an empty pipeline_name",
                    repo.name
                ));
            }
        }

        debug!(count = repositories.len(), "Loaded repository catalog");
        Ok(Self { repositories })
    }

    /// Look up a repository by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRepository`] if no repository has that name.
    pub fn get(&self, name: &str) -> Result<&Repository> {
        self.repositories
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| Error::UnknownRepository {
                name: name.to_string(),
            })
    }

    /// Repository names in catalog order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.repositories.iter().map(|r| r.name.as_str()).collect()
    }

    /// Iterate over the repositories in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.iter()
    }

    /// Number of repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    /// Whether the catalog has no repositories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
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

    #[test]
    fn test_parse_sample_catalog() {
        let catalog = Catalog::from_toml(SAMPLE, Path::new("sample.toml")).unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names(), vec!["static", "mail-accounts"]);

        let static_repo = catalog.get("static").unwrap();
        assert_eq!(static_repo.parameters, vec!["Branch", "Machine"]);
        assert!(!static_repo.has_pipeline());

        let mail = catalog.get("mail-accounts").unwrap();
        assert!(mail.has_pipeline());
        assert_eq!(
            mail.pipeline_name.as_deref(),
            Some("MailAccounts-pipeline-qa-Pipeline")
        );
    }

    #[test]
    fn test_unknown_repository() {
        let catalog = Catalog::from_toml(SAMPLE, Path::new("sample.toml")).unwrap();
        let err = catalog.get("nope").unwrap_err();
        assert!(matches!(err, Error::UnknownRepository { name } if name == "nope"));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let toml = r#"
[[repository]]
name = "api"
jenkins_job = "api-a"

[[repository]]
name = "api"
jenkins_job = "api-b"
"#;
        let err = Catalog::from_toml(toml, Path::new("dup.toml")).unwrap_err();
        assert!(err.to_string().contains("duplicate repository `api`"));
    }

    #[test]
    fn test_empty_job_rejected() {
        let toml = r#"
[[repository]]
name = "api"
jenkins_job = " "
"#;
        let err = Catalog::from_toml(toml, Path::new("job.toml")).unwrap_err();
        assert!(err.to_string().contains("empty jenkins_job"));
    }

    #[test]
    fn test_empty_pipeline_name_rejected() {
        let toml = r#"
[[repository]]
name = "api"
jenkins_job = "api"
pipeline_name = ""
"#;
        let err = Catalog::from_toml(toml, Path::new("pipe.toml")).unwrap_err();
        assert!(err.to_string().contains("empty pipeline_name"));
    }

    #[test]
    fn test_missing_parameters_default_to_empty() {
        let toml = r#"
[[repository]]
name = "api"
jenkins_job = "api"
"#;
        let catalog = Catalog::from_toml(toml, Path::new("p.toml")).unwrap();
        assert!(catalog.get("api").unwrap().parameters.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_invalid_toml() {
        let err = Catalog::from_toml("[[repository]\nname=", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, Error::Catalog { .. }));
    }
}
