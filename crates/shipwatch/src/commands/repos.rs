//! `shipwatch repos`: list the catalog.

use crate::cli::OkEnvelope;
use shipwatch_core::{Catalog, Error, Repository, Result};
use std::fmt::Write as _;

/// Render the catalog as text, or as a JSON envelope.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(catalog: &Catalog, json: bool) -> Result<String> {
    if json {
        let repositories: Vec<&Repository> = catalog.iter().collect();
        return serde_json::to_string(&OkEnvelope::new(repositories))
            .map_err(|e| Error::configuration(format!("Failed to serialize catalog: {e}")));
    }

    if catalog.is_empty() {
        return Ok("No repositories configured".to_string());
    }

    let width = catalog.names().iter().map(|n| n.len()).max().unwrap_or(0);
    let mut out = String::new();
    for repo in catalog.iter() {
        let _ = write!(out, "{:width$}  {}", repo.name, repo.jenkins_job);
        if let Some(pipeline) = &repo.pipeline_name {
            let _ = write!(out, " -> {pipeline}");
        }
        if !repo.parameters.is_empty() {
            let _ = write!(out, " [{}]", repo.parameters.join(", "));
        }
        out.push('\n');
    }
    out.truncate(out.trim_end().len());
    Ok(out)
}
