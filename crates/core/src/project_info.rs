//! Project-info record loading.
//!
//! The record is a JSON object carrying a free-text `deployment_method`,
//! either at the top level or nested under a `project_info` key.

use crate::deployment::DeploymentMethod;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// The subset of the project-info record used by deck assembly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectInfo {
    #[serde(default)]
    pub deployment_method: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProjectInfoFile {
    Nested { project_info: ProjectInfo },
    Flat(ProjectInfo),
}

impl ProjectInfo {
    /// Parse a project-info record from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: ProjectInfoFile = serde_json::from_str(text)
            .map_err(|e| Error::ProjectInfoError(format!("Invalid project info JSON: {}", e)))?;

        Ok(match file {
            ProjectInfoFile::Nested { project_info } => project_info,
            ProjectInfoFile::Flat(info) => info,
        })
    }

    /// Read and parse a project-info file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// The normalized deployment method, if one is present.
    pub fn deployment(&self) -> Option<DeploymentMethod> {
        self.deployment_method
            .as_deref()
            .and_then(DeploymentMethod::normalize)
    }
}
