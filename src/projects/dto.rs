use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::projects::repo_types::{ProjectFields, Trend};
use crate::validation::{percent, required};

#[derive(Debug, Deserialize)]
pub struct ProjectCreateRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub confidence: f64,
    pub trend: String,
    pub user_id: Uuid,
}

/// Full replacement of the mutable columns; the owner cannot change.
#[derive(Debug, Deserialize)]
pub struct ProjectUpdateRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub confidence: f64,
    pub trend: String,
}

fn fields(
    name: &str,
    description: &str,
    progress: f64,
    confidence: f64,
    trend: &str,
) -> AppResult<ProjectFields> {
    Ok(ProjectFields {
        name: required("name", name)?.to_string(),
        description: description.trim().to_string(),
        progress: percent("progress", progress)?,
        confidence: percent("confidence", confidence)?,
        trend: trend.parse::<Trend>()?,
    })
}

impl ProjectCreateRequest {
    pub fn validate(&self) -> AppResult<ProjectFields> {
        fields(&self.name, &self.description, self.progress, self.confidence, &self.trend)
    }
}

impl ProjectUpdateRequest {
    pub fn validate(&self) -> AppResult<ProjectFields> {
        fields(&self.name, &self.description, self.progress, self.confidence, &self.trend)
    }
}
