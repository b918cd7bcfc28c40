use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in-progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(AppError::validation(format!(
                "status must be one of todo, in-progress, completed (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(AppError::validation(format!(
                "priority must be one of low, medium, high (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub effort: i32,
    pub difficulty_level: Option<String>,
    pub deliverable: Option<String>,
    pub bottleneck: Option<String>,
    pub progress: Option<String>,
    pub continue_tomorrow: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub effort: i32,
    pub difficulty_level: Option<String>,
    pub deliverable: Option<String>,
    pub bottleneck: Option<String>,
    pub progress: Option<String>,
    pub continue_tomorrow: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<TaskRow> for Task {
    type Error = anyhow::Error;

    fn try_from(r: TaskRow) -> Result<Self, Self::Error> {
        let status = r
            .status
            .parse::<TaskStatus>()
            .map_err(|e| anyhow::anyhow!("task {} has a corrupt status: {e}", r.id))?;
        let priority = r
            .priority
            .parse::<Priority>()
            .map_err(|e| anyhow::anyhow!("task {} has a corrupt priority: {e}", r.id))?;
        Ok(Self {
            id: r.id,
            project_id: r.project_id,
            title: r.title,
            status,
            priority,
            effort: r.effort,
            difficulty_level: r.difficulty_level,
            deliverable: r.deliverable,
            bottleneck: r.bottleneck,
            progress: r.progress,
            continue_tomorrow: r.continue_tomorrow,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated column values shared by insert and full update.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFields {
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub effort: i32,
    pub difficulty_level: Option<String>,
    pub deliverable: Option<String>,
    pub bottleneck: Option<String>,
    pub progress: Option<String>,
    pub continue_tomorrow: bool,
}
