use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Trend::Up),
            "down" => Ok(Trend::Down),
            "stable" => Ok(Trend::Stable),
            other => Err(AppError::validation(format!(
                "trend must be one of up, down, stable (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub progress: f64,
    pub confidence: f64,
    pub trend: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub progress: f64,
    pub confidence: f64,
    pub trend: Trend,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl TryFrom<ProjectRow> for Project {
    type Error = anyhow::Error;

    fn try_from(r: ProjectRow) -> Result<Self, Self::Error> {
        let trend = r
            .trend
            .parse::<Trend>()
            .map_err(|e| anyhow::anyhow!("project {} has a corrupt trend: {e}", r.id))?;
        Ok(Self {
            id: r.id,
            name: r.name,
            description: r.description,
            progress: r.progress,
            confidence: r.confidence,
            trend,
            user_id: r.user_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated column values for an insert or a full update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectFields {
    pub name: String,
    pub description: String,
    pub progress: f64,
    pub confidence: f64,
    pub trend: Trend,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_parses_case_insensitively() {
        assert_eq!("UP".parse::<Trend>().unwrap(), Trend::Up);
        assert_eq!(" stable".parse::<Trend>().unwrap(), Trend::Stable);
        assert!(matches!("sideways".parse::<Trend>(), Err(AppError::Validation(_))));
    }

    #[test]
    fn corrupt_row_is_an_error() {
        let now = OffsetDateTime::now_utc();
        let row = ProjectRow {
            id: Uuid::new_v4(),
            name: "p".into(),
            description: String::new(),
            progress: 0.0,
            confidence: 0.0,
            trend: "??".into(),
            user_id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };
        assert!(Project::try_from(row).is_err());
    }
}
