use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::tasks::repo_types::{Priority, TaskFields, TaskStatus};
use crate::validation::{non_blank, required};

/// Body of `POST /api/tasks`. Status and priority fall back to `todo` and
/// `medium` when absent or blank.
#[derive(Debug, Deserialize)]
pub struct TaskCreateRequest {
    pub project_id: Uuid,
    pub title: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub effort: i32,
    pub difficulty_level: Option<String>,
    pub deliverable: Option<String>,
    pub bottleneck: Option<String>,
    pub progress: Option<String>,
    #[serde(default)]
    pub continue_tomorrow: bool,
}

/// Body of `PUT /api/tasks/:id`; replaces every mutable column.
#[derive(Debug, Deserialize)]
pub struct TaskUpdateRequest {
    pub title: String,
    pub status: String,
    pub priority: String,
    pub effort: i32,
    pub difficulty_level: Option<String>,
    pub deliverable: Option<String>,
    pub bottleneck: Option<String>,
    pub progress: Option<String>,
    #[serde(default)]
    pub continue_tomorrow: bool,
}

fn positive_effort(effort: i32) -> AppResult<i32> {
    if effort <= 0 {
        return Err(AppError::validation("effort must be greater than 0"));
    }
    Ok(effort)
}

impl TaskCreateRequest {
    pub fn validate(self) -> AppResult<TaskFields> {
        let title = required("title", &self.title)?.to_string();
        let status = match non_blank(self.status) {
            Some(s) => s.parse()?,
            None => TaskStatus::default(),
        };
        let priority = match non_blank(self.priority) {
            Some(p) => p.parse()?,
            None => Priority::default(),
        };
        Ok(TaskFields {
            title,
            status,
            priority,
            effort: positive_effort(self.effort)?,
            difficulty_level: non_blank(self.difficulty_level),
            deliverable: non_blank(self.deliverable),
            bottleneck: non_blank(self.bottleneck),
            progress: non_blank(self.progress),
            continue_tomorrow: self.continue_tomorrow,
        })
    }
}

impl TaskUpdateRequest {
    pub fn validate(self) -> AppResult<TaskFields> {
        Ok(TaskFields {
            title: required("title", &self.title)?.to_string(),
            status: self.status.parse()?,
            priority: self.priority.parse()?,
            effort: positive_effort(self.effort)?,
            difficulty_level: non_blank(self.difficulty_level),
            deliverable: non_blank(self.deliverable),
            bottleneck: non_blank(self.bottleneck),
            progress: non_blank(self.progress),
            continue_tomorrow: self.continue_tomorrow,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_fills_defaults() {
        let req: TaskCreateRequest = serde_json::from_value(json!({
            "project_id": Uuid::new_v4(),
            "title": "Write report",
            "status": "",
            "effort": 3,
        }))
        .unwrap();
        let f = req.validate().unwrap();
        assert_eq!(f.status, TaskStatus::Todo);
        assert_eq!(f.priority, Priority::Medium);
        assert!(!f.continue_tomorrow);
        assert_eq!(f.deliverable, None);
    }

    #[test]
    fn create_rejects_zero_effort_and_unknown_status() {
        for body in [
            json!({"project_id": Uuid::new_v4(), "title": "t", "effort": 0}),
            json!({"project_id": Uuid::new_v4(), "title": "t", "effort": 1, "status": "blocked"}),
            json!({"project_id": Uuid::new_v4(), "title": " ", "effort": 1}),
        ] {
            let req: TaskCreateRequest = serde_json::from_value(body).unwrap();
            assert!(matches!(req.validate(), Err(AppError::Validation(_))));
        }
    }

    #[test]
    fn update_requires_status_and_priority() {
        let req: TaskUpdateRequest = serde_json::from_value(json!({
            "title": "t",
            "status": "completed",
            "priority": "high",
            "effort": 2,
            "continue_tomorrow": true,
        }))
        .unwrap();
        let f = req.validate().unwrap();
        assert_eq!(f.status, TaskStatus::Completed);
        assert_eq!(f.priority, Priority::High);
        assert!(f.continue_tomorrow);

        let missing = serde_json::from_value::<TaskUpdateRequest>(json!({"title": "t", "effort": 2}));
        assert!(missing.is_err());
    }
}
