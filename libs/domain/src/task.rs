//! Task domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::enums::TaskStatus;
use crate::ids::{ProjectId, TaskId, UserId};

/// A unit of work routed through a project's workflow instance
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub project_id: ProjectId,
    pub status: TaskStatus,
    pub input_data: serde_json::Value,
    pub priority: i32,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

/// Summary view of a task for list responses
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: TaskId,
    pub project_id: ProjectId,
    pub status: TaskStatus,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

impl TaskStatus {
    /// Whether a task in this status still requires action before completion
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled | Self::Deleted)
    }
}
