use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive date range attached to problem statements, tasks and subtasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start_date: String,
    pub end_date: String,
}

impl TimePeriod {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    /// Build a period spanning whole calendar days, from the first second of
    /// `start` to the last second of `end` (UTC)
    pub fn from_days(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start_date: format!("{}T00:00:00Z", start.format("%Y-%m-%d")),
            end_date: format!("{}T23:59:59Z", end.format("%Y-%m-%d")),
        }
    }
}

/// Named scope for analysis work, bound to a region and date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemStatement {
    /// Assigned by the remote platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    /// Region identifier, used in dashboard URLs
    pub regionid: String,

    pub dates: TimePeriod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
}

/// Payload for creating a problem statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProblemStatement {
    pub name: String,
    pub regionid: String,
    pub dates: TimePeriod,
}

impl NewProblemStatement {
    pub fn new(name: impl Into<String>, regionid: impl Into<String>, dates: TimePeriod) -> Self {
        Self {
            name: name.into(),
            regionid: regionid.into(),
            dates,
        }
    }

    /// Create from calendar dates as entered by a user
    pub fn from_days(
        name: impl Into<String>,
        regionid: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self::new(name, regionid, TimePeriod::from_days(start, end))
    }
}

/// Unit of work under a problem statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    pub dates: TimePeriod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Subtask>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub dates: TimePeriod,
}

/// The unit actually executed by the remote platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub driving_variables: Vec<String>,

    #[serde(default)]
    pub response_variables: Vec<String>,

    pub dates: TimePeriod,

    /// Lookup key into the dataset catalog, not an owned reference
    #[serde(default)]
    pub dataset_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubtask {
    pub name: String,
    pub driving_variables: Vec<String>,
    pub response_variables: Vec<String>,
    pub dates: TimePeriod,
    pub dataset_id: String,
}

/// Task name used for one dataset, so repeated analyses reuse the same task
pub fn dataset_task_name(title: &str) -> String {
    format!("Dataset Analysis - {}", title)
}
