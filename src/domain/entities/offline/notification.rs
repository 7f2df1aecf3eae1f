use crate::domain::value_objects::TableName;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    /// Rendered destructively by the UI.
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
    pub table: Option<TableName>,
}

impl Notification {
    pub fn success(table: Option<TableName>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            description: description.into(),
            table,
        }
    }

    pub fn failure(table: Option<TableName>, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Failure,
            title: title.into(),
            description: description.into(),
            table,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.level == NotificationLevel::Failure
    }
}
