use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every entity collection mirrored between the device and the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    Expenses,
    Farms,
    FeedingLogs,
    MaterialLogs,
    Stocks,
    Tanks,
}

impl TableName {
    pub const ALL: [TableName; 6] = [
        TableName::Expenses,
        TableName::Farms,
        TableName::FeedingLogs,
        TableName::MaterialLogs,
        TableName::Stocks,
        TableName::Tanks,
    ];

    /// Name of the local SQLite table and of the remote collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableName::Expenses => "expenses",
            TableName::Farms => "farms",
            TableName::FeedingLogs => "feeding_logs",
            TableName::MaterialLogs => "material_logs",
            TableName::Stocks => "stocks",
            TableName::Tanks => "tanks",
        }
    }

    /// Singular label used in user-facing notifications.
    pub fn label(&self) -> &'static str {
        match self {
            TableName::Expenses => "Expense",
            TableName::Farms => "Farm",
            TableName::FeedingLogs => "Feeding log",
            TableName::MaterialLogs => "Material log",
            TableName::Stocks => "Stock",
            TableName::Tanks => "Tank",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TableName {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "expenses" => Ok(TableName::Expenses),
            "farms" => Ok(TableName::Farms),
            "feeding_logs" | "feedingLogs" => Ok(TableName::FeedingLogs),
            "material_logs" | "materialLogs" => Ok(TableName::MaterialLogs),
            "stocks" => Ok(TableName::Stocks),
            "tanks" => Ok(TableName::Tanks),
            other => Err(format!("Unknown table: {other}")),
        }
    }
}
