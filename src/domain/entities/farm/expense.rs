use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    /// ISO-8601 date the expense was incurred.
    pub expense_date: String,
    #[serde(default)]
    pub farm_id: Option<String>,
}

impl Expense {
    pub fn new(category: impl Into<String>, amount: f64, expense_date: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            amount,
            description: None,
            expense_date: expense_date.into(),
            farm_id: None,
        }
    }
}
