use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default)]
    pub cost_per_unit: Option<f64>,
    #[serde(default)]
    pub farm_id: Option<String>,
}

impl Stock {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            quantity,
            unit: unit.into(),
            cost_per_unit: None,
            farm_id: None,
        }
    }
}
