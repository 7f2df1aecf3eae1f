use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tank {
    pub name: String,
    #[serde(default)]
    pub farm_id: Option<String>,
    #[serde(default)]
    pub size_m2: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub stocking_date: Option<String>,
}

impl Tank {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            farm_id: None,
            size_m2: None,
            status: None,
            stocking_date: None,
        }
    }
}
