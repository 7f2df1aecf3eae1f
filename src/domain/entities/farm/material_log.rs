use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialAction {
    Received,
    Used,
    Adjusted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLog {
    pub stock_id: String,
    pub action: MaterialAction,
    pub quantity: f64,
    #[serde(default)]
    pub tank_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}
