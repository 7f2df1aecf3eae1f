use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedingLog {
    pub tank_id: String,
    pub feed_type: String,
    pub quantity_kg: f64,
    /// ISO-8601 timestamp of the feeding.
    pub fed_at: String,
    #[serde(default)]
    pub stock_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl FeedingLog {
    pub fn new(
        tank_id: impl Into<String>,
        feed_type: impl Into<String>,
        quantity_kg: f64,
        fed_at: impl Into<String>,
    ) -> Self {
        Self {
            tank_id: tank_id.into(),
            feed_type: feed_type.into(),
            quantity_kg,
            fed_at: fed_at.into(),
            stock_id: None,
            notes: None,
        }
    }
}
