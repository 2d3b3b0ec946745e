use chrono::NaiveDate;
use crumb_shared::sanitize::lenient_f64;
use crumb_shared::RecipeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recipe batch planned for a production run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductionScheduleItem {
    pub recipe_id: RecipeId,

    /// Number of batches to produce
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,

    #[serde(default)]
    pub notes: Option<String>,
}

impl ProductionScheduleItem {
    pub fn new(recipe_id: RecipeId, quantity: f64) -> Self {
        Self {
            recipe_id,
            quantity,
            notes: None,
        }
    }
}

/// A dated group of schedule items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRun {
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub scheduled_for: Option<NaiveDate>,
    #[serde(default)]
    pub items: Vec<ProductionScheduleItem>,
}

impl ProductionRun {
    pub fn new(name: impl Into<String>, scheduled_for: Option<NaiveDate>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            scheduled_for,
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: ProductionScheduleItem) {
        self.items.push(item);
    }
}
