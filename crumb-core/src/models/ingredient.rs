use crumb_shared::sanitize::lenient_f64;
use crumb_shared::IngredientId;
use serde::{Deserialize, Serialize};

/// A purchasable raw material, priced per bulk package
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,

    /// Unit of measure for quantities (g, ml, un, ...)
    #[serde(default)]
    pub unit: String,

    /// How many units one package holds
    #[serde(default, deserialize_with = "lenient_f64")]
    pub package_quantity: f64,

    /// What one package costs
    #[serde(default, deserialize_with = "lenient_f64")]
    pub package_price: f64,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, package_quantity: f64, package_price: f64) -> Self {
        Self {
            id: IngredientId::generate(),
            name: name.into(),
            unit: unit.into(),
            package_quantity,
            package_price,
        }
    }
}
