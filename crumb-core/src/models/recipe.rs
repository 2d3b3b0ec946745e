use crumb_shared::sanitize::{lenient_count, lenient_f64};
use crumb_shared::{IngredientId, RecipeId};
use serde::{Deserialize, Serialize};

/// Whether a line is consumed once per batch or once per produced unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineKind {
    Base,
    Portion,
}

/// One ingredient usage inside a recipe.
///
/// `cost` is a derived value written back by the costing engine; it is carried
/// here only so that records round-trip with the figure last displayed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngredientLine {
    pub ingredient_id: IngredientId,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cost: f64,
}

impl IngredientLine {
    pub fn new(ingredient_id: IngredientId, quantity: f64) -> Self {
        Self {
            ingredient_id,
            quantity,
            cost: 0.0,
        }
    }
}

/// A batch formula yielding `portions` sellable units
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,

    /// Units produced by one batch. Values below 1 are kept as entered so the
    /// costing engine can report the recipe as invalid for per-unit costing.
    #[serde(default, deserialize_with = "lenient_count")]
    pub portions: i64,

    /// Consumed once for the whole batch
    #[serde(default)]
    pub base_lines: Vec<IngredientLine>,

    /// Consumed once per produced unit
    #[serde(default)]
    pub portion_lines: Vec<IngredientLine>,
}

impl Recipe {
    pub fn new(name: impl Into<String>, portions: i64) -> Self {
        Self {
            id: RecipeId::generate(),
            name: name.into(),
            portions,
            base_lines: Vec::new(),
            portion_lines: Vec::new(),
        }
    }

    pub fn with_base_line(mut self, ingredient_id: IngredientId, quantity: f64) -> Self {
        self.base_lines.push(IngredientLine::new(ingredient_id, quantity));
        self
    }

    pub fn with_portion_line(mut self, ingredient_id: IngredientId, quantity: f64) -> Self {
        self.portion_lines.push(IngredientLine::new(ingredient_id, quantity));
        self
    }

    /// All lines tagged with their kind, base lines first
    pub fn lines(&self) -> impl Iterator<Item = (LineKind, &IngredientLine)> {
        self.base_lines
            .iter()
            .map(|line| (LineKind::Base, line))
            .chain(self.portion_lines.iter().map(|line| (LineKind::Portion, line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_order_and_kind() {
        let flour = IngredientId::generate();
        let egg = IngredientId::generate();
        let recipe = Recipe::new("Brownie", 12)
            .with_base_line(flour, 500.0)
            .with_portion_line(egg, 1.0);

        let kinds: Vec<_> = recipe.lines().map(|(kind, line)| (kind, line.ingredient_id)).collect();
        assert_eq!(kinds, vec![(LineKind::Base, flour), (LineKind::Portion, egg)]);
    }

    #[test]
    fn test_recipe_record_deserialization() {
        let flour = IngredientId::generate();
        let json = serde_json::json!({
            "id": RecipeId::generate(),
            "name": "Cookie",
            "portions": "24",
            "baseLines": [{ "ingredientId": flour, "quantity": "250" }]
        });

        let recipe: Recipe = serde_json::from_value(json).expect("Failed to deserialize");
        assert_eq!(recipe.portions, 24);
        assert_eq!(recipe.base_lines[0].quantity, 250.0);
        assert_eq!(recipe.base_lines[0].cost, 0.0);
        assert!(recipe.portion_lines.is_empty());
    }
}
