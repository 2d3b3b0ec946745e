use crumb_catalog::IngredientCostIndex;
use crumb_core::{IngredientLine, LineKind, Recipe};
use crumb_shared::sanitize;
use crumb_shared::{IngredientId, RecipeId};
use serde::{Deserialize, Serialize};

/// Cost of a single recipe line at current ingredient prices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineCost {
    pub kind: LineKind,
    pub ingredient_id: IngredientId,
    pub quantity: f64,
    pub unit_cost: f64,
    pub cost: f64,

    /// The referenced ingredient no longer exists; cost was taken as 0
    pub stale: bool,
}

/// Derived figures for one recipe batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeCosts {
    pub recipe_id: RecipeId,
    pub portions: i64,
    pub lines: Vec<LineCost>,
    pub total_base_cost: f64,
    pub portion_cost: f64,
    pub base_per_portion_cost: f64,
    pub unit_cost: f64,
    pub total_cost: f64,

    /// False when `portions < 1`; `unit_cost` then excludes the base share
    /// while `total_cost` is still meaningful.
    pub per_unit_valid: bool,
}

impl RecipeCosts {
    pub fn stale_lines(&self) -> impl Iterator<Item = &LineCost> {
        self.lines.iter().filter(|line| line.stale)
    }

    pub fn has_stale_lines(&self) -> bool {
        self.lines.iter().any(|line| line.stale)
    }

    /// Write the derived line costs back onto the recipe record
    pub fn apply_to(&self, recipe: &mut Recipe) {
        let mut base = self.lines.iter().filter(|l| l.kind == LineKind::Base);
        for line in &mut recipe.base_lines {
            if let Some(cost) = base.next() {
                line.cost = cost.cost;
            }
        }

        let mut portion = self.lines.iter().filter(|l| l.kind == LineKind::Portion);
        for line in &mut recipe.portion_lines {
            if let Some(cost) = portion.next() {
                line.cost = cost.cost;
            }
        }
    }
}

/// Turns recipe composition into batch and per-unit costs.
///
/// Every call recomputes from the index it was built with; purchase prices
/// change independently of recipes, so no result is cached.
pub struct RecipeCostEngine<'a> {
    ingredients: &'a IngredientCostIndex,
}

impl<'a> RecipeCostEngine<'a> {
    pub fn new(ingredients: &'a IngredientCostIndex) -> Self {
        Self { ingredients }
    }

    pub fn compute(&self, recipe: &Recipe) -> RecipeCosts {
        let lines: Vec<LineCost> = recipe
            .lines()
            .map(|(kind, line)| self.cost_line(recipe, kind, line))
            .collect();

        let total_base_cost: f64 = lines
            .iter()
            .filter(|l| l.kind == LineKind::Base)
            .map(|l| l.cost)
            .sum();
        let portion_cost: f64 = lines
            .iter()
            .filter(|l| l.kind == LineKind::Portion)
            .map(|l| l.cost)
            .sum();

        let per_unit_valid = recipe.portions >= 1;
        let base_per_portion_cost = if per_unit_valid {
            total_base_cost / recipe.portions as f64
        } else {
            tracing::warn!(
                recipe_id = %recipe.id,
                portions = recipe.portions,
                "Recipe has no portions, per-unit cost excludes the base share"
            );
            0.0
        };

        let unit_cost = base_per_portion_cost + portion_cost;
        let total_cost = total_base_cost + portion_cost * recipe.portions.max(0) as f64;

        tracing::debug!(
            recipe_id = %recipe.id,
            total_base_cost,
            portion_cost,
            unit_cost,
            total_cost,
            "Recipe costs recomputed"
        );

        RecipeCosts {
            recipe_id: recipe.id,
            portions: recipe.portions,
            lines,
            total_base_cost,
            portion_cost,
            base_per_portion_cost,
            unit_cost,
            total_cost,
            per_unit_valid,
        }
    }

    /// Recompute and write line costs back onto the recipe in one step
    pub fn refresh(&self, recipe: &mut Recipe) -> RecipeCosts {
        let costs = self.compute(recipe);
        costs.apply_to(recipe);
        costs
    }

    fn cost_line(&self, recipe: &Recipe, kind: LineKind, line: &IngredientLine) -> LineCost {
        let quantity = sanitize::amount(line.quantity);
        let (unit_cost, stale) = match self.ingredients.unit_cost(&line.ingredient_id) {
            Some(cost) => (cost, false),
            None => {
                tracing::warn!(
                    recipe_id = %recipe.id,
                    ingredient_id = %line.ingredient_id,
                    "Recipe references a missing ingredient, line costed at 0"
                );
                (0.0, true)
            }
        };

        LineCost {
            kind,
            ingredient_id: line.ingredient_id,
            quantity,
            unit_cost,
            cost: unit_cost * quantity,
            stale,
        }
    }
}
