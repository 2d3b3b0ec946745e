use chrono::NaiveDate;
use crumb_catalog::IngredientCostIndex;
use crumb_core::{CatalogRepository, ProductionRun, ProductionScheduleItem};
use crumb_shared::sanitize;
use crumb_shared::{IngredientId, RecipeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How much of an ingredient one recipe contributes to a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contribution {
    pub recipe_id: RecipeId,
    pub recipe_name: String,
    pub quantity: f64,
}

/// One consolidated purchase line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequirementLine {
    pub ingredient_id: IngredientId,
    pub name: String,
    pub unit: String,
    pub total_quantity: f64,

    /// `unit_cost * total_quantity` at current purchase prices
    pub estimated_cost: f64,
    pub contributions: Vec<Contribution>,

    /// The ingredient is referenced by a recipe but missing from the catalog
    pub stale: bool,
}

/// Ingredient requirements for a set of scheduled batches
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShoppingList {
    #[serde(default)]
    pub scheduled_for: Option<NaiveDate>,
    pub lines: Vec<RequirementLine>,
    pub estimated_total_cost: f64,

    /// Schedule items pointing at recipes that no longer exist
    pub unresolved_recipes: Vec<RecipeId>,
}

impl ShoppingList {
    pub fn line(&self, ingredient_id: &IngredientId) -> Option<&RequirementLine> {
        self.lines.iter().find(|line| &line.ingredient_id == ingredient_id)
    }
}

struct Accumulator {
    total_quantity: f64,
    contributions: Vec<Contribution>,
}

/// Expands scheduled recipes into ingredient quantities summed across the run.
///
/// Each recipe line is scaled by the item quantity (number of batches), base
/// and portion lines alike. Lines for the same ingredient merge into one entry
/// regardless of which recipe or schedule item they came from.
pub struct ProductionRequirementAggregator<'a> {
    catalog: &'a dyn CatalogRepository,
    ingredients: &'a IngredientCostIndex,
}

impl<'a> ProductionRequirementAggregator<'a> {
    pub fn new(catalog: &'a dyn CatalogRepository, ingredients: &'a IngredientCostIndex) -> Self {
        Self {
            catalog,
            ingredients,
        }
    }

    pub fn aggregate_run(&self, run: &ProductionRun) -> ShoppingList {
        ShoppingList {
            scheduled_for: run.scheduled_for,
            ..self.aggregate(&run.items)
        }
    }

    pub fn aggregate(&self, items: &[ProductionScheduleItem]) -> ShoppingList {
        let mut totals: HashMap<IngredientId, Accumulator> = HashMap::new();
        let mut unresolved_recipes = Vec::new();

        for item in items {
            let Some(recipe) = self.catalog.recipe(&item.recipe_id) else {
                tracing::warn!(recipe_id = %item.recipe_id, "Scheduled recipe not found, skipped");
                if !unresolved_recipes.contains(&item.recipe_id) {
                    unresolved_recipes.push(item.recipe_id);
                }
                continue;
            };

            let batches = sanitize::amount(item.quantity);
            for (_, line) in recipe.lines() {
                let quantity = sanitize::amount(line.quantity) * batches;
                let entry = totals.entry(line.ingredient_id).or_insert_with(|| Accumulator {
                    total_quantity: 0.0,
                    contributions: Vec::new(),
                });
                entry.total_quantity += quantity;

                match entry.contributions.iter_mut().find(|c| c.recipe_id == recipe.id) {
                    Some(contribution) => contribution.quantity += quantity,
                    None => entry.contributions.push(Contribution {
                        recipe_id: recipe.id,
                        recipe_name: recipe.name.clone(),
                        quantity,
                    }),
                }
            }
        }

        let mut lines: Vec<RequirementLine> = totals
            .into_iter()
            .map(|(ingredient_id, acc)| self.finish_line(ingredient_id, acc))
            .collect();
        lines.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.ingredient_id.cmp(&b.ingredient_id)));

        let estimated_total_cost = lines.iter().map(|line| line.estimated_cost).sum();

        tracing::debug!(
            items = items.len(),
            ingredients = lines.len(),
            estimated_total_cost,
            "Production requirements aggregated"
        );

        ShoppingList {
            scheduled_for: None,
            lines,
            estimated_total_cost,
            unresolved_recipes,
        }
    }

    fn finish_line(&self, ingredient_id: IngredientId, acc: Accumulator) -> RequirementLine {
        match self.ingredients.get(&ingredient_id) {
            Some(indexed) => RequirementLine {
                ingredient_id,
                name: indexed.name.clone(),
                unit: indexed.unit.clone(),
                total_quantity: acc.total_quantity,
                estimated_cost: indexed.unit_cost * acc.total_quantity,
                contributions: acc.contributions,
                stale: false,
            },
            None => {
                tracing::warn!(ingredient_id = %ingredient_id, "Required ingredient missing from catalog");
                RequirementLine {
                    ingredient_id,
                    name: ingredient_id.to_string(),
                    unit: String::new(),
                    total_quantity: acc.total_quantity,
                    estimated_cost: 0.0,
                    contributions: acc.contributions,
                    stale: true,
                }
            }
        }
    }
}
