use crate::recipe::RecipeCostEngine;
use crumb_catalog::{IngredientCostIndex, PackagingCostIndex};
use crumb_core::{CatalogRepository, Product};
use crumb_shared::sanitize;
use crumb_shared::{PackagingId, ProductId, RecipeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeLineCost {
    pub recipe_id: RecipeId,
    pub quantity: f64,
    pub unit_cost: f64,
    pub cost: f64,
    pub stale: bool,

    /// The recipe exists but cannot be costed per unit (no portions)
    pub recipe_invalid: bool,

    /// The recipe exists but some of its ingredients do not, so its unit cost is understated
    #[serde(default)]
    pub recipe_has_stale_lines: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PackagingLineCost {
    pub packaging_id: PackagingId,
    pub quantity: f64,
    pub unit_cost: f64,
    pub cost: f64,
    pub is_primary: bool,
    pub stale: bool,
}

/// Production cost of one product unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductCosts {
    pub product_id: ProductId,
    pub recipe_lines: Vec<RecipeLineCost>,
    pub packaging_lines: Vec<PackagingLineCost>,
    pub total_recipe_cost: f64,
    pub total_packaging_cost: f64,
    pub total_cost: f64,
    pub primary_packaging: Option<PackagingId>,
    /// Position of the primary line in `packaging_lines`
    #[serde(default)]
    pub primary_packaging_line: Option<usize>,
}

impl ProductCosts {
    /// Any line costed from missing data, including ingredients missing below a recipe
    pub fn has_stale_lines(&self) -> bool {
        self.recipe_lines.iter().any(|l| l.stale || l.recipe_has_stale_lines)
            || self.packaging_lines.iter().any(|l| l.stale)
    }

    /// Write line costs back onto the product and settle the primary flag
    pub fn apply_to(&self, product: &mut Product) {
        for (line, cost) in product.recipe_lines.iter_mut().zip(&self.recipe_lines) {
            line.cost = cost.cost;
        }
        for (line, cost) in product.packaging_lines.iter_mut().zip(&self.packaging_lines) {
            line.cost = cost.cost;
        }
        product.normalize_primary_packaging();
    }
}

/// Sums recipe and packaging contributions into a product's production cost.
///
/// Recipe unit costs are recomputed from the catalog on every call rather than
/// read from any cost stored on the recipe record.
pub struct ProductCostAggregator<'a> {
    catalog: &'a dyn CatalogRepository,
    recipes: RecipeCostEngine<'a>,
    packagings: &'a PackagingCostIndex,
}

impl<'a> ProductCostAggregator<'a> {
    pub fn new(
        catalog: &'a dyn CatalogRepository,
        ingredients: &'a IngredientCostIndex,
        packagings: &'a PackagingCostIndex,
    ) -> Self {
        Self {
            catalog,
            recipes: RecipeCostEngine::new(ingredients),
            packagings,
        }
    }

    pub fn compute(&self, product: &Product) -> ProductCosts {
        let recipe_lines: Vec<RecipeLineCost> = product
            .recipe_lines
            .iter()
            .map(|line| {
                let quantity = sanitize::amount(line.quantity);
                match self.catalog.recipe(&line.recipe_id) {
                    Some(recipe) => {
                        let costs = self.recipes.compute(recipe);
                        RecipeLineCost {
                            recipe_id: line.recipe_id,
                            quantity,
                            unit_cost: costs.unit_cost,
                            cost: costs.unit_cost * quantity,
                            stale: false,
                            recipe_invalid: !costs.per_unit_valid,
                            recipe_has_stale_lines: costs.has_stale_lines(),
                        }
                    }
                    None => {
                        tracing::warn!(
                            product_id = %product.id,
                            recipe_id = %line.recipe_id,
                            "Product references a missing recipe, line costed at 0"
                        );
                        RecipeLineCost {
                            recipe_id: line.recipe_id,
                            quantity,
                            unit_cost: 0.0,
                            cost: 0.0,
                            stale: true,
                            recipe_invalid: false,
                            recipe_has_stale_lines: false,
                        }
                    }
                }
            })
            .collect();

        let primary_packaging_line = product.primary_packaging_index();
        let packaging_lines: Vec<PackagingLineCost> = product
            .packaging_lines
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let quantity = sanitize::amount(line.quantity);
                let unit_cost = self.packagings.unit_cost(&line.packaging_id);
                if unit_cost.is_none() {
                    tracing::warn!(
                        product_id = %product.id,
                        packaging_id = %line.packaging_id,
                        "Product references missing packaging, line costed at 0"
                    );
                }
                let stale = unit_cost.is_none();
                let unit_cost = unit_cost.unwrap_or(0.0);
                let is_primary = Some(index) == primary_packaging_line;

                PackagingLineCost {
                    packaging_id: line.packaging_id,
                    quantity,
                    unit_cost,
                    cost: unit_cost * quantity,
                    is_primary,
                    stale,
                }
            })
            .collect();

        let total_recipe_cost: f64 = recipe_lines.iter().map(|l| l.cost).sum();
        let total_packaging_cost: f64 = packaging_lines.iter().map(|l| l.cost).sum();
        let total_cost = total_recipe_cost + total_packaging_cost;

        tracing::debug!(
            product_id = %product.id,
            total_recipe_cost,
            total_packaging_cost,
            total_cost,
            "Product costs recomputed"
        );

        ProductCosts {
            product_id: product.id,
            recipe_lines,
            packaging_lines,
            total_recipe_cost,
            total_packaging_cost,
            total_cost,
            primary_packaging: primary_packaging_line.map(|i| product.packaging_lines[i].packaging_id),
            primary_packaging_line,
        }
    }

    /// Recompute and write line costs back onto the product
    pub fn refresh(&self, product: &mut Product) -> ProductCosts {
        let costs = self.compute(product);
        costs.apply_to(product);
        costs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crumb_core::{Ingredient, Packaging, Recipe};
    use crumb_shared::IngredientId;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryCatalog {
        ingredients: HashMap<IngredientId, Ingredient>,
        recipes: HashMap<RecipeId, Recipe>,
        packagings: HashMap<PackagingId, Packaging>,
        products: HashMap<ProductId, Product>,
    }

    impl CatalogRepository for MemoryCatalog {
        fn ingredient(&self, id: &IngredientId) -> Option<&Ingredient> {
            self.ingredients.get(id)
        }
        fn recipe(&self, id: &RecipeId) -> Option<&Recipe> {
            self.recipes.get(id)
        }
        fn packaging(&self, id: &PackagingId) -> Option<&Packaging> {
            self.packagings.get(id)
        }
        fn product(&self, id: &ProductId) -> Option<&Product> {
            self.products.get(id)
        }
        fn ingredients(&self) -> Vec<&Ingredient> {
            self.ingredients.values().collect()
        }
        fn recipes(&self) -> Vec<&Recipe> {
            self.recipes.values().collect()
        }
        fn packagings(&self) -> Vec<&Packaging> {
            self.packagings.values().collect()
        }
        fn products(&self) -> Vec<&Product> {
            self.products.values().collect()
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    /// Recipe "Roll" with unit cost 1.50 and a box at 0.40
    fn fixture() -> (MemoryCatalog, RecipeId, PackagingId) {
        let flour = Ingredient::new("Flour", "kg", 5.0, 10.0);
        let wrapper = Ingredient::new("Wrapper", "un", 100.0, 50.0);
        let recipe = Recipe::new("Roll", 10)
            .with_base_line(flour.id, 5.0)
            .with_portion_line(wrapper.id, 1.0);
        let boxes = Packaging::new("Box", 25.0, 10.0);

        let mut catalog = MemoryCatalog::default();
        let ids = (recipe.id, boxes.id);
        catalog.ingredients.insert(flour.id, flour);
        catalog.ingredients.insert(wrapper.id, wrapper);
        catalog.recipes.insert(recipe.id, recipe);
        catalog.packagings.insert(boxes.id, boxes);
        (catalog, ids.0, ids.1)
    }

    #[test]
    fn test_recipe_only_product() {
        let (catalog, recipe_id, _) = fixture();
        let ingredients = IngredientCostIndex::from_repository(&catalog);
        let packagings = PackagingCostIndex::from_repository(&catalog);
        let aggregator = ProductCostAggregator::new(&catalog, &ingredients, &packagings);

        let mut product = Product::new("Roll pack");
        product.add_recipe_line(recipe_id, 10.0);

        let costs = aggregator.compute(&product);
        assert!(approx(costs.total_recipe_cost, 15.0));
        assert_eq!(costs.total_packaging_cost, 0.0);
        assert!(approx(costs.total_cost, 15.0));
        assert_eq!(costs.primary_packaging, None);
    }

    #[test]
    fn test_total_tracks_quantity_changes() {
        let (catalog, recipe_id, box_id) = fixture();
        let ingredients = IngredientCostIndex::from_repository(&catalog);
        let packagings = PackagingCostIndex::from_repository(&catalog);
        let aggregator = ProductCostAggregator::new(&catalog, &ingredients, &packagings);

        let mut product = Product::new("Roll pack");
        product.add_recipe_line(recipe_id, 4.0);
        product.add_packaging_line(box_id, 2.0);

        for quantity in [1.0, 3.0, 6.5] {
            product.recipe_lines[0].quantity = quantity;
            let costs = aggregator.refresh(&mut product);

            let line_sum: f64 = product.recipe_lines.iter().map(|l| l.cost).sum::<f64>()
                + product.packaging_lines.iter().map(|l| l.cost).sum::<f64>();
            assert!(approx(costs.total_cost, line_sum));
            assert!(approx(costs.total_cost, 1.5 * quantity + 0.8));
        }
    }

    #[test]
    fn test_dangling_references_are_stale() {
        let (catalog, recipe_id, box_id) = fixture();
        let ingredients = IngredientCostIndex::from_repository(&catalog);
        let packagings = PackagingCostIndex::from_repository(&catalog);
        let aggregator = ProductCostAggregator::new(&catalog, &ingredients, &packagings);

        let mut product = Product::new("Mixed");
        product.add_recipe_line(recipe_id, 2.0);
        product.add_recipe_line(RecipeId::generate(), 5.0);
        product.add_packaging_line(PackagingId::generate(), 1.0);
        product.add_packaging_line(box_id, 1.0);

        let costs = aggregator.compute(&product);
        assert!(costs.has_stale_lines());
        assert!(costs.recipe_lines[1].stale);
        assert!(costs.packaging_lines[0].stale);
        assert!(!costs.packaging_lines[1].stale);
        assert!(approx(costs.total_cost, 3.0 + 0.4));
    }

    #[test]
    fn test_first_packaging_reported_primary_when_unflagged() {
        let (catalog, _, box_id) = fixture();
        let ingredients = IngredientCostIndex::from_repository(&catalog);
        let packagings = PackagingCostIndex::from_repository(&catalog);
        let aggregator = ProductCostAggregator::new(&catalog, &ingredients, &packagings);

        let mut product = Product::new("Boxed");
        product.add_packaging_line(box_id, 1.0);
        product.packaging_lines[0].is_primary = false;

        let costs = aggregator.refresh(&mut product);
        assert_eq!(costs.primary_packaging, Some(box_id));
        assert!(costs.packaging_lines[0].is_primary);
        assert!(product.packaging_lines[0].is_primary);
    }

    #[test]
    fn test_recipe_without_portions_flagged() {
        let (mut catalog, recipe_id, _) = fixture();
        if let Some(recipe) = catalog.recipes.get_mut(&recipe_id) {
            recipe.portions = 0;
        }
        let ingredients = IngredientCostIndex::from_repository(&catalog);
        let packagings = PackagingCostIndex::from_repository(&catalog);
        let aggregator = ProductCostAggregator::new(&catalog, &ingredients, &packagings);

        let mut product = Product::new("Roll pack");
        product.add_recipe_line(recipe_id, 1.0);

        let costs = aggregator.compute(&product);
        assert!(costs.recipe_lines[0].recipe_invalid);
        assert!(approx(costs.total_cost, 0.5));
    }

    #[test]
    fn test_missing_ingredient_below_recipe_marks_product_stale() {
        let (mut catalog, recipe_id, _) = fixture();
        let wrapper_id = catalog.recipes[&recipe_id].portion_lines[0].ingredient_id;
        catalog.ingredients.remove(&wrapper_id);
        let ingredients = IngredientCostIndex::from_repository(&catalog);
        let packagings = PackagingCostIndex::from_repository(&catalog);
        let aggregator = ProductCostAggregator::new(&catalog, &ingredients, &packagings);

        let mut product = Product::new("Roll pack");
        product.add_recipe_line(recipe_id, 2.0);

        let costs = aggregator.compute(&product);
        let line = &costs.recipe_lines[0];
        assert!(!line.stale);
        assert!(line.recipe_has_stale_lines);
        assert!(costs.has_stale_lines());
        // Only the flour share is left in the unit cost
        assert!(approx(costs.total_cost, 2.0));
    }

    #[test]
    fn test_repeated_packaging_reports_flagged_line() {
        let (catalog, _, box_id) = fixture();
        let ingredients = IngredientCostIndex::from_repository(&catalog);
        let packagings = PackagingCostIndex::from_repository(&catalog);
        let aggregator = ProductCostAggregator::new(&catalog, &ingredients, &packagings);

        let mut product = Product::new("Double boxed");
        product.add_packaging_line(box_id, 1.0);
        product.add_packaging_line(box_id, 3.0);
        product.set_primary_packaging_at(1).unwrap();

        let costs = aggregator.compute(&product);
        assert!(!costs.packaging_lines[0].is_primary);
        assert!(costs.packaging_lines[1].is_primary);
        assert_eq!(costs.primary_packaging_line, Some(1));
        assert_eq!(costs.primary_packaging, Some(box_id));
    }
}
