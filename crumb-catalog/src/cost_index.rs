use crumb_core::{CatalogRepository, Ingredient, Packaging};
use crumb_shared::sanitize;
use crumb_shared::{IngredientId, PackagingId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Cost of one unit bought in bulk.
///
/// A non-positive bulk quantity is a data-entry error; it yields 0 rather
/// than an infinite unit cost.
fn bulk_unit_cost(bulk_price: f64, bulk_quantity: f64) -> f64 {
    let quantity = sanitize::amount(bulk_quantity);
    if quantity <= 0.0 {
        return 0.0;
    }
    sanitize::ratio(sanitize::amount(bulk_price), quantity)
}

/// `packagePrice / packageQuantity`, or 0 when the package quantity is not positive
pub fn ingredient_unit_cost(ingredient: &Ingredient) -> f64 {
    bulk_unit_cost(ingredient.package_price, ingredient.package_quantity)
}

/// `bulkPrice / bulkQuantity`, or 0 when the bulk quantity is not positive
pub fn packaging_unit_cost(packaging: &Packaging) -> f64 {
    bulk_unit_cost(packaging.bulk_price, packaging.bulk_quantity)
}

/// Snapshot of one indexed record's derived cost
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedCost {
    pub name: String,
    pub unit: String,
    pub unit_cost: f64,
}

/// In-memory unit cost lookup keyed by record id.
///
/// The index holds derived values only. Rebuild or re-index a record after
/// every edit of its purchase data; nothing here is refreshed implicitly.
#[derive(Debug, Clone)]
pub struct CostIndex<K> {
    entries: HashMap<K, IndexedCost>,
}

pub type IngredientCostIndex = CostIndex<IngredientId>;
pub type PackagingCostIndex = CostIndex<PackagingId>;

impl<K> CostIndex<K>
where
    K: Eq + Hash + Copy,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Unit cost for a record, `None` when the id is not indexed
    pub fn unit_cost(&self, id: &K) -> Option<f64> {
        self.entries.get(id).map(|entry| entry.unit_cost)
    }

    pub fn get(&self, id: &K) -> Option<&IndexedCost> {
        self.entries.get(id)
    }

    pub fn remove(&mut self, id: &K) -> Option<IndexedCost> {
        self.entries.remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K> Default for CostIndex<K>
where
    K: Eq + Hash + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

impl CostIndex<IngredientId> {
    pub fn from_ingredients<'a>(ingredients: impl IntoIterator<Item = &'a Ingredient>) -> Self {
        let mut index = Self::new();
        for ingredient in ingredients {
            index.index_ingredient(ingredient);
        }
        index
    }

    pub fn from_repository(repository: &dyn CatalogRepository) -> Self {
        Self::from_ingredients(repository.ingredients())
    }

    /// Insert or refresh one ingredient
    pub fn index_ingredient(&mut self, ingredient: &Ingredient) {
        if ingredient.package_quantity <= 0.0 {
            tracing::warn!(
                ingredient_id = %ingredient.id,
                package_quantity = ingredient.package_quantity,
                "Ingredient has no usable package quantity, unit cost forced to 0"
            );
        }

        self.entries.insert(
            ingredient.id,
            IndexedCost {
                name: ingredient.name.clone(),
                unit: ingredient.unit.clone(),
                unit_cost: ingredient_unit_cost(ingredient),
            },
        );
    }
}

impl CostIndex<PackagingId> {
    pub fn from_packagings<'a>(packagings: impl IntoIterator<Item = &'a Packaging>) -> Self {
        let mut index = Self::new();
        for packaging in packagings {
            index.index_packaging(packaging);
        }
        index
    }

    pub fn from_repository(repository: &dyn CatalogRepository) -> Self {
        Self::from_packagings(repository.packagings())
    }

    pub fn index_packaging(&mut self, packaging: &Packaging) {
        self.entries.insert(
            packaging.id,
            IndexedCost {
                name: packaging.name.clone(),
                unit: String::from("un"),
                unit_cost: packaging_unit_cost(packaging),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingredient_unit_cost() {
        let sugar = Ingredient::new("Sugar", "g", 1000.0, 5.0);
        assert!((ingredient_unit_cost(&sugar) - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_zero_package_quantity_is_guarded() {
        let broken = Ingredient::new("Cocoa", "g", 0.0, 30.0);
        assert_eq!(ingredient_unit_cost(&broken), 0.0);

        let negative = Ingredient::new("Cocoa", "g", -10.0, 30.0);
        assert_eq!(ingredient_unit_cost(&negative), 0.0);
    }

    #[test]
    fn test_negative_price_reads_as_free() {
        let odd = Ingredient::new("Salt", "g", 100.0, -4.0);
        assert_eq!(ingredient_unit_cost(&odd), 0.0);
    }

    #[test]
    fn test_index_reflects_latest_purchase_price() {
        let mut butter = Ingredient::new("Butter", "g", 200.0, 8.0);
        let mut index = IngredientCostIndex::from_ingredients([&butter]);
        assert_eq!(index.unit_cost(&butter.id), Some(0.04));

        butter.package_price = 10.0;
        index.index_ingredient(&butter);
        assert_eq!(index.unit_cost(&butter.id), Some(0.05));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_missing_ingredient_is_none() {
        let index = IngredientCostIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.unit_cost(&IngredientId::generate()), None);
    }

    #[test]
    fn test_packaging_index() {
        let boxes = Packaging::new("Kraft box", 50.0, 25.0);
        let index = PackagingCostIndex::from_packagings([&boxes]);
        assert_eq!(index.unit_cost(&boxes.id), Some(0.5));
        assert_eq!(index.get(&boxes.id).map(|e| e.name.as_str()), Some("Kraft box"));
    }
}
