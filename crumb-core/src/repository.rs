use crate::models::{Ingredient, Packaging, Product, Recipe};
use crumb_shared::{IngredientId, PackagingId, ProductId, RecipeId};

/// Read-only access to a catalog snapshot.
///
/// The costing stages never write through this trait; a missing record is a
/// dangling reference, which callers treat as a zero-cost stale line.
pub trait CatalogRepository: Send + Sync {
    fn ingredient(&self, id: &IngredientId) -> Option<&Ingredient>;

    fn recipe(&self, id: &RecipeId) -> Option<&Recipe>;

    fn packaging(&self, id: &PackagingId) -> Option<&Packaging>;

    fn product(&self, id: &ProductId) -> Option<&Product>;

    fn ingredients(&self) -> Vec<&Ingredient>;

    fn recipes(&self) -> Vec<&Recipe>;

    fn packagings(&self) -> Vec<&Packaging>;

    fn products(&self) -> Vec<&Product>;
}
