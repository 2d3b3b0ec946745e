pub mod cost_index;

pub use cost_index::{
    ingredient_unit_cost, packaging_unit_cost, CostIndex, IndexedCost, IngredientCostIndex,
    PackagingCostIndex,
};
