pub mod product;
pub mod recipe;

pub use product::{PackagingLineCost, ProductCostAggregator, ProductCosts, RecipeLineCost};
pub use recipe::{LineCost, RecipeCostEngine, RecipeCosts};
