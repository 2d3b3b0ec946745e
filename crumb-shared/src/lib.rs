pub mod ids;
pub mod sanitize;

pub use ids::{IngredientId, PackagingId, ProductId, RecipeId};
