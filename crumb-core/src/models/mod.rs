pub mod ingredient;
pub mod packaging;
pub mod product;
pub mod recipe;
pub mod schedule;

pub use ingredient::Ingredient;
pub use packaging::Packaging;
pub use product::{PackagingError, Product, ProductPackagingLine, ProductRecipeLine};
pub use recipe::{IngredientLine, LineKind, Recipe};
pub use schedule::{ProductionRun, ProductionScheduleItem};
