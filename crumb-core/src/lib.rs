pub mod models;
pub mod repository;

pub use models::{
    Ingredient, IngredientLine, LineKind, Packaging, PackagingError, Product,
    ProductPackagingLine, ProductRecipeLine, ProductionRun, ProductionScheduleItem, Recipe,
};
pub use repository::CatalogRepository;

