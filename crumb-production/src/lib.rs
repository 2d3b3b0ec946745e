pub mod requirements;

pub use requirements::{
    Contribution, ProductionRequirementAggregator, RequirementLine, ShoppingList,
};
