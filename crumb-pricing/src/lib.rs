pub mod batch;
pub mod engine;
pub mod models;
pub mod record;
pub mod session;

pub use batch::{reprice_all, BatchOutcome};
pub use engine::{recompute, PricingDefaults, PricingEngine};
pub use models::{
    EditMode, Fee, FeeStep, IndirectCost, IndirectCosts, IndirectTerm, PriceAuthority,
    PricingConfiguration, PricingIssue, PricingResult, ResolvedIndirectCost,
};
pub use record::{CostType, PricingRecord};
pub use session::{PricingEdit, PricingSession, SessionError};
