use crumb_shared::sanitize;
use crumb_shared::ProductId;
use serde::{Deserialize, Serialize};

/// An indirect cost, either a flat amount or a share of the base cost
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IndirectCost {
    Fixed { amount: f64 },
    PercentageOfBase { percentage: f64 },
}

impl IndirectCost {
    pub const fn fixed(amount: f64) -> Self {
        Self::Fixed { amount }
    }

    pub const fn percentage_of_base(percentage: f64) -> Self {
        Self::PercentageOfBase { percentage }
    }

    /// Currency amount this term adds on top of `base_cost`.
    ///
    /// Percentages of base are not capped: overhead may exceed the base.
    pub fn resolve(&self, base_cost: f64) -> f64 {
        match *self {
            Self::Fixed { amount } => sanitize::amount(amount),
            Self::PercentageOfBase { percentage } => {
                sanitize::amount(base_cost) * sanitize::amount(percentage) / 100.0
            }
        }
    }

    /// The raw number as entered, whatever its kind
    pub fn value(&self) -> f64 {
        match *self {
            Self::Fixed { amount } => amount,
            Self::PercentageOfBase { percentage } => percentage,
        }
    }
}

impl Default for IndirectCost {
    fn default() -> Self {
        Self::fixed(0.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IndirectTerm {
    Labor,
    Overhead,
    Marketing,
    Delivery,
    Other,
}

impl IndirectTerm {
    pub const ALL: [IndirectTerm; 5] = [
        IndirectTerm::Labor,
        IndirectTerm::Overhead,
        IndirectTerm::Marketing,
        IndirectTerm::Delivery,
        IndirectTerm::Other,
    ];
}

/// The five indirect cost terms of a pricing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IndirectCosts {
    #[serde(default)]
    pub labor: IndirectCost,
    #[serde(default)]
    pub overhead: IndirectCost,
    #[serde(default)]
    pub marketing: IndirectCost,
    #[serde(default)]
    pub delivery: IndirectCost,
    #[serde(default)]
    pub other: IndirectCost,
}

impl IndirectCosts {
    pub fn get(&self, term: IndirectTerm) -> &IndirectCost {
        match term {
            IndirectTerm::Labor => &self.labor,
            IndirectTerm::Overhead => &self.overhead,
            IndirectTerm::Marketing => &self.marketing,
            IndirectTerm::Delivery => &self.delivery,
            IndirectTerm::Other => &self.other,
        }
    }

    pub fn set(&mut self, term: IndirectTerm, cost: IndirectCost) {
        let slot = match term {
            IndirectTerm::Labor => &mut self.labor,
            IndirectTerm::Overhead => &mut self.overhead,
            IndirectTerm::Marketing => &mut self.marketing,
            IndirectTerm::Delivery => &mut self.delivery,
            IndirectTerm::Other => &mut self.other,
        };
        *slot = cost;
    }

    pub fn iter(&self) -> impl Iterator<Item = (IndirectTerm, &IndirectCost)> {
        IndirectTerm::ALL.into_iter().map(move |term| (term, self.get(term)))
    }
}

/// Which input the user is steering the price with
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Margin,
    Price,
}

/// The one authoritative pricing input.
///
/// The counterpart (price for a margin, margin for a price) is always derived
/// by the engine and never stored here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum PriceAuthority {
    /// Target profit as a percentage of selling price
    Margin(f64),
    /// Explicit selling price before fees
    Price(f64),
}

impl PriceAuthority {
    pub fn mode(&self) -> EditMode {
        match self {
            Self::Margin(_) => EditMode::Margin,
            Self::Price(_) => EditMode::Price,
        }
    }
}

impl Default for PriceAuthority {
    fn default() -> Self {
        Self::Margin(0.0)
    }
}

/// A proportional surcharge applied on top of the running price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fee {
    pub name: String,
    #[serde(default, deserialize_with = "sanitize::lenient_f64")]
    pub percentage: f64,
}

impl Fee {
    pub fn new(name: impl Into<String>, percentage: f64) -> Self {
        Self {
            name: name.into(),
            percentage,
        }
    }
}

/// Everything the engine needs to price one product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingConfiguration {
    pub product_id: ProductId,

    /// Production cost per unit; seeded from the product's total cost but
    /// freely overridable
    pub base_cost: f64,

    /// Packaging share already contained in `base_cost`, kept for display
    #[serde(default)]
    pub packaging_cost: f64,

    #[serde(default)]
    pub indirect: IndirectCosts,
    #[serde(default)]
    pub wastage_percentage: f64,
    #[serde(default)]
    pub authority: PriceAuthority,

    /// Applied in order, each on top of the previous result
    #[serde(default)]
    pub fees: Vec<Fee>,
}

impl PricingConfiguration {
    pub fn new(product_id: ProductId, base_cost: f64) -> Self {
        Self {
            product_id,
            base_cost,
            packaging_cost: 0.0,
            indirect: IndirectCosts::default(),
            wastage_percentage: 0.0,
            authority: PriceAuthority::default(),
            fees: Vec::new(),
        }
    }

    pub fn with_indirect(mut self, term: IndirectTerm, cost: IndirectCost) -> Self {
        self.indirect.set(term, cost);
        self
    }

    pub fn with_wastage(mut self, percentage: f64) -> Self {
        self.wastage_percentage = percentage;
        self
    }

    pub fn with_margin(mut self, percentage: f64) -> Self {
        self.authority = PriceAuthority::Margin(percentage);
        self
    }

    pub fn with_price(mut self, selling_price: f64) -> Self {
        self.authority = PriceAuthority::Price(selling_price);
        self
    }

    pub fn with_fee(mut self, name: impl Into<String>, percentage: f64) -> Self {
        self.fees.push(Fee::new(name, percentage));
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedIndirectCost {
    pub term: IndirectTerm,
    pub cost: IndirectCost,
    pub actual: f64,
}

/// The running price after one fee of the cascade
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeeStep {
    pub name: String,
    pub percentage: f64,
    pub price_before: f64,
    pub price_after: f64,
}

/// Conditions a caller may need to tell apart from a legitimate zero
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum PricingIssue {
    /// A margin of 100% or more has no finite selling price; price forced to 0
    MarginAtOrAbove100 { margin_percentage: f64 },
    /// Price mode with a zero price; margin forced to 0
    ZeroSellingPrice,
    /// Selling price is below the loaded cost
    BelowCost { shortfall: f64 },
    /// Inputs too large to price; every derived figure forced to 0
    NonFiniteResult,
}

impl PricingIssue {
    /// Whether the configuration itself is unusable, not just unprofitable
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            Self::MarginAtOrAbove100 { .. } | Self::ZeroSellingPrice | Self::NonFiniteResult
        )
    }
}

/// Output of one recomputation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingResult {
    pub product_id: ProductId,
    pub mode: EditMode,

    pub base_cost: f64,
    pub indirect_costs: Vec<ResolvedIndirectCost>,
    pub total_indirect_cost: f64,
    pub wastage_percentage: f64,
    pub wastage_cost: f64,

    /// Fully loaded unit cost; every ratio below is taken against it
    pub cost_with_wastage: f64,

    /// Recommended price before fees
    pub selling_price: f64,
    /// Authoritative target in margin mode, back-computed in price mode
    pub margin_percentage: f64,

    pub fee_steps: Vec<FeeStep>,
    pub final_price: f64,
    pub total_fees: f64,

    pub profit: f64,
    pub profit_margin_percentage: f64,
    pub markup_percentage: f64,

    pub issues: Vec<PricingIssue>,
}

impl PricingResult {
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(PricingIssue::is_invalid_configuration)
    }

    /// The authority that reproduces this result from the other side
    pub fn counterpart(&self) -> PriceAuthority {
        match self.mode {
            EditMode::Margin => PriceAuthority::Price(self.selling_price),
            EditMode::Price => PriceAuthority::Margin(self.margin_percentage),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indirect_cost_resolution() {
        assert_eq!(IndirectCost::fixed(3.5).resolve(20.0), 3.5);
        assert_eq!(IndirectCost::percentage_of_base(10.0).resolve(20.0), 2.0);
        assert_eq!(IndirectCost::percentage_of_base(150.0).resolve(10.0), 15.0);
        assert_eq!(IndirectCost::fixed(-2.0).resolve(20.0), 0.0);
        assert_eq!(IndirectCost::fixed(f64::NAN).resolve(20.0), 0.0);
    }

    #[test]
    fn test_indirect_cost_serialization_is_tagged() {
        let json = serde_json::to_value(IndirectCost::percentage_of_base(12.0)).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "percentageOfBase", "percentage": 12.0 }));

        let parsed: IndirectCost =
            serde_json::from_value(serde_json::json!({ "kind": "fixed", "amount": 4 })).unwrap();
        assert_eq!(parsed, IndirectCost::fixed(4.0));
    }

    #[test]
    fn test_indirect_costs_set_and_iter() {
        let mut costs = IndirectCosts::default();
        costs.set(IndirectTerm::Delivery, IndirectCost::fixed(1.25));

        let terms: Vec<_> = costs.iter().map(|(term, _)| term).collect();
        assert_eq!(terms, IndirectTerm::ALL.to_vec());
        assert_eq!(costs.get(IndirectTerm::Delivery), &IndirectCost::fixed(1.25));
    }

    #[test]
    fn test_authority_mode() {
        assert_eq!(PriceAuthority::Margin(30.0).mode(), EditMode::Margin);
        assert_eq!(PriceAuthority::Price(12.0).mode(), EditMode::Price);

        let json = serde_json::to_value(PriceAuthority::Price(12.0)).unwrap();
        assert_eq!(json, serde_json::json!({ "mode": "price", "value": 12.0 }));
    }
}
