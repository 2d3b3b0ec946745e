use crate::models::{
    Fee, FeeStep, PriceAuthority, PricingConfiguration, PricingIssue, PricingResult,
    ResolvedIndirectCost,
};
use crumb_costing::ProductCosts;
use crumb_shared::sanitize;
use crumb_shared::ProductId;
use serde::{Deserialize, Serialize};

/// Starting values for configurations created from scratch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingDefaults {
    pub margin_percentage: f64,
    pub wastage_percentage: f64,
    pub fees: Vec<Fee>,
}

impl Default for PricingDefaults {
    fn default() -> Self {
        Self {
            margin_percentage: 30.0,
            wastage_percentage: 0.0,
            fees: Vec::new(),
        }
    }
}

/// Cost-plus pricing engine
pub struct PricingEngine {
    defaults: PricingDefaults,
}

impl PricingEngine {
    pub fn new(defaults: PricingDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &PricingDefaults {
        &self.defaults
    }

    /// Fresh configuration for a product whose base cost is not known yet
    pub fn seed(&self, product_id: ProductId, base_cost: f64) -> PricingConfiguration {
        PricingConfiguration {
            wastage_percentage: self.defaults.wastage_percentage,
            authority: PriceAuthority::Margin(self.defaults.margin_percentage),
            fees: self.defaults.fees.clone(),
            ..PricingConfiguration::new(product_id, base_cost)
        }
    }

    /// Fresh configuration with the base cost taken from computed product costs
    pub fn seed_from_costs(&self, costs: &ProductCosts) -> PricingConfiguration {
        let mut config = self.seed(costs.product_id, costs.total_cost);
        config.packaging_cost = costs.total_packaging_cost;
        config
    }

    pub fn recompute(&self, config: &PricingConfiguration) -> PricingResult {
        recompute(config)
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        Self::new(PricingDefaults::default())
    }
}

/// Price one configuration.
///
/// Pure and idempotent: the same configuration always produces the same
/// result, and nothing outside the returned value is touched.
pub fn recompute(config: &PricingConfiguration) -> PricingResult {
    let base_cost = sanitize::amount(config.base_cost);

    // 1. Indirect costs
    let indirect_costs: Vec<ResolvedIndirectCost> = config
        .indirect
        .iter()
        .map(|(term, cost)| ResolvedIndirectCost {
            term,
            cost: *cost,
            actual: cost.resolve(base_cost),
        })
        .collect();
    let total_indirect_cost: f64 = indirect_costs.iter().map(|c| c.actual).sum();

    // 2. Wastage
    let wastage_percentage = sanitize::share_percentage(config.wastage_percentage);
    let loaded_cost = base_cost + total_indirect_cost;
    let cost_with_wastage = loaded_cost * (1.0 + wastage_percentage / 100.0);

    // 3. Margin / price solve
    let mut issues = Vec::new();
    let (selling_price, margin_percentage) = match config.authority {
        PriceAuthority::Margin(target) => {
            let margin = sanitize::share_percentage(target);
            if margin >= 100.0 {
                tracing::warn!(
                    product_id = %config.product_id,
                    margin,
                    "Target margin of 100% or more has no selling price"
                );
                issues.push(PricingIssue::MarginAtOrAbove100 {
                    margin_percentage: margin,
                });
                (0.0, margin)
            } else {
                (cost_with_wastage / (1.0 - margin / 100.0), margin)
            }
        }
        PriceAuthority::Price(price) => {
            let price = sanitize::amount(price);
            if price == 0.0 {
                issues.push(PricingIssue::ZeroSellingPrice);
                (0.0, 0.0)
            } else {
                (price, (price - cost_with_wastage) / price * 100.0)
            }
        }
    };

    // 4. Fee cascade
    let fee_steps = apply_fees(selling_price, &config.fees);
    let final_price = fee_steps.last().map_or(selling_price, |step| step.price_after);

    // 5. Profitability
    let profit = selling_price - cost_with_wastage;
    let profit_margin_percentage = if selling_price > 0.0 {
        profit / selling_price * 100.0
    } else {
        0.0
    };
    let markup_percentage = if cost_with_wastage > 0.0 {
        profit / cost_with_wastage * 100.0
    } else {
        0.0
    };

    let finite = [
        total_indirect_cost,
        cost_with_wastage,
        selling_price,
        margin_percentage,
        final_price,
        profit,
        profit_margin_percentage,
        markup_percentage,
    ]
    .iter()
    .chain(fee_steps.iter().map(|step| &step.price_after))
    .all(|value| value.is_finite());

    if !finite {
        tracing::warn!(
            product_id = %config.product_id,
            "Pricing figures overflowed, derived values reset to 0"
        );
        issues.push(PricingIssue::NonFiniteResult);
        return PricingResult {
            product_id: config.product_id,
            mode: config.authority.mode(),
            base_cost,
            indirect_costs: indirect_costs
                .into_iter()
                .map(|c| ResolvedIndirectCost {
                    actual: finite_or_zero(c.actual),
                    ..c
                })
                .collect(),
            total_indirect_cost: 0.0,
            wastage_percentage,
            wastage_cost: 0.0,
            cost_with_wastage: 0.0,
            selling_price: 0.0,
            margin_percentage: finite_or_zero(margin_percentage),
            fee_steps: fee_steps
                .into_iter()
                .map(|step| FeeStep {
                    price_before: 0.0,
                    price_after: 0.0,
                    ..step
                })
                .collect(),
            final_price: 0.0,
            total_fees: 0.0,
            profit: 0.0,
            profit_margin_percentage: 0.0,
            markup_percentage: 0.0,
            issues,
        };
    }

    if selling_price > 0.0 && profit < 0.0 {
        issues.push(PricingIssue::BelowCost { shortfall: -profit });
    }

    tracing::debug!(
        product_id = %config.product_id,
        cost_with_wastage,
        selling_price,
        final_price,
        profit,
        "Pricing recomputed"
    );

    PricingResult {
        product_id: config.product_id,
        mode: config.authority.mode(),
        base_cost,
        indirect_costs,
        total_indirect_cost,
        wastage_percentage,
        wastage_cost: cost_with_wastage - loaded_cost,
        cost_with_wastage,
        selling_price,
        margin_percentage,
        total_fees: final_price - selling_price,
        fee_steps,
        final_price,
        profit,
        profit_margin_percentage,
        markup_percentage,
        issues,
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Compound fees in the configured order: `p_i = p_{i-1} * (1 + fee_i / 100)`
fn apply_fees(selling_price: f64, fees: &[Fee]) -> Vec<FeeStep> {
    let mut price = selling_price;
    fees.iter()
        .map(|fee| {
            let percentage = sanitize::share_percentage(fee.percentage);
            let price_before = price;
            price *= 1.0 + percentage / 100.0;
            FeeStep {
                name: fee.name.clone(),
                percentage,
                price_before,
                price_after: price,
            }
        })
        .collect()
}
