//! Persisted shape of a pricing configuration.
//!
//! The record keeps the flat, loosely typed layout used by the storage layer:
//! cost kinds as strings, platform and tax fees as fixed columns, and the
//! engine outputs written back next to the inputs. An optional ordered `fees`
//! list takes precedence over the fixed fee columns when present, so that any
//! fee sequence round-trips exactly.

use crate::models::{
    EditMode, Fee, IndirectCost, IndirectCosts, PriceAuthority, PricingConfiguration,
    PricingResult,
};
use crumb_shared::sanitize::{lenient_f64, parse_numeric};
use crumb_shared::ProductId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const PLATFORM_FEE: &str = "platform";
pub const TAX_FEE: &str = "tax";

/// How a stored indirect cost value is interpreted
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CostType {
    #[default]
    Fixed,
    Percentage,
}

impl<'de> Deserialize<'de> for CostType {
    /// Unknown or missing kinds read as fixed amounts
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let kind = raw.as_str().map(|s| s.trim().to_ascii_lowercase());
        Ok(match kind.as_deref() {
            Some("percentage" | "percent" | "percentageofbase" | "percentage_of_base") => Self::Percentage,
            _ => Self::Fixed,
        })
    }
}

impl CostType {
    fn build(self, value: f64) -> IndirectCost {
        match self {
            Self::Fixed => IndirectCost::fixed(value),
            Self::Percentage => IndirectCost::percentage_of_base(value),
        }
    }

    fn of(cost: &IndirectCost) -> Self {
        match cost {
            IndirectCost::Fixed { .. } => Self::Fixed,
            IndirectCost::PercentageOfBase { .. } => Self::Percentage,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingRecord {
    pub product_id: ProductId,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub base_cost: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub packaging_cost: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub labor_cost: f64,
    #[serde(default)]
    pub labor_cost_type: CostType,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub overhead_cost: f64,
    #[serde(default)]
    pub overhead_cost_type: CostType,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub marketing_cost: f64,
    #[serde(default)]
    pub marketing_cost_type: CostType,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub delivery_cost: f64,
    #[serde(default)]
    pub delivery_cost_type: CostType,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub other_costs: f64,
    #[serde(default)]
    pub other_cost_type: CostType,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub wastage_percentage: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub margin_percentage: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub platform_fee_percentage: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub tax_percentage: f64,

    #[serde(default)]
    pub edit_mode: EditMode,
    /// Authoritative price in price mode
    #[serde(default, deserialize_with = "lenient_option")]
    pub selling_price: Option<f64>,
    /// Full ordered fee list; overrides the platform/tax columns when non-empty
    #[serde(default)]
    pub fees: Vec<Fee>,

    // Outputs
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_unit_cost: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ideal_price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub final_price: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub unit_profit: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub actual_margin: f64,
}

fn lenient_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Null => None,
        other => Some(parse_numeric(&other)),
    })
}

impl PricingRecord {
    /// Typed configuration described by this record's inputs
    pub fn to_config(&self) -> PricingConfiguration {
        let indirect = IndirectCosts {
            labor: self.labor_cost_type.build(self.labor_cost),
            overhead: self.overhead_cost_type.build(self.overhead_cost),
            marketing: self.marketing_cost_type.build(self.marketing_cost),
            delivery: self.delivery_cost_type.build(self.delivery_cost),
            other: self.other_cost_type.build(self.other_costs),
        };

        let authority = match self.edit_mode {
            EditMode::Margin => PriceAuthority::Margin(self.margin_percentage),
            // Older records without an explicit price fall back to the last ideal price
            EditMode::Price => PriceAuthority::Price(self.selling_price.unwrap_or(self.ideal_price)),
        };

        let fees = if self.fees.is_empty() {
            vec![
                Fee::new(PLATFORM_FEE, self.platform_fee_percentage),
                Fee::new(TAX_FEE, self.tax_percentage),
            ]
        } else {
            self.fees.clone()
        };

        PricingConfiguration {
            product_id: self.product_id,
            base_cost: self.base_cost,
            packaging_cost: self.packaging_cost,
            indirect,
            wastage_percentage: self.wastage_percentage,
            authority,
            fees,
        }
    }

    /// Record holding a configuration and the outputs computed from it
    pub fn from_parts(config: &PricingConfiguration, result: &PricingResult) -> Self {
        let fee = |name: &str| {
            config
                .fees
                .iter()
                .find(|fee| fee.name.eq_ignore_ascii_case(name))
                .map_or(0.0, |fee| fee.percentage)
        };
        let indirect = &config.indirect;

        // Fixed columns alone reproduce exactly [platform, tax]; anything else
        // needs the ordered list.
        let columns_suffice = config.fees.len() == 2
            && config.fees[0].name.eq_ignore_ascii_case(PLATFORM_FEE)
            && config.fees[1].name.eq_ignore_ascii_case(TAX_FEE);

        let (edit_mode, selling_price) = match config.authority {
            PriceAuthority::Margin(_) => (EditMode::Margin, None),
            PriceAuthority::Price(price) => (EditMode::Price, Some(price)),
        };

        Self {
            product_id: config.product_id,
            base_cost: config.base_cost,
            packaging_cost: config.packaging_cost,
            labor_cost: indirect.labor.value(),
            labor_cost_type: CostType::of(&indirect.labor),
            overhead_cost: indirect.overhead.value(),
            overhead_cost_type: CostType::of(&indirect.overhead),
            marketing_cost: indirect.marketing.value(),
            marketing_cost_type: CostType::of(&indirect.marketing),
            delivery_cost: indirect.delivery.value(),
            delivery_cost_type: CostType::of(&indirect.delivery),
            other_costs: indirect.other.value(),
            other_cost_type: CostType::of(&indirect.other),
            wastage_percentage: config.wastage_percentage,
            margin_percentage: result.margin_percentage,
            platform_fee_percentage: fee(PLATFORM_FEE),
            tax_percentage: fee(TAX_FEE),
            edit_mode,
            selling_price,
            fees: if columns_suffice { Vec::new() } else { config.fees.clone() },
            total_unit_cost: result.cost_with_wastage,
            ideal_price: result.selling_price,
            final_price: result.final_price,
            unit_profit: result.profit,
            actual_margin: result.profit_margin_percentage,
        }
    }

    /// Overwrite the output columns with a fresh result
    pub fn write_outputs(&mut self, result: &PricingResult) {
        self.total_unit_cost = result.cost_with_wastage;
        self.ideal_price = result.selling_price;
        self.final_price = result.final_price;
        self.unit_profit = result.profit;
        self.actual_margin = result.profit_margin_percentage;
        if self.edit_mode == EditMode::Price {
            self.margin_percentage = result.margin_percentage;
        }
    }
}
