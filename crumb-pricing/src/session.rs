use crate::engine::recompute;
use crate::models::{
    EditMode, Fee, IndirectCost, IndirectTerm, PriceAuthority, PricingConfiguration,
    PricingResult,
};
use crate::record::PricingRecord;
use crumb_costing::ProductCosts;

/// A single field change made while editing a pricing configuration
#[derive(Debug, Clone, PartialEq)]
pub enum PricingEdit {
    BaseCost(f64),
    Indirect(IndirectTerm, IndirectCost),
    Wastage(f64),
    /// Editing the margin makes it authoritative
    TargetMargin(f64),
    /// Editing the price makes it authoritative
    SellingPrice(f64),
    /// Flip authority, seeding it from the currently derived value.
    /// Refused while the price sits below cost.
    SwitchMode(EditMode),
    AddFee(Fee),
    UpdateFee { index: usize, percentage: f64 },
    RemoveFee(usize),
    MoveFee { from: usize, to: usize },
}

/// Interactive pricing state for one product.
///
/// Every edit recomputes synchronously, so `result()` always reflects the
/// latest inputs. Nothing is persisted until `save()` hands back a record;
/// writing it anywhere is up to the caller.
pub struct PricingSession {
    config: PricingConfiguration,
    result: PricingResult,
    dirty: bool,
}

impl PricingSession {
    pub fn new(config: PricingConfiguration) -> Self {
        let result = recompute(&config);
        Self {
            config,
            result,
            dirty: false,
        }
    }

    pub fn from_record(record: &PricingRecord) -> Self {
        Self::new(record.to_config())
    }

    pub fn config(&self) -> &PricingConfiguration {
        &self.config
    }

    pub fn result(&self) -> &PricingResult {
        &self.result
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn apply(&mut self, edit: PricingEdit) -> Result<&PricingResult, SessionError> {
        match edit {
            PricingEdit::BaseCost(cost) => self.config.base_cost = cost,
            PricingEdit::Indirect(term, cost) => self.config.indirect.set(term, cost),
            PricingEdit::Wastage(percentage) => self.config.wastage_percentage = percentage,
            PricingEdit::TargetMargin(margin) => self.config.authority = PriceAuthority::Margin(margin),
            PricingEdit::SellingPrice(price) => self.config.authority = PriceAuthority::Price(price),
            PricingEdit::SwitchMode(mode) => {
                if self.config.authority.mode() == mode {
                    return Ok(&self.result);
                }
                let authority = self.result.counterpart();
                if let PriceAuthority::Margin(margin) = authority {
                    // A target margin is clamped at 0, so the price would jump up to cost
                    if margin < 0.0 {
                        return Err(SessionError::NegativeMargin);
                    }
                }
                self.config.authority = authority;
            }
            PricingEdit::AddFee(fee) => self.config.fees.push(fee),
            PricingEdit::UpdateFee { index, percentage } => {
                let len = self.config.fees.len();
                let fee = self
                    .config
                    .fees
                    .get_mut(index)
                    .ok_or(SessionError::FeeIndexOutOfRange { index, len })?;
                fee.percentage = percentage;
            }
            PricingEdit::RemoveFee(index) => {
                self.check_fee_index(index)?;
                self.config.fees.remove(index);
            }
            PricingEdit::MoveFee { from, to } => {
                self.check_fee_index(from)?;
                self.check_fee_index(to)?;
                let fee = self.config.fees.remove(from);
                self.config.fees.insert(to, fee);
            }
        }

        self.recompute();
        Ok(&self.result)
    }

    /// Re-seed the base cost after the product's composition or prices changed
    pub fn reseed_base_cost(&mut self, costs: &ProductCosts) -> &PricingResult {
        self.config.base_cost = costs.total_cost;
        self.config.packaging_cost = costs.total_packaging_cost;
        self.recompute();
        &self.result
    }

    /// Snapshot the configuration and its outputs for persistence
    pub fn save(&mut self) -> PricingRecord {
        self.dirty = false;
        tracing::info!(product_id = %self.config.product_id, final_price = self.result.final_price, "Pricing saved");
        PricingRecord::from_parts(&self.config, &self.result)
    }

    fn recompute(&mut self) {
        self.result = recompute(&self.config);
        self.dirty = true;
    }

    fn check_fee_index(&self, index: usize) -> Result<(), SessionError> {
        let len = self.config.fees.len();
        if index < len {
            Ok(())
        } else {
            Err(SessionError::FeeIndexOutOfRange { index, len })
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Fee index {index} out of range ({len} fees configured)")]
    FeeIndexOutOfRange { index: usize, len: usize },
    #[error("Selling price is below cost; switch to margin mode after raising it")]
    NegativeMargin,
}
