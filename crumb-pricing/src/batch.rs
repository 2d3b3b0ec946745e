use crate::engine::recompute;
use crate::models::{PricingConfiguration, PricingResult};
use crumb_shared::ProductId;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Results of repricing a whole catalog
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchOutcome {
    pub results: BTreeMap<ProductId, PricingResult>,
    /// Products whose configuration cannot produce a price
    pub invalid: Vec<ProductId>,
}

impl BatchOutcome {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Recompute every configuration.
///
/// Configurations are independent, so the parallel path needs no locking and
/// produces exactly the sequential result. If a product appears twice, the
/// later configuration wins.
pub fn reprice_all(configs: &[PricingConfiguration], parallel: bool) -> BatchOutcome {
    let priced: Vec<(ProductId, PricingResult)> = if parallel {
        configs
            .par_iter()
            .map(|config| (config.product_id, recompute(config)))
            .collect()
    } else {
        configs
            .iter()
            .map(|config| (config.product_id, recompute(config)))
            .collect()
    };

    let results: BTreeMap<ProductId, PricingResult> = priced.into_iter().collect();
    let invalid: Vec<ProductId> = results
        .iter()
        .filter(|(_, result)| !result.is_valid())
        .map(|(id, _)| *id)
        .collect();

    tracing::info!(
        priced = results.len(),
        invalid = invalid.len(),
        parallel,
        "Batch repricing finished"
    );

    BatchOutcome { results, invalid }
}
