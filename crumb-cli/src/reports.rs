use crumb_catalog::{IngredientCostIndex, PackagingCostIndex};
use crumb_core::{CatalogRepository, ProductionScheduleItem};
use crumb_costing::{ProductCostAggregator, ProductCosts, RecipeCostEngine, RecipeCosts};
use crumb_pricing::{
    reprice_all, BatchOutcome, PricingConfiguration, PricingEngine, PricingRecord, PricingResult,
    PricingSession,
};
use crumb_production::{ProductionRequirementAggregator, ShoppingList};
use crumb_shared::{ProductId, RecipeId};
use crumb_store::CatalogSnapshot;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct NamedRecipeCosts {
    pub name: String,
    #[serde(flatten)]
    pub costs: RecipeCosts,
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedProductCosts {
    pub name: String,
    #[serde(flatten)]
    pub costs: ProductCosts,
}

#[derive(Debug, Clone, Serialize)]
pub struct CostReport {
    pub recipes: Vec<NamedRecipeCosts>,
    pub products: Vec<NamedProductCosts>,
    /// Recipes whose portion count makes per-unit costing meaningless
    pub invalid_recipes: Vec<RecipeId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceReport {
    pub product_id: ProductId,
    pub product_name: String,
    pub costs: ProductCosts,
    pub configuration: PricingConfiguration,
    pub result: PricingResult,
    /// Priced from a stored record rather than the configured defaults
    pub from_record: bool,
}

pub fn cost_report(catalog: &dyn CatalogRepository) -> CostReport {
    let ingredients = IngredientCostIndex::from_repository(catalog);
    let packagings = PackagingCostIndex::from_repository(catalog);
    let recipe_engine = RecipeCostEngine::new(&ingredients);
    let aggregator = ProductCostAggregator::new(catalog, &ingredients, &packagings);

    let recipes: Vec<NamedRecipeCosts> = catalog
        .recipes()
        .into_iter()
        .map(|recipe| NamedRecipeCosts {
            name: recipe.name.clone(),
            costs: recipe_engine.compute(recipe),
        })
        .collect();

    let invalid_recipes = recipes
        .iter()
        .filter(|entry| !entry.costs.per_unit_valid)
        .map(|entry| entry.costs.recipe_id)
        .collect();

    let products = catalog
        .products()
        .into_iter()
        .map(|product| NamedProductCosts {
            name: product.name.clone(),
            costs: aggregator.compute(product),
        })
        .collect();

    CostReport {
        recipes,
        products,
        invalid_recipes,
    }
}

/// Price one product from its stored record, or from the engine defaults when
/// it has never been priced. `reseed` replaces a stored base cost with the
/// product's current computed cost.
pub fn price_report(
    snapshot: &CatalogSnapshot,
    engine: &PricingEngine,
    product_id: &ProductId,
    reseed: bool,
) -> Result<PriceReport, ReportError> {
    let product = snapshot
        .product(product_id)
        .ok_or(ReportError::ProductNotFound(*product_id))?;

    let ingredients = IngredientCostIndex::from_repository(snapshot);
    let packagings = PackagingCostIndex::from_repository(snapshot);
    let costs = ProductCostAggregator::new(snapshot, &ingredients, &packagings).compute(product);

    let (session, from_record) = match snapshot.pricing_record(product_id) {
        Some(record) => {
            let mut session = PricingSession::from_record(record);
            if reseed {
                session.reseed_base_cost(&costs);
            }
            (session, true)
        }
        None => (PricingSession::new(engine.seed_from_costs(&costs)), false),
    };

    Ok(PriceReport {
        product_id: *product_id,
        product_name: product.name.clone(),
        configuration: session.config().clone(),
        result: session.result().clone(),
        costs,
        from_record,
    })
}

/// Shopping list for one production run, or for every run in the snapshot
pub fn shopping_list(snapshot: &CatalogSnapshot, run_id: Option<Uuid>) -> Result<ShoppingList, ReportError> {
    let ingredients = IngredientCostIndex::from_repository(snapshot);
    let aggregator = ProductionRequirementAggregator::new(snapshot, &ingredients);

    match run_id {
        Some(id) => {
            let run = snapshot.production_run(&id).ok_or(ReportError::RunNotFound(id))?;
            Ok(aggregator.aggregate_run(run))
        }
        None => {
            let items: Vec<ProductionScheduleItem> = snapshot
                .production_runs()
                .iter()
                .flat_map(|run| run.items.iter().cloned())
                .collect();
            Ok(aggregator.aggregate(&items))
        }
    }
}

/// Recompute every stored pricing record and write the outputs back.
///
/// With `reseed`, base costs are first refreshed from current product costs;
/// records for products missing from the catalog keep their stored base cost.
pub fn reprice(snapshot: &mut CatalogSnapshot, parallel: bool, reseed: bool) -> BatchOutcome {
    let mut configs: Vec<PricingConfiguration> =
        snapshot.pricing_records().map(PricingRecord::to_config).collect();

    if reseed {
        let ingredients = IngredientCostIndex::from_repository(&*snapshot);
        let packagings = PackagingCostIndex::from_repository(&*snapshot);
        let aggregator = ProductCostAggregator::new(&*snapshot, &ingredients, &packagings);

        for config in &mut configs {
            match snapshot.product(&config.product_id) {
                Some(product) => {
                    let costs = aggregator.compute(product);
                    config.base_cost = costs.total_cost;
                    config.packaging_cost = costs.total_packaging_cost;
                }
                None => {
                    tracing::warn!(product_id = %config.product_id, "Pricing record for unknown product, base cost kept")
                }
            }
        }
    }

    let outcome = reprice_all(&configs, parallel);

    let updated: Vec<PricingRecord> = configs
        .iter()
        .filter_map(|config| {
            let result = outcome.results.get(&config.product_id)?;
            if reseed {
                return Some(PricingRecord::from_parts(config, result));
            }
            let mut record = snapshot.pricing_record(&config.product_id)?.clone();
            record.write_outputs(result);
            Some(record)
        })
        .collect();

    for record in updated {
        snapshot.upsert_pricing_record(record);
    }

    outcome
}

/// Round every floating point number in a report for display
pub fn round_numbers(value: &mut Value, decimals: u32) {
    match value {
        Value::Number(number) if number.is_f64() => {
            let Some(raw) = number.as_f64() else { return };
            let factor = 10f64.powi(decimals as i32);
            if let Some(rounded) = serde_json::Number::from_f64((raw * factor).round() / factor) {
                *number = rounded;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|item| round_numbers(item, decimals)),
        Value::Object(map) => map.values_mut().for_each(|item| round_numbers(item, decimals)),
        _ => {}
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),
    #[error("Production run not found: {0}")]
    RunNotFound(Uuid),
}
