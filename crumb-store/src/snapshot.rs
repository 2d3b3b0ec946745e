use crumb_core::{CatalogRepository, Ingredient, Packaging, Product, ProductionRun, Recipe};
use crumb_pricing::PricingRecord;
use crumb_shared::{IngredientId, PackagingId, ProductId, RecipeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// On-disk layout of a catalog export
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub packaging: Vec<Packaging>,
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub pricing: Vec<PricingRecord>,
    #[serde(default)]
    pub production_runs: Vec<ProductionRun>,
}

/// In-memory, read-only view of a catalog export.
///
/// Records are keyed by id so listings come back in a stable order.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    ingredients: BTreeMap<IngredientId, Ingredient>,
    packagings: BTreeMap<PackagingId, Packaging>,
    recipes: BTreeMap<RecipeId, Recipe>,
    products: BTreeMap<ProductId, Product>,
    pricing: BTreeMap<ProductId, PricingRecord>,
    production_runs: Vec<ProductionRun>,
}

impl CatalogSnapshot {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::from_json(&contents)?;

        tracing::info!(
            path = %path.display(),
            ingredients = snapshot.ingredients.len(),
            recipes = snapshot.recipes.len(),
            products = snapshot.products.len(),
            "Catalog snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn from_json(contents: &str) -> Result<Self, SnapshotError> {
        let document: CatalogDocument = serde_json::from_str(contents)?;
        Self::from_document(document)
    }

    pub fn from_document(document: CatalogDocument) -> Result<Self, SnapshotError> {
        let mut snapshot = Self::default();

        for ingredient in document.ingredients {
            insert_unique(&mut snapshot.ingredients, ingredient.id, ingredient, "ingredient")?;
        }
        for packaging in document.packaging {
            insert_unique(&mut snapshot.packagings, packaging.id, packaging, "packaging")?;
        }
        for recipe in document.recipes {
            insert_unique(&mut snapshot.recipes, recipe.id, recipe, "recipe")?;
        }
        for mut product in document.products {
            // Exports from older tools may carry zero or several primary flags
            product.normalize_primary_packaging();
            insert_unique(&mut snapshot.products, product.id, product, "product")?;
        }
        for record in document.pricing {
            insert_unique(&mut snapshot.pricing, record.product_id, record, "pricing record")?;
        }
        for run in document.production_runs {
            if snapshot.production_runs.iter().any(|existing| existing.id == run.id) {
                return Err(SnapshotError::DuplicateId {
                    kind: "production run",
                    id: run.id.to_string(),
                });
            }
            snapshot.production_runs.push(run);
        }

        Ok(snapshot)
    }

    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            ingredients: self.ingredients.values().cloned().collect(),
            packaging: self.packagings.values().cloned().collect(),
            recipes: self.recipes.values().cloned().collect(),
            products: self.products.values().cloned().collect(),
            pricing: self.pricing.values().cloned().collect(),
            production_runs: self.production_runs.clone(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(&self.to_document())?;
        fs::write(path, contents).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Catalog snapshot saved");
        Ok(())
    }

    pub fn pricing_record(&self, product_id: &ProductId) -> Option<&PricingRecord> {
        self.pricing.get(product_id)
    }

    pub fn pricing_records(&self) -> impl Iterator<Item = &PricingRecord> {
        self.pricing.values()
    }

    /// Replace the stored record for the record's product
    pub fn upsert_pricing_record(&mut self, record: PricingRecord) {
        self.pricing.insert(record.product_id, record);
    }

    pub fn production_run(&self, id: &Uuid) -> Option<&ProductionRun> {
        self.production_runs.iter().find(|run| &run.id == id)
    }

    pub fn production_runs(&self) -> &[ProductionRun] {
        &self.production_runs
    }
}

fn insert_unique<K, V>(map: &mut BTreeMap<K, V>, id: K, value: V, kind: &'static str) -> Result<(), SnapshotError>
where
    K: Ord + Display,
{
    if map.contains_key(&id) {
        return Err(SnapshotError::DuplicateId {
            kind,
            id: id.to_string(),
        });
    }
    map.insert(id, value);
    Ok(())
}

impl CatalogRepository for CatalogSnapshot {
    fn ingredient(&self, id: &IngredientId) -> Option<&Ingredient> {
        self.ingredients.get(id)
    }

    fn recipe(&self, id: &RecipeId) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    fn packaging(&self, id: &PackagingId) -> Option<&Packaging> {
        self.packagings.get(id)
    }

    fn product(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    fn ingredients(&self) -> Vec<&Ingredient> {
        self.ingredients.values().collect()
    }

    fn recipes(&self) -> Vec<&Recipe> {
        self.recipes.values().collect()
    }

    fn packagings(&self) -> Vec<&Packaging> {
        self.packagings.values().collect()
    }

    fn products(&self) -> Vec<&Product> {
        self.products.values().collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate {kind} id {id}")]
    DuplicateId { kind: &'static str, id: String },
}
