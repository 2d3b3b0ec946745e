use crumb_shared::sanitize::lenient_f64;
use crumb_shared::{PackagingId, ProductId, RecipeId};
use serde::{Deserialize, Serialize};

/// A recipe unit used by a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecipeLine {
    pub recipe_id: RecipeId,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cost: f64,
}

/// A packaging unit used by a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductPackagingLine {
    pub packaging_id: PackagingId,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub cost: f64,
    #[serde(default)]
    pub is_primary: bool,
}

/// A sellable item assembled from recipe units and packaging
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub recipe_lines: Vec<ProductRecipeLine>,
    #[serde(default)]
    pub packaging_lines: Vec<ProductPackagingLine>,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProductId::generate(),
            name: name.into(),
            recipe_lines: Vec::new(),
            packaging_lines: Vec::new(),
        }
    }

    pub fn add_recipe_line(&mut self, recipe_id: RecipeId, quantity: f64) {
        self.recipe_lines.push(ProductRecipeLine {
            recipe_id,
            quantity,
            cost: 0.0,
        });
    }

    /// Add a packaging line. The first packaging added becomes primary.
    pub fn add_packaging_line(&mut self, packaging_id: PackagingId, quantity: f64) {
        let is_primary = self.packaging_lines.is_empty();
        self.packaging_lines.push(ProductPackagingLine {
            packaging_id,
            quantity,
            cost: 0.0,
            is_primary,
        });
    }

    /// Mark the first line holding `packaging_id` primary; see [`Self::set_primary_packaging_at`]
    pub fn set_primary_packaging(&mut self, packaging_id: &PackagingId) -> Result<(), PackagingError> {
        let index = self.packaging_index(packaging_id)?;
        self.set_primary_packaging_at(index)
    }

    /// Mark one packaging line primary and clear the flag everywhere else
    pub fn set_primary_packaging_at(&mut self, index: usize) -> Result<(), PackagingError> {
        self.check_line_index(index)?;
        for (i, line) in self.packaging_lines.iter_mut().enumerate() {
            line.is_primary = i == index;
        }
        Ok(())
    }

    pub fn unset_primary_packaging(&mut self, packaging_id: &PackagingId) -> Result<(), PackagingError> {
        let index = self.packaging_index(packaging_id)?;
        self.unset_primary_packaging_at(index)
    }

    /// Clearing the primary flag is only a no-op on non-primary lines; the
    /// primary line can only change by promoting another one.
    pub fn unset_primary_packaging_at(&mut self, index: usize) -> Result<(), PackagingError> {
        self.check_line_index(index)?;
        if self.primary_index() == Some(index) {
            return Err(PackagingError::PrimaryRequired(
                self.packaging_lines[index].packaging_id.to_string(),
            ));
        }
        self.packaging_lines[index].is_primary = false;
        Ok(())
    }

    pub fn remove_packaging_line(&mut self, packaging_id: &PackagingId) -> Result<ProductPackagingLine, PackagingError> {
        let index = self.packaging_index(packaging_id)?;
        self.remove_packaging_line_at(index)
    }

    /// Remove a packaging line; if it was primary the first remaining line takes over
    pub fn remove_packaging_line_at(&mut self, index: usize) -> Result<ProductPackagingLine, PackagingError> {
        self.check_line_index(index)?;
        let was_primary = self.primary_index() == Some(index);
        let removed = self.packaging_lines.remove(index);

        if was_primary {
            if let Some(first) = self.packaging_lines.first_mut() {
                first.is_primary = true;
            }
        }
        Ok(removed)
    }

    /// The effective primary packaging line.
    ///
    /// When no line carries the flag, the first line is treated as primary.
    pub fn primary_packaging(&self) -> Option<&ProductPackagingLine> {
        self.primary_index().map(|i| &self.packaging_lines[i])
    }

    /// Position of the effective primary line. The same packaging may appear
    /// on several lines, so callers that need the exact line use this.
    pub fn primary_packaging_index(&self) -> Option<usize> {
        self.primary_index()
    }

    /// Repair records that arrived with zero or several primary flags
    pub fn normalize_primary_packaging(&mut self) {
        let flagged = self.packaging_lines.iter().filter(|l| l.is_primary).count();
        if !self.packaging_lines.is_empty() && flagged != 1 {
            tracing::debug!(product_id = %self.id, flagged, "Repairing primary packaging flags");
        }

        let primary = self.primary_index();
        for (i, line) in self.packaging_lines.iter_mut().enumerate() {
            line.is_primary = Some(i) == primary;
        }
    }

    fn primary_index(&self) -> Option<usize> {
        if self.packaging_lines.is_empty() {
            return None;
        }
        Some(
            self.packaging_lines
                .iter()
                .position(|line| line.is_primary)
                .unwrap_or(0),
        )
    }

    fn packaging_index(&self, packaging_id: &PackagingId) -> Result<usize, PackagingError> {
        self.packaging_lines
            .iter()
            .position(|line| &line.packaging_id == packaging_id)
            .ok_or_else(|| PackagingError::LineNotFound(packaging_id.to_string()))
    }

    fn check_line_index(&self, index: usize) -> Result<(), PackagingError> {
        let len = self.packaging_lines.len();
        if index < len {
            Ok(())
        } else {
            Err(PackagingError::LineIndexOutOfRange { index, len })
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PackagingError {
    #[error("Packaging line not found: {0}")]
    LineNotFound(String),

    #[error("Packaging line {index} out of range ({len} lines)")]
    LineIndexOutOfRange { index: usize, len: usize },

    #[error("Packaging {0} is the primary line; promote another line instead")]
    PrimaryRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_boxes(count: usize) -> (Product, Vec<PackagingId>) {
        let mut product = Product::new("Gift box");
        let ids: Vec<_> = (0..count).map(|_| PackagingId::generate()).collect();
        for id in &ids {
            product.add_packaging_line(*id, 1.0);
        }
        (product, ids)
    }

    fn primaries(product: &Product) -> usize {
        product.packaging_lines.iter().filter(|l| l.is_primary).count()
    }

    #[test]
    fn test_first_packaging_becomes_primary() {
        let (product, ids) = product_with_boxes(3);
        assert_eq!(product.primary_packaging().unwrap().packaging_id, ids[0]);
        assert_eq!(primaries(&product), 1);
    }

    #[test]
    fn test_set_primary_is_exclusive() {
        let (mut product, ids) = product_with_boxes(3);

        product.set_primary_packaging(&ids[2]).unwrap();
        assert_eq!(primaries(&product), 1);
        assert!(product.packaging_lines[2].is_primary);
        assert!(!product.packaging_lines[0].is_primary);
    }

    #[test]
    fn test_unset_primary_rejected() {
        let (mut product, ids) = product_with_boxes(2);

        let result = product.unset_primary_packaging(&ids[0]);
        assert_eq!(result, Err(PackagingError::PrimaryRequired(ids[0].to_string())));
        assert!(product.packaging_lines[0].is_primary);

        // Non-primary lines can be cleared freely
        product.unset_primary_packaging(&ids[1]).unwrap();
        assert_eq!(primaries(&product), 1);
    }

    #[test]
    fn test_removing_primary_promotes_first_remaining() {
        let (mut product, ids) = product_with_boxes(3);
        product.set_primary_packaging(&ids[1]).unwrap();

        let removed = product.remove_packaging_line(&ids[1]).unwrap();
        assert!(removed.is_primary);
        assert_eq!(product.primary_packaging().unwrap().packaging_id, ids[0]);
        assert_eq!(primaries(&product), 1);
    }

    #[test]
    fn test_unflagged_lines_default_to_first() {
        let (mut product, ids) = product_with_boxes(2);
        for line in &mut product.packaging_lines {
            line.is_primary = false;
        }
        assert_eq!(product.primary_packaging().unwrap().packaging_id, ids[0]);

        product.packaging_lines[0].is_primary = true;
        product.packaging_lines[1].is_primary = true;
        product.normalize_primary_packaging();
        assert_eq!(primaries(&product), 1);
        assert!(product.packaging_lines[0].is_primary);
    }

    #[test]
    fn test_repeated_packaging_addressed_by_line() {
        let mut product = Product::new("Twin pack");
        let sleeve = PackagingId::generate();
        let label = PackagingId::generate();
        product.add_packaging_line(sleeve, 1.0);
        product.add_packaging_line(label, 1.0);
        product.add_packaging_line(sleeve, 2.0);

        product.set_primary_packaging_at(2).unwrap();
        assert_eq!(product.primary_packaging_index(), Some(2));
        assert_eq!(product.primary_packaging().unwrap().quantity, 2.0);
        assert_eq!(primaries(&product), 1);

        // The first sleeve line is not the primary one and can be cleared
        product.unset_primary_packaging_at(0).unwrap();
        assert_eq!(
            product.unset_primary_packaging_at(2),
            Err(PackagingError::PrimaryRequired(sleeve.to_string()))
        );

        let removed = product.remove_packaging_line_at(2).unwrap();
        assert_eq!(removed.quantity, 2.0);
        assert_eq!(product.primary_packaging_index(), Some(0));
        assert_eq!(primaries(&product), 1);

        assert_eq!(
            product.remove_packaging_line_at(5),
            Err(PackagingError::LineIndexOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_unknown_line_is_reported() {
        let (mut product, _) = product_with_boxes(1);
        let missing = PackagingId::generate();
        assert!(matches!(
            product.set_primary_packaging(&missing),
            Err(PackagingError::LineNotFound(_))
        ));
    }
}
