use crumb_shared::sanitize::lenient_f64;
use crumb_shared::PackagingId;
use serde::{Deserialize, Serialize};

/// Boxes, bags, labels: anything wrapped around a finished product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Packaging {
    pub id: PackagingId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub bulk_quantity: f64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub bulk_price: f64,
}

impl Packaging {
    pub fn new(name: impl Into<String>, bulk_quantity: f64, bulk_price: f64) -> Self {
        Self {
            id: PackagingId::generate(),
            name: name.into(),
            bulk_quantity,
            bulk_price,
        }
    }
}
