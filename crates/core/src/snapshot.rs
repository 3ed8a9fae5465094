use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{CategoryId, ProductId};

/// Stock availability as reported by the collection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    InStock,
    OutOfStock,
    LowStock,
    #[default]
    Unknown,
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StockStatus::InStock => "in_stock",
            StockStatus::OutOfStock => "out_of_stock",
            StockStatus::LowStock => "low_stock",
            StockStatus::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

/// One timestamped observation of a product in a category.
///
/// Snapshots are produced by the collection layer and never mutated here.
/// Callers may hand them over in any order; every consumer sorts by
/// `collected_at` before looking at sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub product_id: ProductId,
    pub category_id: CategoryId,
    /// 1-based position in the category best-seller list.
    pub rank: u32,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub is_prime: bool,
    #[serde(default)]
    pub stock_status: StockStatus,
    pub collected_at: DateTime<Utc>,
}

/// Sort snapshots oldest first. Stable, so equal timestamps keep input order.
pub fn sort_by_time(snapshots: &mut [Snapshot]) {
    snapshots.sort_by_key(|s| s.collected_at);
}
