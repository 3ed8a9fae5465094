use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use rankwatch_core::{
    sort_by_time, BrandId, CategoryId, Product, ProductCatalog, ProductId, Snapshot,
    SnapshotSource, SourceError,
};

use crate::error::StorageError;

/// On-disk layout of a snapshot export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

/// In-memory product catalog and snapshot history.
///
/// Snapshots are grouped per (product, category) and kept sorted by
/// `collected_at`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    products: BTreeMap<ProductId, Product>,
    snapshots: BTreeMap<(ProductId, CategoryId), Vec<Snapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a [`SnapshotFile`] JSON document.
    pub fn from_file(path: &Path) -> Result<Self, StorageError> {
        let raw = fs::read_to_string(path)?;
        let store = Self::from_json(&raw)?;
        info!(
            path = %path.display(),
            products = store.products.len(),
            pairs = store.snapshots.len(),
            snapshots = store.snapshot_count(),
            "loaded snapshot file"
        );
        Ok(store)
    }

    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        let file: SnapshotFile = serde_json::from_str(raw)?;
        Self::from_snapshot_file(file)
    }

    pub fn from_snapshot_file(file: SnapshotFile) -> Result<Self, StorageError> {
        let mut store = Self::new();
        for product in file.products {
            if store.products.contains_key(&product.id) {
                return Err(StorageError::Invalid(format!(
                    "duplicate product id {}",
                    product.id
                )));
            }
            store.insert_product(product);
        }
        store.extend(file.snapshots);
        Ok(store)
    }

    pub fn insert_product(&mut self, product: Product) {
        self.products.insert(product.id, product);
    }

    pub fn insert_snapshot(&mut self, snapshot: Snapshot) {
        let series = self
            .snapshots
            .entry((snapshot.product_id, snapshot.category_id))
            .or_default();
        series.push(snapshot);
        sort_by_time(series);
    }

    pub fn extend(&mut self, snapshots: impl IntoIterator<Item = Snapshot>) {
        let mut touched = std::collections::BTreeSet::new();
        for s in snapshots {
            let key = (s.product_id, s.category_id);
            self.snapshots.entry(key).or_default().push(s);
            touched.insert(key);
        }
        for key in touched {
            if let Some(series) = self.snapshots.get_mut(&key) {
                sort_by_time(series);
            }
        }
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.get(&id)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.values().map(Vec::len).sum()
    }
}

impl ProductCatalog for MemoryStore {
    fn products_for_brand(&self, brand_id: BrandId) -> Result<Vec<Product>, SourceError> {
        Ok(self
            .products
            .values()
            .filter(|p| p.brand_id == brand_id)
            .cloned()
            .collect())
    }
}

impl SnapshotSource for MemoryStore {
    fn categories_for(&self, product_id: ProductId) -> Result<Vec<CategoryId>, SourceError> {
        Ok(self
            .snapshots
            .range((product_id, CategoryId::MIN)..=(product_id, CategoryId::MAX))
            .filter(|(_, series)| !series.is_empty())
            .map(|((_, category), _)| *category)
            .collect())
    }

    fn latest_collected_at(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
    ) -> Result<Option<DateTime<Utc>>, SourceError> {
        Ok(self
            .snapshots
            .get(&(product_id, category_id))
            .and_then(|series| series.last())
            .map(|s| s.collected_at))
    }

    fn snapshots_since(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Snapshot>, SourceError> {
        Ok(self
            .snapshots
            .get(&(product_id, category_id))
            .map(|series| {
                series
                    .iter()
                    .filter(|s| s.collected_at >= since)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rankwatch_core::StockStatus;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()
    }

    fn snap(product_id: ProductId, category_id: CategoryId, rank: u32, hours: i64) -> Snapshot {
        Snapshot {
            product_id,
            category_id,
            rank,
            price: None,
            rating: None,
            review_count: None,
            is_prime: false,
            stock_status: StockStatus::InStock,
            collected_at: t0() + Duration::hours(hours),
        }
    }

    fn product(id: ProductId, brand_id: BrandId) -> Product {
        Product {
            id,
            brand_id,
            name: format!("Product {}", id),
        }
    }

    #[test]
    fn products_filtered_by_brand() {
        let mut store = MemoryStore::new();
        store.insert_product(product(1, 1));
        store.insert_product(product(2, 2));
        store.insert_product(product(3, 1));
        let ids: Vec<ProductId> = store
            .products_for_brand(1)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn categories_are_distinct_per_product() {
        let mut store = MemoryStore::new();
        store.extend(vec![
            snap(1, 20, 5, 0),
            snap(1, 10, 5, 0),
            snap(1, 10, 4, 1),
            snap(2, 30, 9, 0),
        ]);
        assert_eq!(store.categories_for(1).unwrap(), vec![10, 20]);
        assert_eq!(store.categories_for(2).unwrap(), vec![30]);
        assert!(store.categories_for(3).unwrap().is_empty());
    }

    #[test]
    fn snapshots_since_sorted_and_filtered() {
        let mut store = MemoryStore::new();
        store.extend(vec![snap(1, 10, 3, 5), snap(1, 10, 1, 1), snap(1, 10, 2, 3)]);
        let got = store
            .snapshots_since(1, 10, t0() + Duration::hours(2))
            .unwrap();
        let ranks: Vec<u32> = got.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![2, 3]);
    }

    #[test]
    fn latest_collected_at_per_pair() {
        let mut store = MemoryStore::new();
        store.extend(vec![snap(1, 10, 3, 5), snap(1, 10, 1, 1), snap(1, 20, 2, 3)]);
        assert_eq!(
            store.latest_collected_at(1, 10).unwrap(),
            Some(t0() + Duration::hours(5))
        );
        assert_eq!(
            store.latest_collected_at(1, 20).unwrap(),
            Some(t0() + Duration::hours(3))
        );
        assert_eq!(store.latest_collected_at(2, 10).unwrap(), None);
    }

    #[test]
    fn from_json_document() {
        let raw = r#"{
            "products": [{"id": 1, "brand_id": 1, "name": "Lip Sleeping Mask"}],
            "snapshots": [
                {"product_id": 1, "category_id": 10, "rank": 8, "collected_at": "2025-04-01T01:00:00Z"},
                {"product_id": 1, "category_id": 10, "rank": 9, "collected_at": "2025-04-01T00:00:00Z"}
            ]
        }"#;
        let store = MemoryStore::from_json(raw).unwrap();
        assert_eq!(store.snapshot_count(), 2);
        assert_eq!(store.product(1).unwrap().name, "Lip Sleeping Mask");
        let series = store.snapshots_since(1, 10, t0()).unwrap();
        assert_eq!(series[0].rank, 9);
    }

    #[test]
    fn demo_export_loads() {
        let store = MemoryStore::from_json(include_str!("../../../data/snapshots.json")).unwrap();
        assert_eq!(store.products_for_brand(1).unwrap().len(), 3);
        assert_eq!(store.categories_for(101).unwrap(), vec![11060451]);
        assert_eq!(store.snapshot_count(), 12);
    }

    #[test]
    fn duplicate_product_rejected() {
        let raw = r#"{"products": [{"id": 1, "brand_id": 1}, {"id": 1, "brand_id": 2}]}"#;
        assert!(matches!(
            MemoryStore::from_json(raw),
            Err(StorageError::Invalid(_))
        ));
    }
}
