//! Boundaries to the collaborators around the detector: the product catalog,
//! the snapshot history, and whatever persists detected events.

use chrono::{DateTime, Utc};

use crate::entity::{BrandId, CategoryId, Product, ProductId};
use crate::error::SourceError;
use crate::event::Event;
use crate::snapshot::Snapshot;

/// Which products are tracked for a brand.
pub trait ProductCatalog {
    fn products_for_brand(&self, brand_id: BrandId) -> Result<Vec<Product>, SourceError>;
}

/// Read-only access to collected snapshots.
pub trait SnapshotSource {
    /// Distinct categories the product has ever been ranked in.
    fn categories_for(&self, product_id: ProductId) -> Result<Vec<CategoryId>, SourceError>;

    /// `collected_at` of the newest snapshot for the pair, if any.
    fn latest_collected_at(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
    ) -> Result<Option<DateTime<Utc>>, SourceError>;

    /// Snapshots for one product/category collected at or after `since`.
    ///
    /// Implementations should return them ordered by `collected_at`, but the
    /// detector does not rely on it.
    fn snapshots_since(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Snapshot>, SourceError>;
}

/// Persists detected events. Deduplication, if any, is the sink's business.
pub trait EventSink {
    /// Store the events and return how many were written.
    fn persist(&mut self, events: &[Event]) -> Result<usize, SourceError>;
}

impl<T: ProductCatalog + ?Sized> ProductCatalog for &T {
    fn products_for_brand(&self, brand_id: BrandId) -> Result<Vec<Product>, SourceError> {
        (**self).products_for_brand(brand_id)
    }
}

impl<T: SnapshotSource + ?Sized> SnapshotSource for &T {
    fn categories_for(&self, product_id: ProductId) -> Result<Vec<CategoryId>, SourceError> {
        (**self).categories_for(product_id)
    }

    fn latest_collected_at(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
    ) -> Result<Option<DateTime<Utc>>, SourceError> {
        (**self).latest_collected_at(product_id, category_id)
    }

    fn snapshots_since(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
        since: DateTime<Utc>,
    ) -> Result<Vec<Snapshot>, SourceError> {
        (**self).snapshots_since(product_id, category_id, since)
    }
}

/// Collects events in memory; handy for dry runs and tests.
impl EventSink for Vec<Event> {
    fn persist(&mut self, events: &[Event]) -> Result<usize, SourceError> {
        self.extend_from_slice(events);
        Ok(events.len())
    }
}
