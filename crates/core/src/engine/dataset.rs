use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::material::{Material, MaterialId, PriceObservation};
use crate::domain::vendor::RankedOffer;
use crate::errors::ApplicationError;

/// A dataset read failed outright (connection loss, decode failure).
/// Distinct from an absent row, which every query models as `None` or an
/// empty list.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("pricing dataset query failed: {0}")]
pub struct DatasetError(pub String);

impl From<DatasetError> for ApplicationError {
    fn from(value: DatasetError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}

/// Read-only query surface the estimation engine depends on. All queries
/// are point lookups or small ranked scans; implementations must be safe
/// to call concurrently and may serve an inconsistent-but-valid snapshot
/// while the underlying store is being updated.
#[async_trait]
pub trait PricingDataset: Send + Sync {
    async fn material_by_key(&self, key: &str) -> Result<Option<Material>, DatasetError>;

    /// Most recent observation by timestamp for (material, region).
    async fn latest_price(
        &self,
        material_id: &MaterialId,
        region: &str,
    ) -> Result<Option<PriceObservation>, DatasetError>;

    async fn seasonality(
        &self,
        material_id: &MaterialId,
        month: u32,
    ) -> Result<Option<Decimal>, DatasetError>;

    /// Offers for a material ordered by unit price ascending, at most
    /// `limit` entries. Ties keep the store's query order.
    async fn top_vendor_offers(
        &self,
        material_id: &MaterialId,
        limit: u32,
    ) -> Result<Vec<RankedOffer>, DatasetError>;
}
