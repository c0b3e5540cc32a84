use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use metrika_core::domain::estimate::{Estimate, EstimateId};
use metrika_core::domain::material::Material;
use metrika_core::domain::vendor::Vendor;

pub mod catalog;
pub mod estimate;
pub mod memory;

pub use catalog::SqlPricingDataset;
pub use estimate::SqlEstimateRepository;
pub use memory::{InMemoryEstimateRepository, InMemoryPricingDataset};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait EstimateRepository: Send + Sync {
    async fn find_by_id(&self, id: &EstimateId) -> Result<Option<Estimate>, RepositoryError>;
    async fn save(&self, estimate: Estimate) -> Result<(), RepositoryError>;
}

/// Listing surface for the catalog endpoints; the engine itself only sees
/// the narrower `PricingDataset` trait from metrika-core.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_materials(&self) -> Result<Vec<Material>, RepositoryError>;
    async fn list_vendors(&self) -> Result<Vec<Vendor>, RepositoryError>;
}

/// Decimal columns are TEXT in SQLite; a malformed cell is a decode error,
/// not a missing row.
pub(crate) fn decode_decimal(column: &str, raw: &str) -> Result<Decimal, RepositoryError> {
    raw.parse::<Decimal>().map_err(|error| {
        RepositoryError::Decode(format!("column `{column}` held non-decimal `{raw}`: {error}"))
    })
}
