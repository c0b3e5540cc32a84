use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialId(pub String);

/// A catalog material. `mapping_key` is the stable string key project
/// templates use to reference it; unique and immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub unit: String,
    pub category: String,
    pub spec: String,
    pub mapping_key: String,
}

/// One observed unit price for a material in a region. The engine always
/// selects the most recent observation by timestamp for a given region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub material_id: MaterialId,
    pub region: String,
    pub observed_at: DateTime<Utc>,
    pub unit_price: Decimal,
}

/// Multiplicative monthly price adjustment, keyed by calendar month
/// independent of year. At most one factor per (material, month).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalityFactor {
    pub material_id: MaterialId,
    pub month: u32,
    pub factor: Decimal,
}
