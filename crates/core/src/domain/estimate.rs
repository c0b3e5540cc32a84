use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EstimateId(pub String);

impl EstimateId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Caller-supplied estimate parameters. The refinement fields past
/// `duration_months` are accepted and persisted but not consumed by the
/// current template formulas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimateRequest {
    pub project_type: String,
    pub location: String,
    pub size: Decimal,
    pub size_unit: String,
    pub start_month: u32,
    pub duration_months: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structural_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub star_rating: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storey_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facade_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concrete_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebar_grade: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earthworks_volume: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_vendors: Option<Vec<String>>,
}

impl EstimateRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.size <= Decimal::ZERO {
            return Err(DomainError::InvalidRequest(format!(
                "size must be positive, got {}",
                self.size
            )));
        }
        if !(1..=12).contains(&self.start_month) {
            return Err(DomainError::InvalidRequest(format!(
                "start_month must be in 1..=12, got {}",
                self.start_month
            )));
        }
        if self.duration_months == 0 {
            return Err(DomainError::InvalidRequest(
                "duration_months must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// P25/P50/P75 cost spread. A fixed +-15% heuristic, not a statistical
/// percentile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceBand {
    pub p25: Decimal,
    pub p50: Decimal,
    pub p75: Decimal,
}

impl ConfidenceBand {
    const LOW: Decimal = Decimal::from_parts(85, 0, 0, false, 2);
    const HIGH: Decimal = Decimal::from_parts(115, 0, 0, false, 2);

    pub fn around(expected: Decimal) -> Self {
        Self { p25: expected * Self::LOW, p50: expected, p75: expected * Self::HIGH }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Limited Stock")]
    LimitedStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl StockStatus {
    /// Zero stock wins over the limited-stock comparison.
    pub fn classify(stock_qty: Decimal, required_qty: Decimal) -> Self {
        if stock_qty == Decimal::ZERO {
            Self::OutOfStock
        } else if stock_qty < required_qty {
            Self::LimitedStock
        } else {
            Self::InStock
        }
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InStock => "In Stock",
            Self::LimitedStock => "Limited Stock",
            Self::OutOfStock => "Out of Stock",
        })
    }
}

/// One priced bill-of-quantities line. Quantities and prices are rounded
/// for display (2 dp, factor 3 dp); the band is computed from the
/// unrounded unit price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoqLine {
    pub material_name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub seasonal_factor: Decimal,
    pub confidence_band: ConfidenceBand,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorRecommendation {
    pub vendor_name: String,
    pub location: String,
    pub price: Decimal,
    pub stock_status: StockStatus,
    pub lead_time_days: u32,
    pub moq: Decimal,
    pub contact: String,
}

/// One point of the per-material 12-month price curve used for charting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalPoint {
    pub month: u32,
    pub material: String,
    pub price_factor: Decimal,
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostDriver {
    pub material: String,
    pub cost: Decimal,
    pub percentage: Decimal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingMaterial,
    MissingPrice,
}

/// Diagnostic for template lines omitted from the BoQ because the dataset
/// had no material or no price observation for them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    pub mapping_key: String,
    pub reason: SkipReason,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateResult {
    pub boq_items: Vec<BoqLine>,
    pub total_cost: Decimal,
    pub confidence_bands: ConfidenceBand,
    pub vendor_recommendations: BTreeMap<String, Vec<VendorRecommendation>>,
    pub seasonal_chart_data: Vec<SeasonalPoint>,
    pub assumptions: Vec<String>,
    pub cost_drivers: Vec<CostDriver>,
    pub skipped_materials: Vec<SkippedLine>,
}

/// A generated estimate: request snapshot plus computed result. Immutable
/// once created; persisted and retrieved by id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub id: EstimateId,
    pub request: EstimateRequest,
    pub result: EstimateResult,
    pub created_at: DateTime<Utc>,
}

impl Estimate {
    pub fn new(request: EstimateRequest, result: EstimateResult) -> Self {
        Self { id: EstimateId::generate(), request, result, created_at: Utc::now() }
    }
}
