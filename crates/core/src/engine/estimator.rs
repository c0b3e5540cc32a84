use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::domain::estimate::{
    BoqLine, ConfidenceBand, CostDriver, EstimateRequest, EstimateResult, SeasonalPoint,
    SkipReason, SkippedLine, StockStatus, VendorRecommendation,
};
use crate::engine::dataset::PricingDataset;
use crate::engine::templates::TemplateRegistry;
use crate::errors::ApplicationError;

const ATHENS_FACTOR: Decimal = Decimal::from_parts(105, 0, 0, false, 2);
const THESSALONIKI_FACTOR: Decimal = Decimal::from_parts(98, 0, 0, false, 2);
const DRIVER_SHARE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
const MAX_DRIVERS: usize = 5;
const MONTHS: u32 = 12;

/// Region/limit knobs wired from `[pricing]` config.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    pub region: String,
    pub vendor_limit: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { region: "Greece".to_string(), vendor_limit: 3 }
    }
}

/// The estimation engine: a pure function of the request plus a read-only
/// pricing dataset. Holds no mutable state; concurrent `generate` calls
/// need no locking.
#[derive(Clone, Debug)]
pub struct EstimationEngine {
    registry: TemplateRegistry,
    options: EngineOptions,
}

/// Location adjustment is a case-insensitive substring match on the free
/// text, not a region equality check.
fn location_factor(location: &str) -> Decimal {
    let normalized = location.to_lowercase();
    if normalized.contains("athens") {
        ATHENS_FACTOR
    } else if normalized.contains("thessaloniki") {
        THESSALONIKI_FACTOR
    } else {
        Decimal::ONE
    }
}

impl EstimationEngine {
    pub fn new(registry: TemplateRegistry, options: EngineOptions) -> Self {
        Self { registry, options }
    }

    pub fn with_defaults() -> Self {
        Self::new(TemplateRegistry::builtin(), EngineOptions::default())
    }

    /// Produce the full estimate for `request` against `dataset`.
    ///
    /// Template lines with no material or no price observation are omitted
    /// from the BoQ and recorded in the result's `skipped_materials`
    /// diagnostic; an unknown project type or invalid request aborts the
    /// whole estimate.
    pub async fn generate(
        &self,
        request: &EstimateRequest,
        dataset: &dyn PricingDataset,
    ) -> Result<EstimateResult, ApplicationError> {
        request.validate().map_err(ApplicationError::Domain)?;
        let rules = self.registry.resolve(&request.project_type)?;

        let location = location_factor(&request.location);

        let mut boq_items = Vec::with_capacity(rules.len());
        let mut vendor_recommendations = BTreeMap::new();
        let mut seasonal_chart_data = Vec::new();
        let mut skipped_materials = Vec::new();
        let mut line_costs: Vec<(String, Decimal)> = Vec::new();
        let mut total_cost = Decimal::ZERO;

        for rule in rules {
            let Some(material) = dataset.material_by_key(&rule.mapping_key).await? else {
                skipped_materials.push(SkippedLine {
                    mapping_key: rule.mapping_key.clone(),
                    reason: SkipReason::MissingMaterial,
                });
                continue;
            };

            let quantity = rule.quantity_for(request.size);

            let Some(observation) =
                dataset.latest_price(&material.id, &self.options.region).await?
            else {
                skipped_materials.push(SkippedLine {
                    mapping_key: rule.mapping_key.clone(),
                    reason: SkipReason::MissingPrice,
                });
                continue;
            };
            let base_price = observation.unit_price;

            let seasonal_factor = dataset
                .seasonality(&material.id, request.start_month)
                .await?
                .unwrap_or(Decimal::ONE);

            let unit_price = base_price * seasonal_factor * location;
            let line_total = quantity * unit_price;
            total_cost += line_total;

            boq_items.push(BoqLine {
                material_name: material.name.clone(),
                quantity: quantity.round_dp(2),
                unit: material.unit.clone(),
                unit_price: unit_price.round_dp(2),
                total_price: line_total.round_dp(2),
                seasonal_factor: seasonal_factor.round_dp(3),
                confidence_band: ConfidenceBand::around(unit_price),
            });
            line_costs.push((material.name.clone(), line_total));

            let offers =
                dataset.top_vendor_offers(&material.id, self.options.vendor_limit).await?;
            let recommendations = offers
                .into_iter()
                .map(|offer| VendorRecommendation {
                    vendor_name: offer.vendor_name,
                    location: offer.vendor_region,
                    price: offer.unit_price,
                    stock_status: StockStatus::classify(offer.stock_qty, quantity),
                    lead_time_days: offer.lead_time_days,
                    moq: offer.moq,
                    contact: offer.contact_email.unwrap_or_else(|| "N/A".to_string()),
                })
                .collect();
            vendor_recommendations.insert(material.name.clone(), recommendations);

            for month in 1..=MONTHS {
                let factor =
                    dataset.seasonality(&material.id, month).await?.unwrap_or(Decimal::ONE);
                seasonal_chart_data.push(SeasonalPoint {
                    month,
                    material: material.name.clone(),
                    price_factor: factor,
                    price: base_price * factor,
                });
            }
        }

        let cost_drivers = rank_cost_drivers(line_costs, total_cost);

        Ok(EstimateResult {
            boq_items,
            total_cost: total_cost.round_dp(2),
            confidence_bands: ConfidenceBand::around(total_cost),
            vendor_recommendations,
            seasonal_chart_data,
            assumptions: assumptions_for(request),
            cost_drivers,
            skipped_materials,
        })
    }
}

/// A line qualifies as a cost driver when it exceeds 10% of the final
/// total. Qualification is order-independent; the stable descending sort
/// keeps template order for equal costs.
fn rank_cost_drivers(line_costs: Vec<(String, Decimal)>, total_cost: Decimal) -> Vec<CostDriver> {
    if total_cost <= Decimal::ZERO {
        return Vec::new();
    }

    let threshold = total_cost * DRIVER_SHARE;
    let mut drivers: Vec<CostDriver> = line_costs
        .into_iter()
        .filter(|(_, cost)| *cost > threshold)
        .map(|(material, cost)| CostDriver {
            material,
            cost,
            percentage: cost / total_cost * Decimal::ONE_HUNDRED,
        })
        .collect();

    drivers.sort_by(|a, b| b.cost.cmp(&a.cost));
    drivers.truncate(MAX_DRIVERS);
    drivers
}

fn assumptions_for(request: &EstimateRequest) -> Vec<String> {
    vec![
        format!("Project location: {}", request.location),
        format!("Start month: {}", request.start_month),
        format!("Duration: {} months", request.duration_months),
        format!("Size: {} {}", request.size, request.size_unit),
        "Prices based on latest market data".to_string(),
        "Seasonal adjustments applied".to_string(),
        "Regional factors included".to_string(),
        "VAT not included".to_string(),
    ]
}
