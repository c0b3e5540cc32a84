use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use metrika_core::domain::estimate::{Estimate, EstimateId};
use metrika_core::domain::material::{Material, MaterialId, PriceObservation, SeasonalityFactor};
use metrika_core::domain::vendor::RankedOffer;
use metrika_core::engine::dataset::{DatasetError, PricingDataset};

use super::{EstimateRepository, RepositoryError};

/// In-memory pricing dataset for tests and offline tooling. Mirrors the
/// SQL implementation's ordering contracts.
#[derive(Default)]
pub struct InMemoryPricingDataset {
    materials: Vec<Material>,
    observations: Vec<PriceObservation>,
    seasonality: HashMap<(String, u32), Decimal>,
    offers: HashMap<String, Vec<RankedOffer>>,
}

impl InMemoryPricingDataset {
    pub fn add_material(&mut self, material: Material) {
        self.materials.push(material);
    }

    pub fn add_observation(&mut self, observation: PriceObservation) {
        self.observations.push(observation);
    }

    pub fn add_seasonality(&mut self, factor: SeasonalityFactor) {
        self.seasonality.insert((factor.material_id.0.clone(), factor.month), factor.factor);
    }

    pub fn add_offer(&mut self, material_id: &MaterialId, offer: RankedOffer) {
        self.offers.entry(material_id.0.clone()).or_default().push(offer);
    }
}

#[async_trait]
impl PricingDataset for InMemoryPricingDataset {
    async fn material_by_key(&self, key: &str) -> Result<Option<Material>, DatasetError> {
        Ok(self.materials.iter().find(|material| material.mapping_key == key).cloned())
    }

    async fn latest_price(
        &self,
        material_id: &MaterialId,
        region: &str,
    ) -> Result<Option<PriceObservation>, DatasetError> {
        Ok(self
            .observations
            .iter()
            .filter(|obs| obs.material_id == *material_id && obs.region == region)
            .max_by_key(|obs| obs.observed_at)
            .cloned())
    }

    async fn seasonality(
        &self,
        material_id: &MaterialId,
        month: u32,
    ) -> Result<Option<Decimal>, DatasetError> {
        Ok(self.seasonality.get(&(material_id.0.clone(), month)).copied())
    }

    async fn top_vendor_offers(
        &self,
        material_id: &MaterialId,
        limit: u32,
    ) -> Result<Vec<RankedOffer>, DatasetError> {
        let mut offers = self.offers.get(&material_id.0).cloned().unwrap_or_default();
        offers.sort_by(|a, b| a.unit_price.cmp(&b.unit_price));
        offers.truncate(limit as usize);
        Ok(offers)
    }
}

#[derive(Default)]
pub struct InMemoryEstimateRepository {
    estimates: Mutex<HashMap<String, Estimate>>,
}

#[async_trait]
impl EstimateRepository for InMemoryEstimateRepository {
    async fn find_by_id(&self, id: &EstimateId) -> Result<Option<Estimate>, RepositoryError> {
        let estimates = self.estimates.lock().expect("estimate store lock");
        Ok(estimates.get(&id.0).cloned())
    }

    async fn save(&self, estimate: Estimate) -> Result<(), RepositoryError> {
        let mut estimates = self.estimates.lock().expect("estimate store lock");
        estimates.insert(estimate.id.0.clone(), estimate);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    use metrika_core::domain::material::{Material, MaterialId, PriceObservation, SeasonalityFactor};
    use metrika_core::domain::vendor::RankedOffer;
    use metrika_core::engine::dataset::PricingDataset;

    use super::InMemoryPricingDataset;

    fn material(key: &str) -> Material {
        Material {
            id: MaterialId(format!("mat-{key}")),
            name: key.to_string(),
            unit: "kg".to_string(),
            category: "Test".to_string(),
            spec: String::new(),
            mapping_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn latest_price_picks_the_most_recent_observation_for_the_region() {
        let mut dataset = InMemoryPricingDataset::default();
        let id = MaterialId("mat-rebar".to_string());
        dataset.add_material(material("rebar"));

        for (year, price) in [(2024, 70i64), (2026, 90), (2025, 80)] {
            dataset.add_observation(PriceObservation {
                material_id: id.clone(),
                region: "Greece".to_string(),
                observed_at: Utc.with_ymd_and_hms(year, 1, 15, 0, 0, 0).unwrap(),
                unit_price: Decimal::new(price, 2),
            });
        }
        dataset.add_observation(PriceObservation {
            material_id: id.clone(),
            region: "Italy".to_string(),
            observed_at: Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap(),
            unit_price: Decimal::new(99, 2),
        });

        let latest = dataset
            .latest_price(&id, "Greece")
            .await
            .expect("query")
            .expect("observation exists");

        assert_eq!(latest.unit_price, Decimal::new(90, 2));
        assert_eq!(latest.observed_at.format("%Y").to_string(), "2026");
    }

    #[tokio::test]
    async fn seasonality_and_offer_lookups_mirror_the_sql_contracts() {
        let mut dataset = InMemoryPricingDataset::default();
        let id = MaterialId("mat-cement".to_string());
        dataset.add_material(material("cement"));
        dataset.add_seasonality(SeasonalityFactor {
            material_id: id.clone(),
            month: 3,
            factor: Decimal::new(103, 2),
        });

        for (vendor, price) in [("Alpha", 90i64), ("Beta", 70), ("Gamma", 80)] {
            dataset.add_offer(
                &id,
                RankedOffer {
                    vendor_name: vendor.to_string(),
                    vendor_region: "Athens".to_string(),
                    contact_email: None,
                    unit_price: Decimal::new(price, 0),
                    stock_qty: Decimal::new(10, 0),
                    lead_time_days: 2,
                    moq: Decimal::ONE,
                },
            );
        }

        assert_eq!(dataset.seasonality(&id, 3).await.unwrap(), Some(Decimal::new(103, 2)));
        assert_eq!(dataset.seasonality(&id, 4).await.unwrap(), None);

        let offers = dataset.top_vendor_offers(&id, 2).await.unwrap();
        let vendors: Vec<&str> = offers.iter().map(|offer| offer.vendor_name.as_str()).collect();
        assert_eq!(vendors, vec!["Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn estimate_store_round_trips_by_id() {
        use std::collections::BTreeMap;

        use metrika_core::domain::estimate::{
            ConfidenceBand, Estimate, EstimateId, EstimateRequest, EstimateResult,
        };

        use super::super::EstimateRepository;
        use super::InMemoryEstimateRepository;

        let repository = InMemoryEstimateRepository::default();
        let estimate = Estimate::new(
            EstimateRequest {
                project_type: "hotel".to_string(),
                location: "Athens".to_string(),
                size: Decimal::new(10, 0),
                size_unit: "rooms".to_string(),
                start_month: 1,
                duration_months: 6,
                structural_class: None,
                star_rating: None,
                storey_count: None,
                facade_type: None,
                concrete_class: None,
                rebar_grade: None,
                earthworks_volume: None,
                preferred_vendors: None,
            },
            EstimateResult {
                boq_items: Vec::new(),
                total_cost: Decimal::ZERO,
                confidence_bands: ConfidenceBand::around(Decimal::ZERO),
                vendor_recommendations: BTreeMap::new(),
                seasonal_chart_data: Vec::new(),
                assumptions: Vec::new(),
                cost_drivers: Vec::new(),
                skipped_materials: Vec::new(),
            },
        );
        let id = estimate.id.clone();

        repository.save(estimate.clone()).await.expect("save");
        let loaded = repository.find_by_id(&id).await.expect("query").expect("present");
        assert_eq!(loaded, estimate);

        let missing = repository.find_by_id(&EstimateId("absent".to_string())).await.unwrap();
        assert!(missing.is_none());
    }
}
