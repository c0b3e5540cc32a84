use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Demo catalog contract: the Greek construction dataset the service
/// ships with for demos and end-to-end tests.
struct SeedMaterial {
    id: &'static str,
    name: &'static str,
    unit: &'static str,
    category: &'static str,
    spec: &'static str,
    mapping_key: &'static str,
    base_price: &'static str,
    seasonality: [&'static str; 12],
}

struct SeedVendor {
    id: &'static str,
    name: &'static str,
    region: &'static str,
    email: &'static str,
    phone: &'static str,
    reliability_score: &'static str,
}

struct SeedOffer {
    vendor_id: &'static str,
    material_id: &'static str,
    unit_price: &'static str,
    stock_qty: &'static str,
    lead_time_days: i64,
    moq: &'static str,
}

const SEED_MATERIALS: &[SeedMaterial] = &[
    SeedMaterial {
        id: "mat-concrete_c30",
        name: "Concrete C30/37",
        unit: "m³",
        category: "Concrete",
        spec: "Standard structural concrete",
        mapping_key: "concrete_c30",
        base_price: "85.0",
        seasonality: [
            "1.05", "1.03", "1.00", "0.98", "0.95", "0.93", "0.95", "0.97", "1.00", "1.02",
            "1.05", "1.08",
        ],
    },
    SeedMaterial {
        id: "mat-rebar_b500c",
        name: "Steel Rebar B500C",
        unit: "kg",
        category: "Steel",
        spec: "High-yield deformed bars",
        mapping_key: "rebar_b500c",
        base_price: "0.75",
        seasonality: [
            "1.08", "1.05", "1.02", "0.98", "0.95", "0.92", "0.95", "0.98", "1.02", "1.05",
            "1.08", "1.10",
        ],
    },
    SeedMaterial {
        id: "mat-steel_s355",
        name: "Structural Steel S355",
        unit: "kg",
        category: "Steel",
        spec: "Hot-rolled structural steel",
        mapping_key: "steel_s355",
        base_price: "1.20",
        seasonality: [
            "1.10", "1.07", "1.03", "0.98", "0.94", "0.90", "0.93", "0.97", "1.02", "1.06",
            "1.10", "1.12",
        ],
    },
    SeedMaterial {
        id: "mat-cement_42_5",
        name: "Cement CEM I 42.5",
        unit: "t",
        category: "Cement",
        spec: "Portland cement",
        mapping_key: "cement_42_5",
        base_price: "120.0",
        seasonality: [
            "1.03", "1.02", "1.00", "0.99", "0.97", "0.95", "0.97", "0.99", "1.01", "1.02",
            "1.03", "1.04",
        ],
    },
    SeedMaterial {
        id: "mat-bitumen_50_70",
        name: "Bitumen 50/70",
        unit: "t",
        category: "Bitumen",
        spec: "Road construction bitumen",
        mapping_key: "bitumen_50_70",
        base_price: "450.0",
        seasonality: [
            "1.15", "1.10", "1.05", "0.95", "0.85", "0.80", "0.85", "0.95", "1.05", "1.10",
            "1.15", "1.20",
        ],
    },
    SeedMaterial {
        id: "mat-aggregate_mixed",
        name: "Aggregate 0-32mm",
        unit: "t",
        category: "Aggregate",
        spec: "Mixed aggregate",
        mapping_key: "aggregate_mixed",
        base_price: "25.0",
        seasonality: [
            "1.02", "1.01", "1.00", "0.99", "0.98", "0.97", "0.98", "0.99", "1.00", "1.01",
            "1.02", "1.03",
        ],
    },
    SeedMaterial {
        id: "mat-formwork_plywood",
        name: "Formwork Plywood",
        unit: "m²",
        category: "Formwork",
        spec: "18mm marine plywood",
        mapping_key: "formwork_plywood",
        base_price: "35.0",
        seasonality: [
            "1.05", "1.03", "1.01", "0.99", "0.97", "0.95", "0.97", "0.99", "1.01", "1.03",
            "1.05", "1.07",
        ],
    },
    SeedMaterial {
        id: "mat-labor_skilled",
        name: "Labor - Skilled",
        unit: "hour",
        category: "Labor",
        spec: "Skilled construction worker",
        mapping_key: "labor_skilled",
        base_price: "25.0",
        seasonality: [
            "1.00", "1.00", "1.02", "1.05", "1.08", "1.10", "1.08", "1.05", "1.02", "1.00",
            "1.00", "1.00",
        ],
    },
    SeedMaterial {
        id: "mat-labor_general",
        name: "Labor - General",
        unit: "hour",
        category: "Labor",
        spec: "General construction worker",
        mapping_key: "labor_general",
        base_price: "18.0",
        seasonality: [
            "1.00", "1.00", "1.02", "1.05", "1.08", "1.10", "1.08", "1.05", "1.02", "1.00",
            "1.00", "1.00",
        ],
    },
    SeedMaterial {
        id: "mat-excavator_20t",
        name: "Excavator Rental",
        unit: "day",
        category: "Equipment",
        spec: "20-ton excavator",
        mapping_key: "excavator_20t",
        base_price: "350.0",
        seasonality: [
            "1.10", "1.08", "1.05", "1.02", "0.98", "0.95", "0.98", "1.02", "1.05", "1.08",
            "1.10", "1.12",
        ],
    },
];

const SEED_VENDORS: &[SeedVendor] = &[
    SeedVendor {
        id: "vendor-hellenic-concrete",
        name: "Hellenic Concrete Co.",
        region: "Athens",
        email: "sales@hellenic-concrete.gr",
        phone: "+30 210 123 4567",
        reliability_score: "4.5",
    },
    SeedVendor {
        id: "vendor-steel-masters",
        name: "Steel Masters SA",
        region: "Thessaloniki",
        email: "orders@steelmasters.gr",
        phone: "+30 231 987 6543",
        reliability_score: "4.2",
    },
    SeedVendor {
        id: "vendor-med-aggregates",
        name: "Mediterranean Aggregates",
        region: "Patras",
        email: "info@med-aggregates.gr",
        phone: "+30 261 555 0123",
        reliability_score: "4.0",
    },
    SeedVendor {
        id: "vendor-athens-supply",
        name: "Athens Construction Supply",
        region: "Athens",
        email: "supply@athens-construction.gr",
        phone: "+30 210 888 9999",
        reliability_score: "4.3",
    },
    SeedVendor {
        id: "vendor-northern-equipment",
        name: "Northern Equipment Rental",
        region: "Thessaloniki",
        email: "rentals@northern-equip.gr",
        phone: "+30 231 444 5555",
        reliability_score: "4.1",
    },
];

const SEED_OFFERS: &[SeedOffer] = &[
    SeedOffer {
        vendor_id: "vendor-hellenic-concrete",
        material_id: "mat-concrete_c30",
        unit_price: "82.0",
        stock_qty: "1000",
        lead_time_days: 3,
        moq: "10",
    },
    SeedOffer {
        vendor_id: "vendor-hellenic-concrete",
        material_id: "mat-cement_42_5",
        unit_price: "115.0",
        stock_qty: "500",
        lead_time_days: 7,
        moq: "5",
    },
    SeedOffer {
        vendor_id: "vendor-steel-masters",
        material_id: "mat-rebar_b500c",
        unit_price: "0.72",
        stock_qty: "50000",
        lead_time_days: 14,
        moq: "1000",
    },
    SeedOffer {
        vendor_id: "vendor-steel-masters",
        material_id: "mat-steel_s355",
        unit_price: "1.15",
        stock_qty: "25000",
        lead_time_days: 21,
        moq: "500",
    },
    SeedOffer {
        vendor_id: "vendor-med-aggregates",
        material_id: "mat-aggregate_mixed",
        unit_price: "23.0",
        stock_qty: "2000",
        lead_time_days: 2,
        moq: "20",
    },
    SeedOffer {
        vendor_id: "vendor-med-aggregates",
        material_id: "mat-bitumen_50_70",
        unit_price: "440.0",
        stock_qty: "100",
        lead_time_days: 10,
        moq: "2",
    },
    SeedOffer {
        vendor_id: "vendor-athens-supply",
        material_id: "mat-formwork_plywood",
        unit_price: "33.0",
        stock_qty: "800",
        lead_time_days: 5,
        moq: "50",
    },
    SeedOffer {
        vendor_id: "vendor-athens-supply",
        material_id: "mat-labor_skilled",
        unit_price: "24.0",
        stock_qty: "0",
        lead_time_days: 1,
        moq: "8",
    },
    SeedOffer {
        vendor_id: "vendor-northern-equipment",
        material_id: "mat-excavator_20t",
        unit_price: "340.0",
        stock_qty: "5",
        lead_time_days: 1,
        moq: "1",
    },
    SeedOffer {
        vendor_id: "vendor-northern-equipment",
        material_id: "mat-labor_general",
        unit_price: "17.0",
        stock_qty: "0",
        lead_time_days: 1,
        moq: "8",
    },
];

const PRICE_HISTORY_MONTHS: i64 = 24;

#[derive(Debug)]
pub struct SeedResult {
    pub already_seeded: bool,
    pub materials: usize,
    pub vendors: usize,
    pub observations: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub checks: Vec<(&'static str, bool)>,
    pub all_present: bool,
}

/// Deterministic demo catalog: 10 materials with 24 months of price
/// history and 12-month seasonality patterns, 5 vendors, 10 offers.
pub struct DemoCatalog;

impl DemoCatalog {
    /// First observation month of the price history. Fixed so the seed is
    /// byte-identical across runs.
    fn history_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap()
    }

    /// Load the demo catalog. A no-op when materials already exist, so the
    /// command is safe to re-run.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM material").fetch_one(pool).await?;
        if existing > 0 {
            return Ok(SeedResult {
                already_seeded: true,
                materials: 0,
                vendors: 0,
                observations: 0,
            });
        }

        let mut tx = pool.begin().await?;
        let mut observations = 0usize;

        for material in SEED_MATERIALS {
            sqlx::query(
                "INSERT INTO material (id, name, unit, category, spec, mapping_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(material.id)
            .bind(material.name)
            .bind(material.unit)
            .bind(material.category)
            .bind(material.spec)
            .bind(material.mapping_key)
            .execute(&mut *tx)
            .await?;

            let base_price: Decimal = material
                .base_price
                .parse()
                .map_err(|error| RepositoryError::Decode(format!("seed base price: {error}")))?;

            // 24 monthly observations with the reference +-15% drift:
            // 1.0 + (month_index % 12 - 6) * 0.025, newest last.
            for index in 0..PRICE_HISTORY_MONTHS {
                let drift = Decimal::new(index % 12 - 6, 0) * Decimal::new(25, 3);
                let price = base_price * (Decimal::ONE + drift);
                let observed_at = Self::history_start() + Duration::days(index * 30);

                sqlx::query(
                    "INSERT INTO price_observation (material_id, region, observed_at, unit_price)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .bind(material.id)
                .bind("Greece")
                .bind(observed_at)
                .bind(price.to_string())
                .execute(&mut *tx)
                .await?;
                observations += 1;
            }

            for (month_index, factor) in material.seasonality.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO seasonality_factor (material_id, month, factor)
                     VALUES (?1, ?2, ?3)",
                )
                .bind(material.id)
                .bind((month_index + 1) as i64)
                .bind(*factor)
                .execute(&mut *tx)
                .await?;
            }
        }

        for vendor in SEED_VENDORS {
            sqlx::query(
                "INSERT INTO vendor (id, name, region, contact_email, contact_phone, reliability_score)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(vendor.id)
            .bind(vendor.name)
            .bind(vendor.region)
            .bind(vendor.email)
            .bind(vendor.phone)
            .bind(vendor.reliability_score)
            .execute(&mut *tx)
            .await?;
        }

        for offer in SEED_OFFERS {
            sqlx::query(
                "INSERT INTO vendor_offer
                     (vendor_id, material_id, unit_price, stock_qty, lead_time_days, moq, tier_rules)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, '{}')",
            )
            .bind(offer.vendor_id)
            .bind(offer.material_id)
            .bind(offer.unit_price)
            .bind(offer.stock_qty)
            .bind(offer.lead_time_days)
            .bind(offer.moq)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(SeedResult {
            already_seeded: false,
            materials: SEED_MATERIALS.len(),
            vendors: SEED_VENDORS.len(),
            observations,
        })
    }

    /// Verify the seed contract holds: row counts per table match the
    /// const tables above.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        let materials: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM material").fetch_one(pool).await?;
        checks.push(("materials", materials as usize == SEED_MATERIALS.len()));

        let observations: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM price_observation").fetch_one(pool).await?;
        let expected_observations = SEED_MATERIALS.len() * PRICE_HISTORY_MONTHS as usize;
        checks.push(("price-observations", observations as usize == expected_observations));

        let seasonality: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM seasonality_factor").fetch_one(pool).await?;
        checks.push(("seasonality-factors", seasonality as usize == SEED_MATERIALS.len() * 12));

        let vendors: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM vendor").fetch_one(pool).await?;
        checks.push(("vendors", vendors as usize == SEED_VENDORS.len()));

        let offers: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM vendor_offer").fetch_one(pool).await?;
        checks.push(("vendor-offers", offers as usize == SEED_OFFERS.len()));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { checks, all_present })
    }
}
