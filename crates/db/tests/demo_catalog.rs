use rust_decimal::Decimal;

use metrika_core::domain::estimate::{Estimate, EstimateRequest};
use metrika_core::domain::material::MaterialId;
use metrika_core::engine::dataset::PricingDataset;
use metrika_core::engine::EstimationEngine;
use metrika_db::repositories::{EstimateRepository, SqlEstimateRepository, SqlPricingDataset};
use metrika_db::{connect_with_settings, migrations, DbPool, DemoCatalog};

async fn seeded_pool() -> DbPool {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("run migrations");
    let seeded = DemoCatalog::load(&pool).await.expect("seed demo catalog");
    assert!(!seeded.already_seeded);
    pool
}

fn bridge_request() -> EstimateRequest {
    EstimateRequest {
        project_type: "bridge".to_string(),
        location: "Athens".to_string(),
        size: Decimal::new(2, 0),
        size_unit: "lane_km".to_string(),
        start_month: 1,
        duration_months: 12,
        structural_class: None,
        star_rating: None,
        storey_count: None,
        facade_type: None,
        concrete_class: None,
        rebar_grade: None,
        earthworks_volume: None,
        preferred_vendors: None,
    }
}

#[tokio::test]
async fn seed_satisfies_its_verification_contract() {
    let pool = seeded_pool().await;

    let verification = DemoCatalog::verify(&pool).await.expect("verify seed");
    assert!(verification.all_present, "failed checks: {:?}", verification.checks);

    // Re-running the seed is a no-op.
    let second = DemoCatalog::load(&pool).await.expect("reseed");
    assert!(second.already_seeded);

    pool.close().await;
}

#[tokio::test]
async fn dataset_queries_resolve_against_the_seeded_catalog() {
    let pool = seeded_pool().await;
    let dataset = SqlPricingDataset::new(pool.clone());

    let concrete = dataset
        .material_by_key("concrete_c30")
        .await
        .expect("query")
        .expect("concrete is seeded");
    assert_eq!(concrete.name, "Concrete C30/37");
    assert_eq!(concrete.unit, "m³");

    // Newest observation carries the end-of-history drift: 85.0 * 1.125.
    let latest = dataset
        .latest_price(&concrete.id, "Greece")
        .await
        .expect("query")
        .expect("price history is seeded");
    assert_eq!(latest.unit_price, "95.625".parse::<Decimal>().unwrap());

    let none = dataset.latest_price(&concrete.id, "Italy").await.expect("query");
    assert!(none.is_none(), "no observations exist outside Greece");

    let january = dataset.seasonality(&concrete.id, 1).await.expect("query");
    assert_eq!(january, Some(Decimal::new(105, 2)));
    let missing = dataset.seasonality(&MaterialId("mat-unknown".to_string()), 1).await.unwrap();
    assert!(missing.is_none());

    pool.close().await;
}

#[tokio::test]
async fn vendor_offers_rank_ascending_with_ties_on_rowid() {
    let pool = seeded_pool().await;
    let dataset = SqlPricingDataset::new(pool.clone());

    let labor = dataset
        .material_by_key("labor_general")
        .await
        .expect("query")
        .expect("labor is seeded");
    let offers = dataset.top_vendor_offers(&labor.id, 3).await.expect("query");

    assert_eq!(offers.len(), 1);
    assert_eq!(offers[0].vendor_name, "Northern Equipment Rental");
    assert_eq!(offers[0].unit_price, Decimal::new(170, 1));
    assert_eq!(offers[0].stock_qty, Decimal::ZERO);

    pool.close().await;
}

#[tokio::test]
async fn engine_runs_end_to_end_over_the_sql_dataset() {
    let pool = seeded_pool().await;
    let dataset = SqlPricingDataset::new(pool.clone());
    let engine = EstimationEngine::with_defaults();

    let request = bridge_request();
    let result = engine.generate(&request, &dataset).await.expect("estimate succeeds");

    // Every bridge template line is priced by the demo catalog.
    assert_eq!(result.boq_items.len(), 7);
    assert!(result.skipped_materials.is_empty());
    assert!(result.total_cost > Decimal::ZERO);
    assert_eq!(result.confidence_bands.p50.round_dp(2), result.total_cost);

    let concrete_recs = &result.vendor_recommendations["Concrete C30/37"];
    assert_eq!(concrete_recs.len(), 1);
    assert_eq!(concrete_recs[0].contact, "sales@hellenic-concrete.gr");

    // 7 materials x 12 months of chart points.
    assert_eq!(result.seasonal_chart_data.len(), 84);

    pool.close().await;
}

#[tokio::test]
async fn estimates_round_trip_through_the_sql_store() {
    let pool = seeded_pool().await;
    let dataset = SqlPricingDataset::new(pool.clone());
    let repository = SqlEstimateRepository::new(pool.clone());
    let engine = EstimationEngine::with_defaults();

    let request = bridge_request();
    let result = engine.generate(&request, &dataset).await.expect("estimate succeeds");
    let estimate = Estimate::new(request, result);
    let id = estimate.id.clone();

    repository.save(estimate.clone()).await.expect("save estimate");

    let loaded = repository.find_by_id(&id).await.expect("load").expect("estimate exists");
    assert_eq!(loaded.id, estimate.id);
    assert_eq!(loaded.request, estimate.request);
    assert_eq!(loaded.result, estimate.result);

    let missing = repository
        .find_by_id(&metrika_core::domain::estimate::EstimateId("nope".to_string()))
        .await
        .expect("query");
    assert!(missing.is_none());

    pool.close().await;
}
