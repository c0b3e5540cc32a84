use std::sync::Arc;

use metrika_core::config::{AppConfig, ConfigError, LoadOptions};
use metrika_core::engine::{EngineOptions, EstimationEngine, TemplateRegistry};
use metrika_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::api::ApiState;
use crate::render::pdf::{PdfError, PdfGenerator};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: Arc<EstimationEngine>,
    pub pdf_generator: Arc<PdfGenerator>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("report template setup failed: {0}")]
    ReportTemplates(#[from] PdfError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let engine = Arc::new(EstimationEngine::new(
        TemplateRegistry::builtin(),
        EngineOptions {
            region: config.pricing.region.clone(),
            vendor_limit: config.pricing.vendor_limit,
        },
    ));
    let pdf_generator = Arc::new(PdfGenerator::new()?);

    Ok(Application { config, db_pool, engine, pdf_generator })
}

impl Application {
    pub fn api_state(&self) -> ApiState {
        ApiState {
            db_pool: self.db_pool.clone(),
            engine: self.engine.clone(),
            pdf_generator: self.pdf_generator.clone(),
            currency: self.config.pricing.currency.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use metrika_core::config::{ConfigOverrides, LoadOptions};
    use metrika_core::domain::estimate::EstimateRequest;
    use metrika_db::repositories::SqlPricingDataset;
    use metrika_db::DemoCatalog;
    use rust_decimal::Decimal;

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_configuration() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("postgres://elsewhere/metrika".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        let message = result.err().expect("invalid url should fail").to_string();
        assert!(message.contains("database.url"));
    }

    #[tokio::test]
    async fn integration_smoke_covers_startup_seed_and_estimate_path() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN ('material', 'price_observation', 'vendor_offer', 'estimate')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected catalog tables to be available after bootstrap");
        assert_eq!(table_count, 4, "bootstrap should expose baseline catalog tables");

        DemoCatalog::load(&app.db_pool).await.expect("seed demo catalog");

        let dataset = SqlPricingDataset::new(app.db_pool.clone());
        let request = EstimateRequest {
            project_type: "hotel".to_string(),
            location: "Athens".to_string(),
            size: Decimal::new(100, 0),
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
        };

        let result =
            app.engine.generate(&request, &dataset).await.expect("estimate checkpoint succeeds");
        assert_eq!(result.boq_items.len(), 7, "every hotel template line is priced by the seed");
        assert!(result.total_cost > Decimal::ZERO);
        assert!(!result.cost_drivers.is_empty());

        app.db_pool.close().await;
    }
}
