use clap::Args;
use rust_decimal::Decimal;

use crate::commands::CommandResult;
use metrika_core::config::{AppConfig, LoadOptions};
use metrika_core::domain::estimate::{Estimate, EstimateRequest};
use metrika_core::engine::{EngineOptions, EstimationEngine, TemplateRegistry};
use metrika_core::errors::{ApplicationError, DomainError};
use metrika_db::repositories::{EstimateRepository, SqlEstimateRepository, SqlPricingDataset};
use metrika_db::{connect_with_settings, migrations};

#[derive(Debug, Args)]
pub struct EstimateArgs {
    #[arg(long, help = "Project template tag: bridge, hotel, or business_park")]
    pub project_type: String,
    #[arg(long, help = "Free-text project location, e.g. 'Athens'")]
    pub location: String,
    #[arg(long, help = "Project size in template units (lane-km, rooms, m²)")]
    pub size: Decimal,
    #[arg(long, help = "Label for the size unit, informational only")]
    pub size_unit: String,
    #[arg(long, help = "Construction start month, 1-12")]
    pub start_month: u32,
    #[arg(long, help = "Project duration in months")]
    pub duration_months: u32,
}

impl EstimateArgs {
    fn into_request(self) -> EstimateRequest {
        EstimateRequest {
            project_type: self.project_type,
            location: self.location,
            size: self.size,
            size_unit: self.size_unit,
            start_month: self.start_month,
            duration_months: self.duration_months,
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
}

pub fn run(args: EstimateArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "estimate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "estimate",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let request = args.into_request();

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let engine = EstimationEngine::new(
            TemplateRegistry::builtin(),
            EngineOptions {
                region: config.pricing.region.clone(),
                vendor_limit: config.pricing.vendor_limit,
            },
        );
        let dataset = SqlPricingDataset::new(pool.clone());

        let outcome = engine.generate(&request, &dataset).await.map_err(|error| match error {
            ApplicationError::Domain(DomainError::UnknownProjectType { .. }) => {
                ("unknown_project_type", error.to_string(), 2u8)
            }
            ApplicationError::Domain(_) => ("invalid_request", error.to_string(), 2u8),
            other => ("estimate_execution", other.to_string(), 5u8),
        });

        let run_result = match outcome {
            Ok(result) => {
                let estimate = Estimate::new(request.clone(), result);
                let repository = SqlEstimateRepository::new(pool.clone());
                repository
                    .save(estimate.clone())
                    .await
                    .map_err(|error| ("estimate_persistence", error.to_string(), 5u8))?;

                serde_json::to_string_pretty(&estimate)
                    .map_err(|error| ("serialization", error.to_string(), 5u8))
            }
            Err(failure) => Err(failure),
        };

        pool.close().await;
        run_result
    });

    match result {
        Ok(rendered) => CommandResult { exit_code: 0, output: rendered },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("estimate", error_class, message, exit_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::EstimateArgs;

    #[test]
    fn args_map_onto_a_request_with_empty_refinements() {
        let args = EstimateArgs {
            project_type: "hotel".to_string(),
            location: "Athens".to_string(),
            size: Decimal::new(100, 0),
            size_unit: "rooms".to_string(),
            start_month: 1,
            duration_months: 6,
        };

        let request = args.into_request();
        assert_eq!(request.project_type, "hotel");
        assert_eq!(request.size, Decimal::new(100, 0));
        assert!(request.preferred_vendors.is_none());
        request.validate().expect("mapped request is valid");
    }
}
