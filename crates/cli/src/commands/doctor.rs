use serde::Serialize;

use metrika_core::config::{AppConfig, LoadOptions};
use metrika_db::{connect_with_settings, DemoCatalog};

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: &'static str,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    status: &'static str,
    checks: Vec<DoctorCheck>,
}

/// Readiness report: config validity, database connectivity, schema
/// presence, and whether a catalog is loaded. Never fails the process;
/// the report itself carries the verdict.
pub fn run(json: bool) -> String {
    let mut checks = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config",
                status: "ok",
                detail: format!(
                    "database `{}`, pricing region `{}`",
                    config.database.url, config.pricing.region
                ),
            });
            Some(config)
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config",
                status: "failed",
                detail: error.to_string(),
            });
            None
        }
    };

    if let Some(config) = config {
        match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime.block_on(async {
                match connect_with_settings(
                    &config.database.url,
                    config.database.max_connections,
                    config.database.timeout_secs,
                )
                .await
                {
                    Ok(pool) => {
                        checks.push(DoctorCheck {
                            name: "database",
                            status: "ok",
                            detail: "connection established".to_string(),
                        });

                        let schema_present: Result<i64, sqlx::Error> = sqlx::query_scalar(
                            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'material'",
                        )
                        .fetch_one(&pool)
                        .await;
                        match schema_present {
                            Ok(1) => {
                                checks.push(DoctorCheck {
                                    name: "schema",
                                    status: "ok",
                                    detail: "catalog tables present".to_string(),
                                });

                                match DemoCatalog::verify(&pool).await {
                                    Ok(verification) if verification.all_present => {
                                        checks.push(DoctorCheck {
                                            name: "catalog",
                                            status: "ok",
                                            detail: "demo catalog loaded".to_string(),
                                        });
                                    }
                                    Ok(_) => {
                                        checks.push(DoctorCheck {
                                            name: "catalog",
                                            status: "warn",
                                            detail: "catalog empty or partial; run `metrika seed`"
                                                .to_string(),
                                        });
                                    }
                                    Err(error) => {
                                        checks.push(DoctorCheck {
                                            name: "catalog",
                                            status: "failed",
                                            detail: error.to_string(),
                                        });
                                    }
                                }
                            }
                            Ok(_) => {
                                checks.push(DoctorCheck {
                                    name: "schema",
                                    status: "warn",
                                    detail: "migrations not applied; run `metrika migrate`"
                                        .to_string(),
                                });
                            }
                            Err(error) => {
                                checks.push(DoctorCheck {
                                    name: "schema",
                                    status: "failed",
                                    detail: error.to_string(),
                                });
                            }
                        }

                        pool.close().await;
                    }
                    Err(error) => {
                        checks.push(DoctorCheck {
                            name: "database",
                            status: "failed",
                            detail: error.to_string(),
                        });
                    }
                }
            }),
            Err(error) => {
                checks.push(DoctorCheck {
                    name: "runtime",
                    status: "failed",
                    detail: error.to_string(),
                });
            }
        }
    }

    let status = if checks.iter().any(|check| check.status == "failed") {
        "failed"
    } else if checks.iter().any(|check| check.status == "warn") {
        "warn"
    } else {
        "ok"
    };

    let report = DoctorReport { status, checks };

    if json {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!("{{\"status\":\"failed\",\"detail\":\"serialization: {error}\"}}")
        })
    } else {
        let mut lines = vec![format!("doctor: {}", report.status)];
        for check in &report.checks {
            lines.push(format!("  [{:>6}] {:<8} {}", check.status, check.name, check.detail));
        }
        lines.join("\n")
    }
}
