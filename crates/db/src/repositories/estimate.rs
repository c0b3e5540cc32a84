use chrono::{DateTime, Utc};
use sqlx::Row;

use metrika_core::domain::estimate::{Estimate, EstimateId, EstimateRequest, EstimateResult};

use super::{EstimateRepository, RepositoryError};
use crate::DbPool;

/// Stores estimates as request/result JSON documents keyed by id. An
/// estimate is written once and never updated.
pub struct SqlEstimateRepository {
    pool: DbPool,
}

impl SqlEstimateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EstimateRepository for SqlEstimateRepository {
    async fn find_by_id(&self, id: &EstimateId) -> Result<Option<Estimate>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, project_meta, results, created_at FROM estimate WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let raw_request: String = row.try_get("project_meta")?;
        let raw_result: String = row.try_get("results")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;

        let request: EstimateRequest = serde_json::from_str(&raw_request).map_err(|error| {
            RepositoryError::Decode(format!("estimate `{}` project_meta: {error}", id.0))
        })?;
        let result: EstimateResult = serde_json::from_str(&raw_result).map_err(|error| {
            RepositoryError::Decode(format!("estimate `{}` results: {error}", id.0))
        })?;

        Ok(Some(Estimate { id: EstimateId(row.try_get("id")?), request, result, created_at }))
    }

    async fn save(&self, estimate: Estimate) -> Result<(), RepositoryError> {
        let project_meta = serde_json::to_string(&estimate.request).map_err(|error| {
            RepositoryError::Decode(format!("serialize estimate request: {error}"))
        })?;
        let results = serde_json::to_string(&estimate.result).map_err(|error| {
            RepositoryError::Decode(format!("serialize estimate result: {error}"))
        })?;

        sqlx::query(
            "INSERT INTO estimate (id, project_meta, results, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&estimate.id.0)
        .bind(project_meta)
        .bind(results)
        .bind(estimate.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
