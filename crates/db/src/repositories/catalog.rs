use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use metrika_core::domain::material::{Material, MaterialId, PriceObservation};
use metrika_core::domain::vendor::{RankedOffer, Vendor, VendorContacts, VendorId};
use metrika_core::engine::dataset::{DatasetError, PricingDataset};

use super::{decode_decimal, CatalogRepository, RepositoryError};
use crate::DbPool;

/// Read-only sqlx implementation of the engine's pricing dataset plus the
/// catalog listing endpoints.
pub struct SqlPricingDataset {
    pool: DbPool,
}

impl SqlPricingDataset {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn db_err(error: sqlx::Error) -> DatasetError {
    DatasetError(format!("database error: {error}"))
}

fn decode_err(error: RepositoryError) -> DatasetError {
    DatasetError(error.to_string())
}

fn material_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Material, sqlx::Error> {
    Ok(Material {
        id: MaterialId(row.try_get("id")?),
        name: row.try_get("name")?,
        unit: row.try_get("unit")?,
        category: row.try_get("category")?,
        spec: row.try_get("spec")?,
        mapping_key: row.try_get("mapping_key")?,
    })
}

#[async_trait]
impl PricingDataset for SqlPricingDataset {
    async fn material_by_key(&self, key: &str) -> Result<Option<Material>, DatasetError> {
        let row = sqlx::query(
            "SELECT id, name, unit, category, spec, mapping_key
             FROM material
             WHERE mapping_key = ?1",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(material_from_row).transpose().map_err(db_err)
    }

    async fn latest_price(
        &self,
        material_id: &MaterialId,
        region: &str,
    ) -> Result<Option<PriceObservation>, DatasetError> {
        let row = sqlx::query(
            "SELECT material_id, region, observed_at, unit_price
             FROM price_observation
             WHERE material_id = ?1 AND region = ?2
             ORDER BY observed_at DESC
             LIMIT 1",
        )
        .bind(&material_id.0)
        .bind(region)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let Some(row) = row else { return Ok(None) };

        let observed_at: DateTime<Utc> = row.try_get("observed_at").map_err(db_err)?;
        let raw_price: String = row.try_get("unit_price").map_err(db_err)?;

        Ok(Some(PriceObservation {
            material_id: MaterialId(row.try_get("material_id").map_err(db_err)?),
            region: row.try_get("region").map_err(db_err)?,
            observed_at,
            unit_price: decode_decimal("unit_price", &raw_price).map_err(decode_err)?,
        }))
    }

    async fn seasonality(
        &self,
        material_id: &MaterialId,
        month: u32,
    ) -> Result<Option<Decimal>, DatasetError> {
        let raw: Option<String> = sqlx::query_scalar(
            "SELECT factor FROM seasonality_factor WHERE material_id = ?1 AND month = ?2",
        )
        .bind(&material_id.0)
        .bind(month as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        raw.map(|value| decode_decimal("factor", &value).map_err(decode_err)).transpose()
    }

    async fn top_vendor_offers(
        &self,
        material_id: &MaterialId,
        limit: u32,
    ) -> Result<Vec<RankedOffer>, DatasetError> {
        // Prices are TEXT-encoded; the CAST keeps ordering numeric. Ties
        // fall back to insertion order via the rowid.
        let rows = sqlx::query(
            "SELECT v.name AS vendor_name, v.region AS vendor_region,
                    v.contact_email, o.unit_price, o.stock_qty,
                    o.lead_time_days, o.moq
             FROM vendor_offer o
             JOIN vendor v ON v.id = o.vendor_id
             WHERE o.material_id = ?1
             ORDER BY CAST(o.unit_price AS REAL) ASC, o.id ASC
             LIMIT ?2",
        )
        .bind(&material_id.0)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter()
            .map(|row| {
                let raw_price: String = row.try_get("unit_price").map_err(db_err)?;
                let raw_stock: String = row.try_get("stock_qty").map_err(db_err)?;
                let raw_moq: String = row.try_get("moq").map_err(db_err)?;
                let lead_time_days: i64 = row.try_get("lead_time_days").map_err(db_err)?;

                Ok(RankedOffer {
                    vendor_name: row.try_get("vendor_name").map_err(db_err)?,
                    vendor_region: row.try_get("vendor_region").map_err(db_err)?,
                    contact_email: row.try_get("contact_email").map_err(db_err)?,
                    unit_price: decode_decimal("unit_price", &raw_price).map_err(decode_err)?,
                    stock_qty: decode_decimal("stock_qty", &raw_stock).map_err(decode_err)?,
                    lead_time_days: lead_time_days as u32,
                    moq: decode_decimal("moq", &raw_moq).map_err(decode_err)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CatalogRepository for SqlPricingDataset {
    async fn list_materials(&self) -> Result<Vec<Material>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, unit, category, spec, mapping_key FROM material ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| material_from_row(row).map_err(RepositoryError::Database)).collect()
    }

    async fn list_vendors(&self) -> Result<Vec<Vendor>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, region, contact_email, contact_phone, reliability_score
             FROM vendor
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let raw_score: String = row.try_get("reliability_score")?;
                Ok(Vendor {
                    id: VendorId(row.try_get("id")?),
                    name: row.try_get("name")?,
                    region: row.try_get("region")?,
                    contacts: VendorContacts {
                        email: row.try_get("contact_email")?,
                        phone: row.try_get("contact_phone")?,
                    },
                    reliability_score: decode_decimal("reliability_score", &raw_score)?,
                })
            })
            .collect()
    }
}
