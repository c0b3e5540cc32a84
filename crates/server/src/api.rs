//! HTTP API for estimate generation and retrieval.
//!
//! Endpoints:
//! - `GET  /`                    — service banner
//! - `POST /estimate/run`        — generate, persist, and return an estimate
//! - `GET  /estimate/{id}`       — retrieve a stored estimate
//! - `GET  /catalog/items`       — material catalog
//! - `GET  /vendors`             — vendor directory
//! - `GET  /export/{id}/csv`     — BoQ CSV export of a stored estimate
//! - `GET  /export/{id}/pdf`     — PDF export (HTML fallback without wkhtmltopdf)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};
use uuid::Uuid;

use metrika_core::domain::estimate::{Estimate, EstimateId, EstimateRequest, EstimateResult};
use metrika_core::domain::material::Material;
use metrika_core::domain::vendor::Vendor;
use metrika_core::engine::EstimationEngine;
use metrika_core::errors::{ApplicationError, InterfaceError};
use metrika_db::repositories::{
    CatalogRepository, EstimateRepository, SqlEstimateRepository, SqlPricingDataset,
};
use metrika_db::DbPool;

use crate::render::csv::render_boq_csv;
use crate::render::pdf::{PdfGenerator, ReportArtifact};

#[derive(Clone)]
pub struct ApiState {
    pub db_pool: DbPool,
    pub engine: Arc<EstimationEngine>,
    pub pdf_generator: Arc<PdfGenerator>,
    pub currency: String,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ServiceBanner {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub id: String,
    #[serde(flatten)]
    pub result: EstimateResult,
}

impl From<Estimate> for EstimateResponse {
    fn from(estimate: Estimate) -> Self {
        Self { id: estimate.id.0, result: estimate.result }
    }
}

/// Catalog view without the template-internal mapping key.
#[derive(Debug, Serialize)]
pub struct MaterialView {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub category: String,
    pub spec: String,
}

impl From<Material> for MaterialView {
    fn from(material: Material) -> Self {
        Self {
            id: material.id.0,
            name: material.name,
            unit: material.unit,
            category: material.category,
            spec: material.spec,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    correlation_id: String,
}

pub struct ApiError(InterfaceError);

impl ApiError {
    fn from_application(error: ApplicationError, correlation_id: &str) -> Self {
        Self(error.into_interface(correlation_id))
    }

    fn persistence(detail: impl std::fmt::Display, correlation_id: &str) -> Self {
        Self::from_application(ApplicationError::Persistence(detail.to_string()), correlation_id)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, correlation_id) = match &self.0 {
            InterfaceError::BadRequest { correlation_id, .. } => {
                (StatusCode::BAD_REQUEST, correlation_id.clone())
            }
            InterfaceError::NotFound { correlation_id, .. } => {
                (StatusCode::NOT_FOUND, correlation_id.clone())
            }
            InterfaceError::ServiceUnavailable { correlation_id, .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, correlation_id.clone())
            }
            InterfaceError::Internal { correlation_id, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, correlation_id.clone())
            }
        };

        (status, Json(ErrorBody { error: self.0.to_string(), correlation_id })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/estimate/run", post(run_estimate))
        .route("/estimate/{id}", get(get_estimate))
        .route("/catalog/items", get(list_catalog_items))
        .route("/vendors", get(list_vendors))
        .route("/export/{id}/csv", get(export_csv))
        .route("/export/{id}/pdf", get(export_pdf))
        .with_state(state)
}

async fn root() -> Json<ServiceBanner> {
    Json(ServiceBanner { message: "Metrika Pricing & Sourcing API" })
}

async fn run_estimate(
    State(state): State<ApiState>,
    Json(request): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();

    let dataset = SqlPricingDataset::new(state.db_pool.clone());
    let result = state.engine.generate(&request, &dataset).await.map_err(|err| {
        error!(
            event_name = "estimate.generation_failed",
            correlation_id = %correlation_id,
            project_type = %request.project_type,
            error = %err,
            "estimate generation failed"
        );
        ApiError::from_application(err, &correlation_id)
    })?;

    let estimate = Estimate::new(request, result);
    let repository = SqlEstimateRepository::new(state.db_pool.clone());
    repository
        .save(estimate.clone())
        .await
        .map_err(|err| ApiError::persistence(err, &correlation_id))?;

    info!(
        event_name = "estimate.generated",
        correlation_id = %correlation_id,
        estimate_id = %estimate.id.0,
        total_cost = %estimate.result.total_cost,
        boq_lines = estimate.result.boq_items.len(),
        skipped = estimate.result.skipped_materials.len(),
        "estimate generated"
    );

    Ok(Json(EstimateResponse::from(estimate)))
}

async fn get_estimate(
    Path(id): Path<String>,
    State(state): State<ApiState>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let estimate = load_estimate(&state, &id, &correlation_id).await?;
    Ok(Json(EstimateResponse::from(estimate)))
}

async fn list_catalog_items(
    State(state): State<ApiState>,
) -> Result<Json<Vec<MaterialView>>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let repository = SqlPricingDataset::new(state.db_pool.clone());

    let materials = repository
        .list_materials()
        .await
        .map_err(|err| ApiError::persistence(err, &correlation_id))?;

    Ok(Json(materials.into_iter().map(MaterialView::from).collect()))
}

async fn list_vendors(State(state): State<ApiState>) -> Result<Json<Vec<Vendor>>, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let repository = SqlPricingDataset::new(state.db_pool.clone());

    let vendors = repository
        .list_vendors()
        .await
        .map_err(|err| ApiError::persistence(err, &correlation_id))?;

    Ok(Json(vendors))
}

async fn export_csv(
    Path(id): Path<String>,
    State(state): State<ApiState>,
) -> Result<Response, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let estimate = load_estimate(&state, &id, &correlation_id).await?;

    let bytes = render_boq_csv(&estimate, &state.currency).map_err(|err| {
        ApiError(
            ApplicationError::Configuration(err.to_string())
                .into_interface(correlation_id.as_str()),
        )
    })?;

    attachment_response(bytes, "text/csv", &format!("estimate_{id}.csv"), &correlation_id)
}

async fn export_pdf(
    Path(id): Path<String>,
    State(state): State<ApiState>,
) -> Result<Response, ApiError> {
    let correlation_id = Uuid::new_v4().to_string();
    let estimate = load_estimate(&state, &id, &correlation_id).await?;

    let artifact = state.pdf_generator.generate(&estimate, &state.currency).await.map_err(
        |err| {
            ApiError(
                ApplicationError::Configuration(err.to_string())
                    .into_interface(correlation_id.as_str()),
            )
        },
    )?;

    match artifact {
        ReportArtifact::Pdf(bytes) => attachment_response(
            bytes,
            "application/pdf",
            &format!("estimate_{id}.pdf"),
            &correlation_id,
        ),
        ReportArtifact::Html(html) => {
            let mut response = (StatusCode::OK, html).into_response();
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
            Ok(response)
        }
    }
}

async fn load_estimate(
    state: &ApiState,
    id: &str,
    correlation_id: &str,
) -> Result<Estimate, ApiError> {
    let repository = SqlEstimateRepository::new(state.db_pool.clone());

    repository
        .find_by_id(&EstimateId(id.to_string()))
        .await
        .map_err(|err| ApiError::persistence(err, correlation_id))?
        .ok_or_else(|| {
            ApiError(InterfaceError::not_found(format!("estimate `{id}` not found"), correlation_id))
        })
}

fn attachment_response(
    bytes: Vec<u8>,
    content_type: &'static str,
    filename: &str,
    correlation_id: &str,
) -> Result<Response, ApiError> {
    let disposition =
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")).map_err(|err| {
            ApiError(ApplicationError::Configuration(err.to_string()).into_interface(correlation_id))
        })?;

    let mut response = (StatusCode::OK, bytes).into_response();
    response.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response.headers_mut().insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use metrika_core::engine::EstimationEngine;
    use metrika_db::{connect_with_settings, migrations, DemoCatalog};
    use tower::ServiceExt;

    use super::{router, ApiState};
    use crate::render::pdf::PdfGenerator;

    async fn seeded_router() -> axum::Router {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        DemoCatalog::load(&pool).await.expect("seed");

        router(ApiState {
            db_pool: pool,
            engine: Arc::new(EstimationEngine::with_defaults()),
            pdf_generator: Arc::new(PdfGenerator::new().expect("embedded template")),
            currency: "EUR".to_string(),
        })
    }

    fn estimate_body() -> String {
        serde_json::json!({
            "project_type": "hotel",
            "location": "Athens",
            "size": "100",
            "size_unit": "rooms",
            "start_month": 1,
            "duration_months": 6
        })
        .to_string()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn run_estimate_persists_and_replays_through_the_full_surface() {
        let app = seeded_router().await;

        let response = app
            .clone()
            .oneshot(
                Request::post("/estimate/run")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(estimate_body()))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let id = body["id"].as_str().expect("estimate id").to_string();
        assert_eq!(body["boq_items"].as_array().expect("boq").len(), 7);
        assert_eq!(body["assumptions"].as_array().expect("assumptions").len(), 8);

        // Stored estimate replays byte-identical results.
        let fetched = app
            .clone()
            .oneshot(Request::get(format!("/estimate/{id}")).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(fetched.status(), StatusCode::OK);
        let fetched_body = json_body(fetched).await;
        assert_eq!(fetched_body["boq_items"], body["boq_items"]);
        assert_eq!(fetched_body["total_cost"], body["total_cost"]);

        // CSV export reproduces the BoQ lines.
        let csv = app
            .clone()
            .oneshot(
                Request::get(format!("/export/{id}/csv")).body(Body::empty()).expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(csv.status(), StatusCode::OK);
        assert_eq!(csv.headers()[header::CONTENT_TYPE], "text/csv");
        let csv_text = String::from_utf8(
            to_bytes(csv.into_body(), usize::MAX).await.expect("read body").to_vec(),
        )
        .expect("utf-8");
        assert!(csv_text.contains("Concrete C30/37"));
        assert!(csv_text.starts_with("Material,Quantity,Unit"));

        // PDF export responds with either a PDF or the HTML fallback.
        let pdf = app
            .clone()
            .oneshot(
                Request::get(format!("/export/{id}/pdf")).body(Body::empty()).expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(pdf.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_project_type_is_a_client_error() {
        let app = seeded_router().await;

        let response = app
            .oneshot(
                Request::post("/estimate/run")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({
                            "project_type": "airport",
                            "location": "Athens",
                            "size": "10",
                            "size_unit": "gates",
                            "start_month": 1,
                            "duration_months": 6
                        })
                        .to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().expect("error").contains("airport"));
    }

    #[tokio::test]
    async fn missing_estimate_is_a_not_found_error() {
        let app = seeded_router().await;

        let response = app
            .oneshot(Request::get("/estimate/nope").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn catalog_and_vendor_listings_serve_the_seeded_records() {
        let app = seeded_router().await;

        let materials = app
            .clone()
            .oneshot(Request::get("/catalog/items").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(materials.status(), StatusCode::OK);
        let materials = json_body(materials).await;
        assert_eq!(materials.as_array().expect("materials").len(), 10);

        let vendors = app
            .oneshot(Request::get("/vendors").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(vendors.status(), StatusCode::OK);
        let vendors = json_body(vendors).await;
        assert_eq!(vendors.as_array().expect("vendors").len(), 5);
        assert!(vendors[0]["contacts"]["email"].is_string());
    }
}
