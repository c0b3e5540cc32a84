//! PDF export for stored estimates.
//!
//! The estimate is rendered through an HTML template and converted with
//! `wkhtmltopdf` when the binary is on PATH; otherwise the HTML itself is
//! returned for browser rendering.

use std::collections::HashMap;
use std::process::Stdio;

use metrika_core::domain::estimate::Estimate;
use tera::{Context, Tera};
use tokio::process::Command;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("template error: {0}")]
    Template(String),
    #[error("conversion error: {0}")]
    Conversion(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Either real PDF bytes or fallback HTML for browser printing.
pub enum ReportArtifact {
    Pdf(Vec<u8>),
    Html(String),
}

/// Formats a decimal-or-number template value to two decimal places.
/// Decimals serialize as JSON strings, so both shapes are accepted.
fn tera_money_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let amount = match value {
        tera::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        tera::Value::String(s) => s.parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(tera::Value::String(format!("{amount:.2}")))
}

pub struct PdfGenerator {
    tera: Tera,
    wkhtmltopdf_path: Option<String>,
}

impl PdfGenerator {
    pub fn new() -> Result<Self, PdfError> {
        let mut tera = Tera::default();
        tera.register_filter("money", tera_money_filter);
        tera.add_raw_template(
            "estimate.html",
            include_str!("../../../../templates/reports/estimate.html"),
        )
        .map_err(|e| PdfError::Template(e.to_string()))?;

        let wkhtmltopdf_path =
            which::which("wkhtmltopdf").ok().map(|p| p.to_string_lossy().to_string());
        if wkhtmltopdf_path.is_none() {
            warn!("wkhtmltopdf not found in PATH - PDF export will fall back to HTML");
        }

        Ok(Self { tera, wkhtmltopdf_path })
    }

    pub fn render_html(&self, estimate: &Estimate, currency: &str) -> Result<String, PdfError> {
        let mut context = Context::new();
        context.insert("estimate_id", &estimate.id.0);
        context.insert("project", &estimate.request);
        context.insert("result", &estimate.result);
        context.insert("currency", currency);
        context.insert("generated_at", &estimate.created_at.format("%Y-%m-%d %H:%M").to_string());

        self.tera.render("estimate.html", &context).map_err(|e| PdfError::Template(e.to_string()))
    }

    pub async fn generate(
        &self,
        estimate: &Estimate,
        currency: &str,
    ) -> Result<ReportArtifact, PdfError> {
        let html = self.render_html(estimate, currency)?;

        let Some(ref wkhtmltopdf) = self.wkhtmltopdf_path else {
            return Ok(ReportArtifact::Html(html));
        };

        match self.convert_html_to_pdf(&html, wkhtmltopdf).await {
            Ok(pdf_bytes) => Ok(ReportArtifact::Pdf(pdf_bytes)),
            Err(e) => {
                warn!(error = %e, "PDF conversion failed, falling back to HTML");
                Ok(ReportArtifact::Html(html))
            }
        }
    }

    async fn convert_html_to_pdf(
        &self,
        html: &str,
        wkhtmltopdf_path: &str,
    ) -> Result<Vec<u8>, PdfError> {
        let temp_dir = std::env::temp_dir();
        let stem = uuid::Uuid::new_v4();
        let html_path = temp_dir.join(format!("estimate_{stem}.html"));
        let pdf_path = temp_dir.join(format!("estimate_{stem}.pdf"));

        tokio::fs::write(&html_path, html).await?;

        let output = Command::new(wkhtmltopdf_path)
            .arg("--page-size")
            .arg("A4")
            .arg("--margin-top")
            .arg("10mm")
            .arg("--margin-bottom")
            .arg("10mm")
            .arg("--margin-left")
            .arg("10mm")
            .arg("--margin-right")
            .arg("10mm")
            .arg("--encoding")
            .arg("utf-8")
            .arg(&html_path)
            .arg(&pdf_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(stderr = %stderr, "wkhtmltopdf failed");
            return Err(PdfError::Conversion(stderr.to_string()));
        }

        let pdf_bytes = tokio::fs::read(&pdf_path).await?;

        let _ = tokio::fs::remove_file(&html_path).await;
        let _ = tokio::fs::remove_file(&pdf_path).await;

        Ok(pdf_bytes)
    }
}
