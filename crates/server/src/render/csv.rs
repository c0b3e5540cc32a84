//! CSV export for stored estimates: one row per BoQ line, no
//! recomputation.

use metrika_core::domain::estimate::Estimate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvRenderError {
    #[error("csv write failed: {0}")]
    Write(#[from] csv::Error),
}

pub fn render_boq_csv(estimate: &Estimate, currency: &str) -> Result<Vec<u8>, CsvRenderError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let unit_price_header = format!("Unit Price ({currency})");
    let total_price_header = format!("Total Price ({currency})");
    writer.write_record([
        "Material",
        "Quantity",
        "Unit",
        unit_price_header.as_str(),
        total_price_header.as_str(),
        "Seasonal Factor",
    ])?;

    for line in &estimate.result.boq_items {
        let quantity = line.quantity.to_string();
        let unit_price = line.unit_price.to_string();
        let total_price = line.total_price.to_string();
        let seasonal_factor = line.seasonal_factor.to_string();
        writer.write_record([
            line.material_name.as_str(),
            quantity.as_str(),
            line.unit.as_str(),
            unit_price.as_str(),
            total_price.as_str(),
            seasonal_factor.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|error| CsvRenderError::Write(error.into_error().into()))
}
