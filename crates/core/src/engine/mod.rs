pub mod dataset;
pub mod estimator;
pub mod templates;

pub use dataset::{DatasetError, PricingDataset};
pub use estimator::{EngineOptions, EstimationEngine};
pub use templates::{QuantityRule, TemplateRegistry};
