pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;

pub use domain::estimate::{
    BoqLine, ConfidenceBand, CostDriver, Estimate, EstimateId, EstimateRequest, EstimateResult,
    SeasonalPoint, SkipReason, SkippedLine, StockStatus, VendorRecommendation,
};
pub use domain::material::{Material, MaterialId, PriceObservation, SeasonalityFactor};
pub use domain::vendor::{RankedOffer, Vendor, VendorContacts, VendorId, VendorOffer};
pub use engine::{
    DatasetError, EngineOptions, EstimationEngine, PricingDataset, QuantityRule, TemplateRegistry,
};
pub use errors::{ApplicationError, DomainError, InterfaceError};
