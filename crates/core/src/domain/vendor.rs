use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::material::MaterialId;
use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorId(pub String);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorContacts {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A supplier. `reliability_score` is a 0-5 informational rating; vendor
/// ranking stays price-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    pub region: String,
    pub contacts: VendorContacts,
    pub reliability_score: Decimal,
}

/// A vendor's standing offer for one material. `tier_rules` is a pricing
/// placeholder carried through storage but not consumed yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorOffer {
    pub vendor_id: VendorId,
    pub material_id: MaterialId,
    pub unit_price: Decimal,
    pub stock_qty: Decimal,
    pub lead_time_days: u32,
    pub moq: Decimal,
    #[serde(default)]
    pub tier_rules: serde_json::Value,
}

impl VendorOffer {
    /// Stock quantity must never be negative.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.stock_qty < Decimal::ZERO {
            return Err(DomainError::InvalidRequest(format!(
                "vendor offer stock quantity must be >= 0, got {}",
                self.stock_qty
            )));
        }
        Ok(())
    }
}

/// A vendor offer joined with its vendor, as returned by the dataset's
/// ranked offer query (ascending unit price, ties keep query order).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedOffer {
    pub vendor_name: String,
    pub vendor_region: String,
    pub contact_email: Option<String>,
    pub unit_price: Decimal,
    pub stock_qty: Decimal,
    pub lead_time_days: u32,
    pub moq: Decimal,
}
