use rust_decimal::Decimal;

use crate::errors::DomainError;

/// Linear quantity takeoff for one material: `quantity = size * per_unit`.
/// Coefficients are domain constants per project type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuantityRule {
    pub mapping_key: String,
    pub per_unit: Decimal,
}

impl QuantityRule {
    fn new(mapping_key: &str, per_unit: Decimal) -> Self {
        Self { mapping_key: mapping_key.to_string(), per_unit }
    }

    pub fn quantity_for(&self, size: Decimal) -> Decimal {
        size * self.per_unit
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ProjectTemplate {
    tag: String,
    rules: Vec<QuantityRule>,
}

/// Immutable registry of parametric project templates, constructed once at
/// startup and shared by reference. Rule order within a template is the
/// BoQ output order and the cost-driver tie-break order.
#[derive(Clone, Debug)]
pub struct TemplateRegistry {
    templates: Vec<ProjectTemplate>,
}

impl TemplateRegistry {
    /// The three built-in parametric models: bridge quantities per
    /// lane-km, hotel per room, business park per m².
    pub fn builtin() -> Self {
        let bridge = ProjectTemplate {
            tag: "bridge".to_string(),
            rules: vec![
                QuantityRule::new("concrete_c30", Decimal::new(8, 1)),
                QuantityRule::new("rebar_b500c", Decimal::new(120, 0)),
                QuantityRule::new("steel_s355", Decimal::new(80, 0)),
                QuantityRule::new("formwork_plywood", Decimal::new(15, 0)),
                QuantityRule::new("labor_skilled", Decimal::new(200, 0)),
                QuantityRule::new("labor_general", Decimal::new(300, 0)),
                QuantityRule::new("excavator_20t", Decimal::new(10, 0)),
            ],
        };
        let hotel = ProjectTemplate {
            tag: "hotel".to_string(),
            rules: vec![
                QuantityRule::new("concrete_c30", Decimal::new(3, 1)),
                QuantityRule::new("rebar_b500c", Decimal::new(45, 0)),
                QuantityRule::new("steel_s355", Decimal::new(25, 0)),
                QuantityRule::new("formwork_plywood", Decimal::new(8, 0)),
                QuantityRule::new("labor_skilled", Decimal::new(80, 0)),
                QuantityRule::new("labor_general", Decimal::new(120, 0)),
                QuantityRule::new("cement_42_5", Decimal::new(15, 2)),
            ],
        };
        let business_park = ProjectTemplate {
            tag: "business_park".to_string(),
            rules: vec![
                QuantityRule::new("concrete_c30", Decimal::new(15, 2)),
                QuantityRule::new("rebar_b500c", Decimal::new(20, 0)),
                QuantityRule::new("steel_s355", Decimal::new(35, 0)),
                QuantityRule::new("formwork_plywood", Decimal::new(8, 1)),
                QuantityRule::new("labor_skilled", Decimal::new(3, 0)),
                QuantityRule::new("labor_general", Decimal::new(5, 0)),
                QuantityRule::new("aggregate_mixed", Decimal::new(1, 1)),
            ],
        };

        Self { templates: vec![bridge, hotel, business_park] }
    }

    pub fn resolve(&self, project_type: &str) -> Result<&[QuantityRule], DomainError> {
        self.templates
            .iter()
            .find(|template| template.tag == project_type)
            .map(|template| template.rules.as_slice())
            .ok_or_else(|| DomainError::UnknownProjectType { tag: project_type.to_string() })
    }

    pub fn registered_tags(&self) -> Vec<&str> {
        self.templates.iter().map(|template| template.tag.as_str()).collect()
    }
}
